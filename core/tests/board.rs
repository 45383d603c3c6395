use yutnori_core::board::{advance_position, all_nodes, forward_distance, Node};

#[test]
fn zero_steps_is_identity_everywhere() {
    for node in all_nodes() {
        let traversal = advance_position(node, 0, false, Node::Start).expect("zero steps");
        assert_eq!(traversal.position, node);
        assert_eq!(traversal.last_entry, Node::Start);
        assert!(traversal.path.is_empty());
    }
}

#[test]
fn forward_walks_never_pass_the_end_post() {
    for node in all_nodes() {
        for steps in 1..=5i8 {
            for use_diagonal in [false, true] {
                if let Some(traversal) = advance_position(node, steps, use_diagonal, Node::Start) {
                    let through = &traversal.path[..traversal.path.len() - 1];
                    assert!(
                        !through.contains(&Node::End),
                        "walk from {node:?} by {steps} passed the end post"
                    );
                }
            }
        }
    }
}

#[test]
fn overshooting_the_end_post_is_rejected() {
    assert!(advance_position(Node::Loop(18), 2, false, Node::Start).is_some());
    assert!(advance_position(Node::Loop(18), 3, false, Node::Start).is_none());
    assert!(advance_position(Node::Loop(19), 1, false, Node::Start).is_some());
    assert!(advance_position(Node::Loop(19), 2, false, Node::Start).is_none());
}

#[test]
fn backing_past_the_start_post_is_rejected() {
    let back = advance_position(Node::Loop(2), -2, false, Node::Loop(1)).expect("two back");
    assert_eq!(back.position, Node::Start);
    assert!(advance_position(Node::Loop(2), -3, false, Node::Loop(1)).is_none());
    assert!(advance_position(Node::Loop(1), -2, false, Node::Start).is_none());
}

#[test]
fn forks_route_by_the_diagonal_flag() {
    let diagonal = advance_position(Node::Loop(5), 1, true, Node::Loop(4)).unwrap();
    assert_eq!(diagonal.position, Node::Diag(1));
    let straight = advance_position(Node::Loop(5), 1, false, Node::Loop(4)).unwrap();
    assert_eq!(straight.position, Node::Loop(6));

    let diagonal = advance_position(Node::Loop(10), 1, true, Node::Loop(9)).unwrap();
    assert_eq!(diagonal.position, Node::Diag(3));
    let straight = advance_position(Node::Loop(10), 1, false, Node::Loop(9)).unwrap();
    assert_eq!(straight.position, Node::Loop(11));
}

#[test]
fn diagonal_path_runs_through_the_center() {
    let traversal = advance_position(Node::Loop(5), 3, true, Node::Loop(4)).unwrap();
    assert_eq!(
        traversal.path,
        vec![Node::Diag(1), Node::Diag(2), Node::Center]
    );
    assert_eq!(traversal.position, Node::Center);
    assert_eq!(traversal.last_entry, Node::Diag(2));
}

#[test]
fn center_steps_back_toward_its_remembered_branch() {
    let via_second = advance_position(Node::Center, -1, false, Node::Diag(4)).unwrap();
    assert_eq!(via_second.position, Node::Diag(4));
    let via_first = advance_position(Node::Center, -1, false, Node::Diag(2)).unwrap();
    assert_eq!(via_first.position, Node::Diag(2));
    // unknown entry falls back to the first shortcut
    let fallback = advance_position(Node::Center, -1, false, Node::Loop(3)).unwrap();
    assert_eq!(fallback.position, Node::Diag(2));
}

#[test]
fn loop_reentry_steps_back_toward_its_remembered_branch() {
    let via_center = advance_position(Node::Loop(15), -1, false, Node::Center).unwrap();
    assert_eq!(via_center.position, Node::Center);
    let via_loop = advance_position(Node::Loop(15), -1, false, Node::Loop(14)).unwrap();
    assert_eq!(via_loop.position, Node::Loop(14));
}

#[test]
fn path_is_ordered_and_tracks_last_entry() {
    let traversal = advance_position(Node::Start, 5, false, Node::Start).unwrap();
    assert_eq!(
        traversal.path,
        vec![
            Node::Loop(1),
            Node::Loop(2),
            Node::Loop(3),
            Node::Loop(4),
            Node::Loop(5)
        ]
    );
    assert_eq!(traversal.last_entry, Node::Loop(4));
}

#[test]
fn forward_distance_ranks_the_shortcuts() {
    assert_eq!(forward_distance(Node::End), 0);
    assert_eq!(forward_distance(Node::Loop(19)), 1);
    assert_eq!(forward_distance(Node::Center), 6);
    assert_eq!(forward_distance(Node::Loop(5)), 9);
    assert_eq!(forward_distance(Node::Loop(10)), 9);
    assert_eq!(forward_distance(Node::Start), 14);
    // entering a shortcut beats staying on the loop
    assert!(forward_distance(Node::Diag(1)) < forward_distance(Node::Loop(6)));
}
