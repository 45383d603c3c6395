use std::collections::VecDeque;

use rkyv::{Archive, Deserialize, Serialize};

pub const LOOP_LEN: u8 = 19;
pub const DIAG_LEN: u8 = 4;

/// One position on the board: the start/end posts, the 19 main-loop
/// stations, the four shortcut stations (1-2 branch off `Loop(5)`,
/// 3-4 branch off `Loop(10)`) and the center where both shortcuts meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
pub enum Node {
    Start,
    Loop(u8),
    Diag(u8),
    Center,
    End,
}

pub fn all_nodes() -> Vec<Node> {
    let mut nodes = vec![Node::Start, Node::Center, Node::End];
    nodes.extend((1..=LOOP_LEN).map(Node::Loop));
    nodes.extend((1..=DIAG_LEN).map(Node::Diag));
    nodes
}

pub fn next_node(node: Node, use_diagonal: bool) -> Option<Node> {
    match node {
        Node::Start => Some(Node::Loop(1)),
        Node::Loop(5) if use_diagonal => Some(Node::Diag(1)),
        Node::Loop(10) if use_diagonal => Some(Node::Diag(3)),
        Node::Loop(LOOP_LEN) => Some(Node::End),
        Node::Loop(n) if (1..LOOP_LEN).contains(&n) => Some(Node::Loop(n + 1)),
        Node::Diag(1) => Some(Node::Diag(2)),
        Node::Diag(3) => Some(Node::Diag(4)),
        Node::Diag(2) | Node::Diag(4) => Some(Node::Center),
        Node::Center => Some(Node::Loop(15)),
        Node::End => Some(Node::End),
        _ => None,
    }
}

pub fn prev_node(node: Node, last_entry: Node) -> Option<Node> {
    match node {
        Node::Start => Some(Node::Loop(LOOP_LEN)),
        Node::Loop(1) => Some(Node::Start),
        // ambiguous: entered either from the loop or out of the center
        Node::Loop(15) if last_entry == Node::Center => Some(Node::Center),
        Node::Loop(n) if (2..=LOOP_LEN).contains(&n) => Some(Node::Loop(n - 1)),
        Node::Diag(1) => Some(Node::Loop(5)),
        Node::Diag(3) => Some(Node::Loop(10)),
        Node::Diag(2) => Some(Node::Diag(1)),
        Node::Diag(4) => Some(Node::Diag(3)),
        // ambiguous: both shortcuts converge here
        Node::Center if last_entry == Node::Diag(4) => Some(Node::Diag(4)),
        Node::Center => Some(Node::Diag(2)),
        Node::End => Some(Node::Loop(LOOP_LEN)),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    pub position: Node,
    pub last_entry: Node,
    pub path: Vec<Node>,
}

/// Walks `steps` board positions from `start`. Forward traversal takes a
/// shortcut at a fork only when `use_diagonal` is set; backward traversal
/// resolves ambiguous predecessors through `last_entry`. Returns `None`
/// when the walk would pass beyond the end post (forward) or the start
/// post (backward) with steps still remaining.
pub fn advance_position(
    start: Node,
    steps: i8,
    use_diagonal: bool,
    last_entry: Node,
) -> Option<Traversal> {
    if steps == 0 {
        return Some(Traversal {
            position: start,
            last_entry,
            path: Vec::new(),
        });
    }

    let forward = steps > 0;
    let mut current = start;
    let mut previous = last_entry;
    let mut remaining = steps.unsigned_abs();
    let mut path = Vec::with_capacity(remaining as usize);

    while remaining > 0 {
        let next = if forward {
            next_node(current, use_diagonal)?
        } else {
            prev_node(current, previous)?
        };
        path.push(next);
        previous = current;
        current = next;
        if forward && current == Node::End && remaining > 1 {
            return None;
        }
        if !forward && current == Node::Start && remaining > 1 {
            return None;
        }
        remaining -= 1;
    }

    Some(Traversal {
        position: current,
        last_entry: previous,
        path,
    })
}

/// Minimal number of forward steps from `node` to the end post, shortcuts
/// included. Used to rank candidate destinations.
pub fn forward_distance(node: Node) -> u8 {
    let mut queue = VecDeque::new();
    let mut seen: Vec<Node> = Vec::new();
    queue.push_back((node, 0u8));
    while let Some((at, dist)) = queue.pop_front() {
        if at == Node::End {
            return dist;
        }
        if seen.contains(&at) {
            continue;
        }
        seen.push(at);
        for next in [next_node(at, false), next_node(at, true)].into_iter().flatten() {
            if !seen.contains(&next) {
                queue.push_back((next, dist + 1));
            }
        }
    }
    u8::MAX
}
