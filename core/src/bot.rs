use crate::board::forward_distance;
use crate::game::find_movable_pieces;
use crate::room::Room;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotAction {
    Roll,
    Move {
        piece_id: String,
        result_index: u32,
        use_diagonal: bool,
    },
    Skip {
        result_index: u32,
    },
}

/// Decides the bot's next command, mirroring what a human client would
/// send: roll while throws remain, otherwise consume the oldest pending
/// result — by moving the candidate whose destination sits closest to the
/// end post (diagonal routing always requested; ties fall to piece
/// order), or by skipping when nothing can move. Returns `None` when the
/// turn holds nothing to do.
pub fn choose_action(room: &Room, bot_id: &str) -> Option<BotAction> {
    let player = room.player(bot_id)?;

    if room.game.throw_quota > 0 {
        return Some(BotAction::Roll);
    }

    let result = room.game.pending_results.first()?;
    let movable = find_movable_pieces(&player.pieces, result.value, true);
    if movable.is_empty() {
        return Some(BotAction::Skip { result_index: 0 });
    }

    let (index, _) = movable
        .iter()
        .min_by_key(|(_, traversal)| forward_distance(traversal.position))?;
    Some(BotAction::Move {
        piece_id: player.pieces[*index].id.clone(),
        result_index: 0,
        use_diagonal: true,
    })
}
