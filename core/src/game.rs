use std::collections::VecDeque;

use rkyv::{Archive, Deserialize, Serialize};

use crate::board::{advance_position, Node, Traversal};
use crate::dice::ThrowResult;
use crate::error::GameError;
use crate::room_id::short_token;

pub const DEFAULT_PIECE_COUNT: u8 = 4;
pub const PIECE_COUNT_MIN: u8 = 3;
pub const PIECE_COUNT_MAX: u8 = 6;
pub const ACTIVITY_LOG_CAP: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct Piece {
    pub id: String,
    pub position: Node,
    pub last_entry: Node,
}

pub fn create_pieces(count: u8) -> Vec<Piece> {
    (1..=count)
        .map(|index| Piece {
            id: format!("p{index}"),
            position: Node::Start,
            last_entry: Node::Start,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    pub message: String,
    pub at: i64,
}

/// Per-room turn machine. `pending_results` holds rolled-but-unconsumed
/// throws; the turn may only advance once it is empty and `throw_quota`
/// has reached zero.
#[derive(Debug, Clone)]
pub struct GameState {
    pub status: GameStatus,
    pub turn_order: Vec<String>,
    pub current_turn_index: usize,
    pub pending_results: Vec<ThrowResult>,
    pub throw_quota: u32,
    pub last_roll: Option<ThrowResult>,
    pub winner_ids: Vec<String>,
    pub activity_log: VecDeque<ActivityEntry>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            status: GameStatus::Waiting,
            turn_order: Vec::new(),
            current_turn_index: 0,
            pending_results: Vec::new(),
            throw_quota: 0,
            last_roll: None,
            winner_ids: Vec::new(),
            activity_log: VecDeque::new(),
        }
    }

    pub fn begin(turn_order: Vec<String>) -> Self {
        Self {
            status: GameStatus::Playing,
            turn_order,
            current_turn_index: 0,
            pending_results: Vec::new(),
            throw_quota: 1,
            last_roll: None,
            winner_ids: Vec::new(),
            activity_log: VecDeque::new(),
        }
    }

    pub fn log(&mut self, message: String, at: i64) {
        self.activity_log.push_back(ActivityEntry {
            id: short_token(),
            message,
            at,
        });
        while self.activity_log.len() > ACTIVITY_LOG_CAP {
            self.activity_log.pop_front();
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovePlan {
    pub moving: Vec<usize>,
    pub destination: Node,
    pub last_entry: Node,
    pub path: Vec<Node>,
}

/// Resolves a move for the named piece and the stack sharing its position.
/// Pieces resting on the end post never join a stack and may not move
/// forward again.
pub fn validate_move(
    pieces: &[Piece],
    piece_id: &str,
    steps: i8,
    use_diagonal: bool,
) -> Result<MovePlan, GameError> {
    let anchor = pieces
        .iter()
        .find(|piece| piece.id == piece_id)
        .ok_or(GameError::PieceNotFound)?;
    if anchor.position == Node::End && steps > 0 {
        return Err(GameError::PieceFinished);
    }

    let moving: Vec<usize> = pieces
        .iter()
        .enumerate()
        .filter(|(_, piece)| piece.position == anchor.position && piece.position != Node::End)
        .map(|(index, _)| index)
        .collect();

    let traversal = advance_position(anchor.position, steps, use_diagonal, anchor.last_entry)
        .ok_or(GameError::InvalidDestination)?;

    Ok(MovePlan {
        moving,
        destination: traversal.position,
        last_entry: traversal.last_entry,
        path: traversal.path,
    })
}

/// Every piece with a valid destination for `steps` under the given
/// routing. Finished pieces are only eligible for backward steps.
pub fn find_movable_pieces(
    pieces: &[Piece],
    steps: i8,
    use_diagonal: bool,
) -> Vec<(usize, Traversal)> {
    pieces
        .iter()
        .enumerate()
        .filter(|(_, piece)| piece.position != Node::End || steps < 0)
        .filter_map(|(index, piece)| {
            advance_position(piece.position, steps, use_diagonal, piece.last_entry)
                .map(|traversal| (index, traversal))
        })
        .collect()
}

pub fn movable_exists(pieces: &[Piece], steps: i8) -> bool {
    !find_movable_pieces(pieces, steps, false).is_empty()
        || !find_movable_pieces(pieces, steps, true).is_empty()
}
