use rkyv::{Archive, Deserialize, Serialize};

use crate::board::Node;
use crate::dice::ThrowResult;
use crate::game::{ActivityEntry, GameStatus, Piece};
use crate::room::{ChatEntry, Player, Room, CHAT_VIEW_LIMIT};

pub const ROOM_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct Occupant {
    pub player_id: String,
    pub piece_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct BoardCell {
    pub position: Node,
    pub occupants: Vec<Occupant>,
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub is_host: bool,
    pub is_ready: bool,
    pub is_bot: bool,
    pub connected: bool,
    pub color: String,
    pub pieces: Vec<Piece>,
    pub finished_count: u32,
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub struct SpectatorView {
    pub id: String,
    pub name: String,
    pub connected: bool,
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub struct GameView {
    pub status: GameStatus,
    pub turn_order: Vec<String>,
    pub current_turn_index: u32,
    pub pending_results: Vec<ThrowResult>,
    pub throw_quota: u32,
    pub last_roll: Option<ThrowResult>,
    pub winner_ids: Vec<String>,
    pub activity_log: Vec<ActivityEntry>,
    pub board: Vec<BoardCell>,
}

/// Full room state pushed to every member after a mutation. Exposes only
/// whether a password exists, never the hash.
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub version: u32,
    pub id: String,
    pub name: String,
    pub allow_back_step: bool,
    pub piece_count: u8,
    pub max_players: u8,
    pub created_at: i64,
    pub has_password: bool,
    pub players: Vec<PlayerView>,
    pub spectators: Vec<SpectatorView>,
    pub chat: Vec<ChatEntry>,
    pub game: GameView,
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    pub player_count: u32,
    pub spectator_count: u32,
    pub max_players: u8,
    pub status: GameStatus,
    pub allow_back_step: bool,
    pub has_password: bool,
    pub created_at: i64,
}

pub fn board_occupancy(players: &[Player]) -> Vec<BoardCell> {
    let mut cells: Vec<BoardCell> = Vec::new();
    for player in players {
        for piece in &player.pieces {
            let occupant = Occupant {
                player_id: player.id.clone(),
                piece_id: piece.id.clone(),
            };
            match cells.iter_mut().find(|cell| cell.position == piece.position) {
                Some(cell) => cell.occupants.push(occupant),
                None => cells.push(BoardCell {
                    position: piece.position,
                    occupants: vec![occupant],
                }),
            }
        }
    }
    cells
}

fn player_view(player: &Player) -> PlayerView {
    PlayerView {
        id: player.id.clone(),
        name: player.name.clone(),
        is_host: player.is_host,
        is_ready: player.is_ready,
        is_bot: player.is_bot,
        connected: player.connected,
        color: player.color.to_string(),
        pieces: player.pieces.clone(),
        finished_count: player.finished_count,
    }
}

impl Room {
    pub fn snapshot(&self) -> RoomSnapshot {
        let chat_skip = self.chat.len().saturating_sub(CHAT_VIEW_LIMIT);
        RoomSnapshot {
            version: ROOM_SNAPSHOT_VERSION,
            id: self.id.to_string(),
            name: self.name.clone(),
            allow_back_step: self.allow_back_step,
            piece_count: self.piece_count,
            max_players: self.max_players,
            created_at: self.created_at,
            has_password: self.password_hash.is_some(),
            players: self.players.iter().map(player_view).collect(),
            spectators: self
                .spectators
                .iter()
                .map(|spectator| SpectatorView {
                    id: spectator.id.clone(),
                    name: spectator.name.clone(),
                    connected: spectator.connected,
                })
                .collect(),
            chat: self.chat.iter().skip(chat_skip).cloned().collect(),
            game: GameView {
                status: self.game.status,
                turn_order: self.game.turn_order.clone(),
                current_turn_index: self.game.current_turn_index as u32,
                pending_results: self.game.pending_results.clone(),
                throw_quota: self.game.throw_quota,
                last_roll: self.game.last_roll.clone(),
                winner_ids: self.game.winner_ids.clone(),
                activity_log: self.game.activity_log.iter().cloned().collect(),
                board: board_occupancy(&self.players),
            },
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.to_string(),
            name: self.name.clone(),
            player_count: self.players.len() as u32,
            spectator_count: self.spectators.len() as u32,
            max_players: self.max_players,
            status: self.game.status,
            allow_back_step: self.allow_back_step,
            has_password: self.password_hash.is_some(),
            created_at: self.created_at,
        }
    }
}
