use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use rkyv::{Archive, Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::board::Node;
use crate::game::{
    create_pieces, GameState, GameStatus, Piece, DEFAULT_PIECE_COUNT, PIECE_COUNT_MAX,
    PIECE_COUNT_MIN,
};
use crate::room_id::{short_token, RoomId};

pub type ConnectionId = u64;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS_MIN: u8 = 2;
pub const MAX_PLAYERS_CAP: u8 = 4;
pub const CHAT_LOG_CAP: usize = 100;
pub const CHAT_VIEW_LIMIT: usize = 50;
pub const CHAT_TEXT_LIMIT: usize = 500;
pub const DEFAULT_ROOM_NAME: &str = "New yut room";

pub const PLAYER_COLORS: [&str; 4] = ["#3b82f6", "#f59e0b", "#10b981", "#ec4899"];

pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

pub fn hash_password(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

pub fn assign_color(index: usize) -> &'static str {
    PLAYER_COLORS[index % PLAYER_COLORS.len()]
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub conn: Option<ConnectionId>,
    pub is_host: bool,
    pub is_ready: bool,
    pub is_bot: bool,
    pub connected: bool,
    pub color: &'static str,
    pub pieces: Vec<Piece>,
    pub finished_count: u32,
    pub joined_at: i64,
}

#[derive(Debug, Clone)]
pub struct Spectator {
    pub id: String,
    pub name: String,
    pub conn: Option<ConnectionId>,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct ChatEntry {
    pub id: String,
    pub sender: String,
    pub text: String,
    pub at: i64,
}

#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub max_players: u8,
    pub created_at: i64,
    pub allow_back_step: bool,
    pub piece_count: u8,
    pub password_hash: Option<String>,
    pub players: Vec<Player>,
    pub spectators: Vec<Spectator>,
    pub chat: VecDeque<ChatEntry>,
    pub game: GameState,
}

impl Room {
    pub fn new(
        name: &str,
        max_players: u8,
        password: Option<&str>,
        allow_back_step: bool,
        piece_count: u8,
    ) -> Self {
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            DEFAULT_ROOM_NAME.to_string()
        } else {
            trimmed.to_string()
        };
        let piece_count = if piece_count == 0 {
            DEFAULT_PIECE_COUNT
        } else {
            piece_count.clamp(PIECE_COUNT_MIN, PIECE_COUNT_MAX)
        };
        Self {
            id: RoomId::generate(),
            name,
            max_players: if max_players == 0 {
                MAX_PLAYERS_CAP
            } else {
                max_players.clamp(MAX_PLAYERS_MIN, MAX_PLAYERS_CAP)
            },
            created_at: now_ms(),
            allow_back_step,
            piece_count,
            password_hash: password
                .filter(|raw| !raw.is_empty())
                .map(hash_password),
            players: Vec::new(),
            spectators: Vec::new(),
            chat: VecDeque::new(),
            game: GameState::new(),
        }
    }

    pub fn add_player(
        &mut self,
        name: &str,
        conn: Option<ConnectionId>,
        is_host: bool,
        is_bot: bool,
    ) -> String {
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            format!("Player {}", self.players.len() + 1)
        } else {
            trimmed.to_string()
        };
        let player = Player {
            id: short_token(),
            name,
            conn,
            is_host,
            is_ready: is_host || is_bot,
            is_bot,
            connected: true,
            color: assign_color(self.players.len()),
            pieces: create_pieces(self.piece_count),
            finished_count: 0,
            joined_at: now_ms(),
        };
        let id = player.id.clone();
        self.players.push(player);
        id
    }

    pub fn add_spectator(&mut self, name: &str, conn: Option<ConnectionId>) -> String {
        let trimmed = name.trim();
        let spectator = Spectator {
            id: short_token(),
            name: if trimmed.is_empty() {
                "Spectator".to_string()
            } else {
                trimmed.to_string()
            },
            conn,
            connected: true,
        };
        let id = spectator.id.clone();
        self.spectators.push(spectator);
        id
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.id == player_id)
    }

    pub fn push_chat(&mut self, sender: &str, text: &str) {
        let sender = sender.trim();
        let entry = ChatEntry {
            id: short_token(),
            sender: if sender.is_empty() {
                "system".to_string()
            } else {
                sender.to_string()
            },
            text: text.chars().take(CHAT_TEXT_LIMIT).collect(),
            at: now_ms(),
        };
        self.chat.push_back(entry);
        while self.chat.len() > CHAT_LOG_CAP {
            self.chat.pop_front();
        }
    }

    pub fn log_activity(&mut self, message: String) {
        let at = now_ms();
        self.game.log(message, at);
    }

    /// The player whose turn it is, skipping disconnected entries. The
    /// search self-heals `current_turn_index` so the invariant "the
    /// current player is connected" holds after any disconnect.
    pub fn current_player_id(&mut self) -> Option<String> {
        if self.game.status != GameStatus::Playing {
            return None;
        }
        let order_len = self.game.turn_order.len();
        if order_len == 0 {
            return None;
        }
        for offset in 0..order_len {
            let index = (self.game.current_turn_index + offset) % order_len;
            let player_id = &self.game.turn_order[index];
            let connected = self
                .players
                .iter()
                .any(|player| &player.id == player_id && player.connected);
            if connected {
                let player_id = player_id.clone();
                self.game.current_turn_index = index;
                return Some(player_id);
            }
        }
        None
    }

    /// Hands the turn to the next connected player in round-robin order,
    /// resetting the per-turn throw state. Returns the new current
    /// player's id, or `None` when nobody is connected.
    pub fn advance_turn(&mut self) -> Option<String> {
        if self.game.status != GameStatus::Playing {
            return None;
        }
        let order_len = self.game.turn_order.len();
        let starting = self.game.current_turn_index;
        for offset in 1..=order_len {
            let index = (starting + offset) % order_len;
            let player_id = self.game.turn_order[index].clone();
            let name = self
                .players
                .iter()
                .find(|player| player.id == player_id && player.connected)
                .map(|player| player.name.clone());
            if let Some(name) = name {
                self.game.current_turn_index = index;
                self.game.throw_quota = 1;
                self.game.pending_results.clear();
                self.game.last_roll = None;
                self.log_activity(format!("It is {name}'s turn."));
                return Some(player_id);
            }
        }
        self.game.throw_quota = 0;
        self.game.pending_results.clear();
        None
    }

    /// Re-elects a host when none is present: the earliest-joined
    /// connected player gains the flag and is auto-readied.
    pub fn ensure_host(&mut self) {
        if self.players.iter().any(|player| player.is_host) {
            return;
        }
        let candidate = self
            .players
            .iter_mut()
            .filter(|player| player.connected)
            .min_by_key(|player| player.joined_at);
        if let Some(player) = candidate {
            player.is_host = true;
            player.is_ready = true;
        }
    }

    pub fn reset_game(&mut self) {
        self.game = GameState::new();
        let piece_count = self.piece_count;
        for player in &mut self.players {
            player.pieces = create_pieces(piece_count);
            player.finished_count = 0;
            player.is_ready = player.is_bot;
        }
    }

    /// Sends every opposing piece on `destination` back to the start post.
    /// Returns how many pieces were captured; the bonus throw is granted
    /// once per capture event, not per piece.
    pub fn capture_pieces(&mut self, destination: Node, owner_id: &str) -> usize {
        if destination == Node::Start || destination == Node::End {
            return 0;
        }
        let mut captured = 0;
        for player in &mut self.players {
            if player.id == owner_id {
                continue;
            }
            for piece in &mut player.pieces {
                if piece.position == destination {
                    piece.position = Node::Start;
                    piece.last_entry = Node::Start;
                    captured += 1;
                }
            }
        }
        captured
    }

    /// Marks the game finished with `player_id` as sole winner once all of
    /// that player's pieces rest on the end post.
    pub fn check_winner(&mut self, player_id: &str) -> bool {
        let winner = self.players.iter().find(|player| player.id == player_id);
        let Some(player) = winner else {
            return false;
        };
        if !player.pieces.iter().all(|piece| piece.position == Node::End) {
            return false;
        }
        let name = player.name.clone();
        self.game.status = GameStatus::Finished;
        self.game.winner_ids = vec![player_id.to_string()];
        self.log_activity(format!("{name} brought every piece home!"));
        true
    }
}
