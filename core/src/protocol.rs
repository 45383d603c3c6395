use rkyv::{Archive, Deserialize, Serialize};

use crate::snapshot::{RoomSnapshot, RoomSummary};

/// The closed set of inbound commands. Payloads are validated here at the
/// wire boundary; anything that does not decode into one of these variants
/// never reaches the engine.
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub enum ClientMsg {
    Create {
        name: String,
        nickname: String,
        max_players: u8,
        password: Option<String>,
        allow_back_step: bool,
        piece_count: u8,
    },
    Join {
        room_id: String,
        nickname: String,
        password: Option<String>,
        player_id: Option<String>,
        as_spectator: bool,
    },
    Ready {
        room_id: String,
        player_id: String,
        ready: bool,
    },
    Start {
        room_id: String,
        player_id: String,
    },
    Roll {
        room_id: String,
        player_id: String,
    },
    Move {
        room_id: String,
        player_id: String,
        piece_id: String,
        result_index: u32,
        use_diagonal: bool,
    },
    Skip {
        room_id: String,
        player_id: String,
        result_index: u32,
    },
    Restart {
        room_id: String,
        player_id: String,
    },
    Chat {
        room_id: String,
        sender: Option<String>,
        text: String,
    },
    AddDummies {
        room_id: String,
        player_id: String,
        count: u8,
    },
    ListRooms,
    Ping {
        nonce: Option<u64>,
    },
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub enum ServerMsg {
    Joined {
        room: RoomSnapshot,
        player_id: Option<String>,
    },
    State {
        room: RoomSnapshot,
    },
    Rooms {
        rooms: Vec<RoomSummary>,
    },
    Error {
        code: String,
        message: String,
    },
    Pong {
        nonce: Option<u64>,
    },
}
