pub mod board;
pub mod bot;
pub mod codec;
pub mod dice;
pub mod error;
pub mod game;
pub mod protocol;
pub mod registry;
pub mod room;
pub mod room_id;
pub mod snapshot;

pub use codec::{decode, encode};
pub use error::GameError;
pub use protocol::{ClientMsg, ServerMsg};
pub use registry::{BotScheduler, Broadcaster, RoomRegistry, BOT_DELAY_MS};
pub use room::{ConnectionId, Room};
pub use room_id::{is_valid_room_id, RoomId, RoomIdError, TOKEN_ALPHABET, TOKEN_LEN};
pub use snapshot::{RoomSnapshot, RoomSummary, ROOM_SNAPSHOT_VERSION};
