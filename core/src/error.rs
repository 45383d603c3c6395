use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("room not found")]
    RoomNotFound,
    #[error("player not found")]
    PlayerNotFound,
    #[error("no such piece")]
    PieceNotFound,
    #[error("no pending result at that index")]
    NoSuchResult,
    #[error("incorrect password")]
    WrongPassword,
    #[error("only the host can do that")]
    HostOnly,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("room is full")]
    RoomFull,
    #[error("at least two players are required")]
    NotEnoughPlayers,
    #[error("every player must be ready")]
    NotAllReady,
    #[error("no throws left")]
    NoThrowsLeft,
    #[error("that piece cannot reach the requested position")]
    InvalidDestination,
    #[error("a finished piece cannot move")]
    PieceFinished,
    #[error("a legal move exists for that result")]
    MoveAvailable,
    #[error("the game has not started")]
    NotPlaying,
    #[error("the game has already started")]
    GameInProgress,
}

impl GameError {
    pub fn code(&self) -> &'static str {
        match self {
            GameError::RoomNotFound
            | GameError::PlayerNotFound
            | GameError::PieceNotFound
            | GameError::NoSuchResult => "not_found",
            GameError::WrongPassword | GameError::HostOnly | GameError::NotYourTurn => {
                "unauthorized"
            }
            GameError::RoomFull | GameError::NotEnoughPlayers | GameError::NotAllReady => {
                "capacity"
            }
            GameError::NoThrowsLeft
            | GameError::InvalidDestination
            | GameError::PieceFinished
            | GameError::MoveAvailable => "illegal_move",
            GameError::NotPlaying | GameError::GameInProgress => "state_conflict",
        }
    }
}
