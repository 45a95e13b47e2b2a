use thiserror::Error;

use crate::Action;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Invalid action: {0}")]
    InvalidAction(Action),

    #[error("Game is already over")]
    GameOver,

    #[error("Invalid board config: {0}")]
    InvalidConfig(String),

    #[error("Invalid board string at cell {index}: {reason}")]
    InvalidBoardString { index: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, BoardError>;
