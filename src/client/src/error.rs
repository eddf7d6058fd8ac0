//! Error types for the game session.

use thiserror::Error;

use crate::game::Rejection;

#[derive(Debug, Error)]
pub enum GameError {
    /// A drop or move refused by local rules.
    #[error("move rejected: {0}")]
    Rejected(#[from] Rejection),

    /// The scoring or turn endpoint answered with a non-2xx status.
    #[error("server rejected request ({status}): {message}")]
    Remote { status: u16, message: String },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("it is not your turn")]
    NotInTurn,

    #[error("play is not available: {0}")]
    PlayUnavailable(&'static str),

    #[error("undo is not available")]
    UndoUnavailable,

    #[error("session has already submitted a turn")]
    SessionClosed,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GameError {
    /// Text for the error badge.
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote { message, .. } => message.clone(),
            Self::Transport(_) => "Could not reach the server. Please try again.".to_string(),
            Self::Decode(_) | Self::Json(_) => "Unexpected response from the server.".to_string(),
            other => other.to_string(),
        }
    }

    /// Remote validation and transport failures leave the arrangement intact
    /// and can be retried.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SessionClosed | Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Coord;

    #[test]
    fn test_remote_message_is_shown_verbatim() {
        let err = GameError::Remote {
            status: 400,
            message: "Play includes non-empty square".to_string(),
        };
        assert_eq!(err.user_message(), "Play includes non-empty square");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_rejection_converts() {
        let err: GameError = Rejection::CellOccupied(Coord::new(1, 2)).into();
        assert_eq!(
            err.to_string(),
            "move rejected: square (1, 2) already has a tile this turn"
        );
        assert!(!GameError::SessionClosed.is_recoverable());
    }
}
