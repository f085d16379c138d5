//! Error types for the scheduling engine.

use crate::models::{CardId, SetId};
use thiserror::Error;

/// Rejected input to the SM-2 calculation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("quality must be between 0 and 5, got {0}")]
    InvalidQuality(u8),

    /// The next review would fall past the last representable date
    #[error("next review {interval_days} days out is outside the supported calendar")]
    DateOutOfRange { interval_days: u64 },
}

/// Failures reading from or writing to a progress store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store switched off, lock poisoned, or backend otherwise unreachable
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("card not found: {0}")]
    CardNotFound(CardId),

    #[error("deck not found: {0}")]
    DeckNotFound(SetId),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors from the rating write path.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A session operation called in a state where it is not allowed.
///
/// The session is left untouched when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("no card to classify, the deck is exhausted")]
    Exhausted,

    #[error("card {requested} is not the presented card ({current})")]
    NotCurrent { requested: CardId, current: CardId },

    #[error("nothing to undo")]
    EmptyHistory,

    #[error("no unknown cards to retry")]
    NothingToRetry,

    #[error("session is not in retry mode")]
    NotInRetry,
}

/// Errors reading or writing JSON files (decks, config).
#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_quality_message() {
        let err = ScheduleError::InvalidQuality(7);
        assert_eq!(err.to_string(), "quality must be between 0 and 5, got 7");
    }

    #[test]
    fn test_review_error_is_transparent() {
        let err: ReviewError = StoreError::Unavailable("offline".to_string()).into();
        assert_eq!(err.to_string(), "store unavailable: offline");
    }

    #[test]
    fn test_not_current_message() {
        let err = TransitionError::NotCurrent {
            requested: 4,
            current: 2,
        };
        assert_eq!(err.to_string(), "card 4 is not the presented card (2)");
    }
}
