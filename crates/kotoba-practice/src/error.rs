use kotoba_srs::UnknownLabel;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the practice system.
///
/// Persistence failures are propagated unmodified; retry policy belongs to
/// the caller. State-changing operations are all-or-nothing, so an error
/// always means "not applied".
#[derive(Debug, Error)]
pub enum PracticeError {
    #[error("deck not found: {0}")]
    DeckNotFound(Uuid),
    #[error("practice entry not found: {0}")]
    EntryNotFound(Uuid),
    #[error("entry {entry_id} belongs to deck {actual}, not {expected}")]
    DeckMismatch {
        entry_id: Uuid,
        expected: Uuid,
        actual: Uuid,
    },
    #[error("invalid timezone offset: {0}")]
    InvalidTimezone(String),
    #[error("corrupt stored label: {0}")]
    CorruptLabel(#[from] UnknownLabel),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
