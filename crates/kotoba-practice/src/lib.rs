//! Practice orchestration for Kotoba decks.
//!
//! Glues the pure scheduling core (`kotoba-srs`) to the persistence layer
//! (`kotoba-db`): selecting the next entry to review, applying review
//! actions atomically, enrolling bookmarked caption lines and reading
//! progress statistics.

pub mod error;
pub mod selection;
pub mod stats;
pub mod system;

pub use error::PracticeError;
pub use stats::{DeckStatistics, local_midnight, parse_offset};
pub use system::PracticeSystem;
