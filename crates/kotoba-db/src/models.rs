use std::str::FromStr;

use chrono::{DateTime, Utc};
use kotoba_srs::{ActionType, DeckTuning, QueueType, UnknownLabel};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, postgres::PgRow};
use uuid::Uuid;

/// Deck model - scheduling configuration plus the materialized counter cache.
///
/// The `entries_*_count` / `actions_*_count` columns mirror the true row
/// counts in `practice_entries` / `practice_actions` and are maintained
/// transactionally by the practice system; readers may trust them without
/// re-aggregating.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Deck {
    /// Unique deck identifier
    pub id: Uuid,
    /// Owning user (authentication lives outside this service)
    pub user_id: Uuid,
    /// Deck name (max 255 chars for optimal indexing)
    pub name: String,
    /// Daily admission cap for NEW entries
    pub new_entries_per_day: i32,
    /// Daily admission cap for REVIEW entries
    pub reviews_per_day: i32,
    /// Ease multiplier applied when an entry enters REVIEW
    pub ease_multiplier: f64,
    /// Extra multiplier for EASY answers entering REVIEW
    pub ease_bonus: f64,
    /// Weighted pseudo-random selection instead of strict priority order
    pub random_mode: bool,
    /// Cached count of NEW entries
    pub entries_new_count: i32,
    /// Cached count of LEARN entries
    pub entries_learn_count: i32,
    /// Cached count of REVIEW entries
    pub entries_review_count: i32,
    /// Cached lifetime count of AGAIN actions
    pub actions_again_count: i32,
    /// Cached lifetime count of HARD actions
    pub actions_hard_count: i32,
    /// Cached lifetime count of GOOD actions
    pub actions_good_count: i32,
    /// Cached lifetime count of EASY actions
    pub actions_easy_count: i32,
    /// Precomputed random-mode selection buffer (entry ids, best first)
    pub random_batch: Vec<Uuid>,
    /// Deck seed the buffer was computed under; a mismatch invalidates it
    pub random_batch_seed: i64,
    /// When the deck was created
    pub created_at: DateTime<Utc>,
    /// When the deck was last updated
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    /// Cached entry count for one queue type.
    pub const fn entries_count(&self, queue: QueueType) -> i32 {
        match queue {
            QueueType::New => self.entries_new_count,
            QueueType::Learn => self.entries_learn_count,
            QueueType::Review => self.entries_review_count,
        }
    }

    /// Cached lifetime action count for one action type.
    pub const fn actions_count(&self, action: ActionType) -> i32 {
        match action {
            ActionType::Again => self.actions_again_count,
            ActionType::Hard => self.actions_hard_count,
            ActionType::Good => self.actions_good_count,
            ActionType::Easy => self.actions_easy_count,
        }
    }

    pub const fn tuning(&self) -> DeckTuning {
        DeckTuning {
            ease_multiplier: self.ease_multiplier,
            ease_bonus: self.ease_bonus,
        }
    }
}

/// One memorized caption line inside a deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeEntry {
    /// Unique entry identifier
    pub id: Uuid,
    /// Deck this entry belongs to
    pub deck_id: Uuid,
    /// The bookmarked caption line being reviewed (owned elsewhere)
    pub caption_entry_id: Uuid,
    /// Current scheduling phase
    pub queue_type: QueueType,
    /// Multiplicative scheduling weight, starts at 1
    pub ease_factor: f64,
    /// Next-due timestamp
    pub scheduled_at: DateTime<Utc>,
    /// Denormalized count of actions taken against this entry
    pub practice_actions_count: i32,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
    /// When the entry was last updated
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit record of one review action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeAction {
    /// Unique action identifier
    pub id: Uuid,
    /// Entry this action was taken against
    pub practice_entry_id: Uuid,
    /// Deck of the entry (denormalized for daily aggregation)
    pub deck_id: Uuid,
    /// The entry's queue type *before* this action
    pub queue_type: QueueType,
    /// The user's answer
    pub action_type: ActionType,
    /// When this action occurred
    pub created_at: DateTime<Utc>,
}

fn decode_label<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = UnknownLabel>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|err: UnknownLabel| sqlx::Error::ColumnDecode {
        index: column.to_owned(),
        source: Box::new(err),
    })
}

impl<'r> FromRow<'r, PgRow> for PracticeEntry {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            deck_id: row.try_get("deck_id")?,
            caption_entry_id: row.try_get("caption_entry_id")?,
            queue_type: decode_label(row, "queue_type")?,
            ease_factor: row.try_get("ease_factor")?,
            scheduled_at: row.try_get("scheduled_at")?,
            practice_actions_count: row.try_get("practice_actions_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for PracticeAction {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            practice_entry_id: row.try_get("practice_entry_id")?,
            deck_id: row.try_get("deck_id")?,
            queue_type: decode_label(row, "queue_type")?,
            action_type: decode_label(row, "action_type")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
