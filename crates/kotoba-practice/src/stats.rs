//! Daily and total progress figures for a deck.
//!
//! Totals come straight from the deck's counter cache. Daily figures are
//! aggregated on demand from `practice_actions` since local midnight in the
//! user's timezone; daily windows roll over continuously, so caching them
//! would buy nothing.

use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use kotoba_db::models::Deck;
use kotoba_srs::{ActionType, QueueType};
use serde::{Deserialize, Serialize};

use crate::error::PracticeError;

/// Counts keyed by queue type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub new: i64,
    pub learn: i64,
    pub review: i64,
}

impl QueueCounts {
    pub const fn get(&self, queue: QueueType) -> i64 {
        match queue {
            QueueType::New => self.new,
            QueueType::Learn => self.learn,
            QueueType::Review => self.review,
        }
    }

    pub const fn add(&mut self, queue: QueueType, n: i64) {
        match queue {
            QueueType::New => self.new += n,
            QueueType::Learn => self.learn += n,
            QueueType::Review => self.review += n,
        }
    }

    /// Build from `(label, count)` aggregation rows.
    pub fn from_rows(rows: &[(String, i64)]) -> Result<Self, PracticeError> {
        let mut counts = Self::default();
        for (label, count) in rows {
            counts.add(label.parse()?, *count);
        }
        Ok(counts)
    }
}

/// Counts keyed by action type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounts {
    pub again: i64,
    pub hard: i64,
    pub good: i64,
    pub easy: i64,
}

impl ActionCounts {
    pub const fn get(&self, action: ActionType) -> i64 {
        match action {
            ActionType::Again => self.again,
            ActionType::Hard => self.hard,
            ActionType::Good => self.good,
            ActionType::Easy => self.easy,
        }
    }

    pub const fn add(&mut self, action: ActionType, n: i64) {
        match action {
            ActionType::Again => self.again += n,
            ActionType::Hard => self.hard += n,
            ActionType::Good => self.good += n,
            ActionType::Easy => self.easy += n,
        }
    }

    pub fn from_rows(rows: &[(String, i64)]) -> Result<Self, PracticeError> {
        let mut counts = Self::default();
        for (label, count) in rows {
            counts.add(label.parse()?, *count);
        }
        Ok(counts)
    }
}

/// Figures for the current local day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStatistics {
    pub actions_by_queue: QueueCounts,
    pub actions_by_action: ActionCounts,
}

/// Lifetime figures, read from the counter cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalStatistics {
    pub entries_by_queue: QueueCounts,
    pub actions_by_action: ActionCounts,
}

impl TotalStatistics {
    pub fn from_deck(deck: &Deck) -> Self {
        let mut totals = Self::default();
        for queue in QueueType::ALL {
            totals
                .entries_by_queue
                .add(queue, i64::from(deck.entries_count(queue)));
        }
        for action in ActionType::ALL {
            totals
                .actions_by_action
                .add(action, i64::from(deck.actions_count(action)));
        }
        totals
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckStatistics {
    pub daily: DailyStatistics,
    pub total: TotalStatistics,
}

/// Parse a UTC-offset string such as `+09:00` or `-05:30`.
pub fn parse_offset(tz: &str) -> Result<FixedOffset, PracticeError> {
    tz.parse()
        .map_err(|_| PracticeError::InvalidTimezone(tz.to_owned()))
}

/// Midnight of the current day in the user's timezone, as a UTC instant.
/// This is the lower bound of every "daily" aggregation window.
pub fn local_midnight(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local_day = now.with_timezone(&offset).date_naive();
    // Local midnight minus the offset is the same instant on the UTC clock.
    let utc_naive = local_day.and_time(NaiveTime::MIN) - offset;
    DateTime::from_naive_utc_and_offset(utc_naive, Utc)
}
