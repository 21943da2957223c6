//! SRS (Spaced Repetition System) core for Kotoba
//!
//! This crate provides the scheduling model for practice entries: queue
//! transitions, interval arithmetic, ease-factor updates and the weighted
//! pseudo-random selection scoring. Everything here is pure and
//! storage-independent so it can be unit-tested without a database.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod random;
pub mod rules;
pub mod timedelta;

pub use timedelta::Timedelta;

/// Coarse scheduling phase of a practice entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueueType {
    New,
    Learn,
    Review,
}

/// User's self-assessed recall quality for a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionType {
    Again,
    Hard,
    Good,
    Easy,
}

/// Raised when a stored queue/action label does not map to a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} label: {value}")]
pub struct UnknownLabel {
    kind: &'static str,
    value: String,
}

impl QueueType {
    /// All queue types, in storage order.
    pub const ALL: [Self; 3] = [Self::New, Self::Learn, Self::Review];

    /// The label used in storage and on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Learn => "LEARN",
            Self::Review => "REVIEW",
        }
    }
}

impl FromStr for QueueType {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "LEARN" => Ok(Self::Learn),
            "REVIEW" => Ok(Self::Review),
            other => Err(UnknownLabel {
                kind: "queue type",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ActionType {
    /// All action types, in storage order.
    pub const ALL: [Self; 4] = [Self::Again, Self::Hard, Self::Good, Self::Easy];

    /// The label used in storage and on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Again => "AGAIN",
            Self::Hard => "HARD",
            Self::Good => "GOOD",
            Self::Easy => "EASY",
        }
    }
}

impl FromStr for ActionType {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AGAIN" => Ok(Self::Again),
            "HARD" => Ok(Self::Hard),
            "GOOD" => Ok(Self::Good),
            "EASY" => Ok(Self::Easy),
            other => Err(UnknownLabel {
                kind: "action type",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-deck scheduling tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeckTuning {
    /// Multiplier applied to the ease factor when an entry re-enters REVIEW.
    pub ease_multiplier: f64,
    /// Extra multiplier on top of `ease_multiplier` for an EASY answer.
    pub ease_bonus: f64,
}

/// The scheduling-relevant state of an entry before an action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewState {
    pub queue: QueueType,
    pub ease_factor: f64,
}

/// The computed result of applying an action to an entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewOutcome {
    pub queue: QueueType,
    pub ease_factor: f64,
    pub scheduled_at: DateTime<Utc>,
    /// The interval that was added to `now`, after ease scaling.
    pub interval: Timedelta,
}

/// Apply a review action to an entry's scheduling state.
///
/// The next queue and base interval come from the fixed rule tables in
/// [`rules`]. Entries already in REVIEW have their base interval scaled by
/// the current ease factor. The ease factor itself changes only when the
/// entry *enters* REVIEW from another queue (multiplied by
/// `ease_multiplier`, and by `ease_bonus` too for EASY); AGAIN always resets
/// it to 1 regardless of the resulting queue.
pub fn apply_action(
    state: ReviewState,
    action: ActionType,
    tuning: &DeckTuning,
    now: DateTime<Utc>,
) -> ReviewOutcome {
    let next = rules::next_queue(state.queue, action);

    let mut interval = rules::base_interval(state.queue, action);
    if state.queue == QueueType::Review {
        interval = interval * state.ease_factor;
    }

    let ease_factor = if action == ActionType::Again {
        1.0
    } else if next == QueueType::Review && state.queue != QueueType::Review {
        let mut ease = state.ease_factor * tuning.ease_multiplier;
        if action == ActionType::Easy {
            ease *= tuning.ease_bonus;
        }
        ease
    } else {
        state.ease_factor
    };

    ReviewOutcome {
        queue: next,
        ease_factor,
        scheduled_at: interval.add_to(now),
        interval,
    }
}
