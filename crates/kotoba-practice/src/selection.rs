//! Deterministic next-entry admission logic.
//!
//! Pure so the priority and cap rules can be tested without storage: the
//! system feeds in today's action counts and the earliest due entry per
//! queue, and gets back which one (if any) to present.

use crate::stats::QueueCounts;

/// Daily admission caps from the deck configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionCaps {
    pub new_entries_per_day: i32,
    pub reviews_per_day: i32,
}

/// Choose the next entry among the per-queue due heads.
///
/// Priority: NEW while under today's cap, then LEARN unconditionally (a
/// LEARN backlog must drain promptly, so it is never rate-limited), then
/// REVIEW while under its cap. `daily_actions` counts today's actions by
/// the queue they were taken from.
pub fn pick_next<T>(
    caps: AdmissionCaps,
    daily_actions: &QueueCounts,
    due_new: Option<T>,
    due_learn: Option<T>,
    due_review: Option<T>,
) -> Option<T> {
    if daily_actions.new < i64::from(caps.new_entries_per_day)
        && due_new.is_some()
    {
        return due_new;
    }
    if due_learn.is_some() {
        return due_learn;
    }
    if daily_actions.review < i64::from(caps.reviews_per_day) && due_review.is_some() {
        return due_review;
    }
    None
}
