//! The practice system: next-entry selection, action application,
//! enrollment, statistics and cache recovery.
//!
//! Every mutating operation runs inside one transaction that first locks
//! the deck row (`SELECT ... FOR UPDATE`). Counter-cache writes are
//! in-database increment expressions, so two devices reviewing the same
//! deck concurrently serialize on the deck row instead of losing updates.

use chrono::{DateTime, FixedOffset, Utc};
use kotoba_db::models::{Deck, PracticeEntry};
use kotoba_db::repositories::{action, deck, entry};
use kotoba_srs::{ActionType, QueueType, ReviewState, random};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::PracticeError;
use crate::selection::{AdmissionCaps, pick_next};
use crate::stats::{
    ActionCounts, DailyStatistics, DeckStatistics, QueueCounts, TotalStatistics, local_midnight,
    parse_offset,
};

/// How many top-scoring entries a random-mode batch holds.
const RANDOM_BATCH_SIZE: usize = 16;

#[derive(Debug, Clone)]
pub struct PracticeSystem {
    pool: PgPool,
}

impl PracticeSystem {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Lock the deck row and verify ownership. A deck belonging to someone
    /// else reads as not-found rather than leaking its existence.
    async fn deck_locked(
        tx: &mut Transaction<'_, Postgres>,
        deck_id: Uuid,
        user_id: Uuid,
    ) -> Result<Deck, PracticeError> {
        let found = deck::get_deck_for_update(&mut **tx, deck_id).await?;
        match found {
            Some(deck) if deck.user_id == user_id => Ok(deck),
            _ => Err(PracticeError::DeckNotFound(deck_id)),
        }
    }

    /// The single next entry the user should review now, or `None` when
    /// nothing is due or admissible. An empty result is not an error.
    pub async fn next_entry(
        &self,
        user_id: Uuid,
        deck_id: Uuid,
        tz: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PracticeEntry>, PracticeError> {
        let offset = parse_offset(tz)?;
        let mut tx = self.pool.begin().await?;
        let deck = Self::deck_locked(&mut tx, deck_id, user_id).await?;

        let picked = if deck.random_mode {
            Self::next_random(&mut tx, &deck, now).await?
        } else {
            Self::next_deterministic(&mut tx, &deck, offset, now).await?
        };

        tx.commit().await?;
        Ok(picked)
    }

    /// Strict priority selection: NEW under today's cap, then LEARN, then
    /// REVIEW under its cap.
    async fn next_deterministic(
        tx: &mut Transaction<'_, Postgres>,
        deck: &Deck,
        offset: FixedOffset,
        now: DateTime<Utc>,
    ) -> Result<Option<PracticeEntry>, PracticeError> {
        let start = local_midnight(now, offset);
        let rows = action::counts_by_queue_since(&mut **tx, deck.id, start).await?;
        let daily_actions = QueueCounts::from_rows(&rows)?;

        let due_new = entry::earliest_due(&mut **tx, deck.id, QueueType::New, now).await?;
        let due_learn = entry::earliest_due(&mut **tx, deck.id, QueueType::Learn, now).await?;
        let due_review = entry::earliest_due(&mut **tx, deck.id, QueueType::Review, now).await?;

        let caps = AdmissionCaps {
            new_entries_per_day: deck.new_entries_per_day,
            reviews_per_day: deck.reviews_per_day,
        };
        Ok(pick_next(caps, &daily_actions, due_new, due_learn, due_review))
    }

    /// Weighted pseudo-random selection, reproducible from deck state.
    ///
    /// The deck seed derives from the most recently updated entry, so any
    /// action invalidates the cached batch wholesale on the next call; the
    /// deck row lock held by the caller makes peek-and-rebuild atomic.
    /// Selection peeks rather than pops: repeated calls with no intervening
    /// action return the same entry.
    async fn next_random(
        tx: &mut Transaction<'_, Postgres>,
        deck: &Deck,
        now: DateTime<Utc>,
    ) -> Result<Option<PracticeEntry>, PracticeError> {
        let Some(latest) = entry::latest_update(&mut **tx, deck.id).await? else {
            return Ok(None);
        };
        let seed = random::deck_seed(latest);
        let stored_seed = seed as i64;

        // Consume the cached batch while its seed is still current,
        // dropping ids that are gone or no longer due.
        if deck.random_batch_seed == stored_seed {
            for (skipped, id) in deck.random_batch.iter().enumerate() {
                let found = entry::get_entry(&mut **tx, *id).await?;
                let Some(head) = found else { continue };
                if head.scheduled_at > now {
                    continue;
                }
                if skipped > 0 {
                    deck::store_random_batch(
                        &mut **tx,
                        deck.id,
                        stored_seed,
                        &deck.random_batch[skipped..],
                    )
                    .await?;
                }
                return Ok(Some(head));
            }
        }

        // Batch exhausted or seed changed: rescore all due entries.
        let candidates = entry::due_entries(&mut **tx, deck.id, now).await?;
        if candidates.is_empty() {
            deck::store_random_batch(&mut **tx, deck.id, stored_seed, &[]).await?;
            return Ok(None);
        }

        let regime = random::regime(seed);
        let mut scored: Vec<(f64, usize)> = candidates
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let score = random::score(
                    seed,
                    regime,
                    e.id,
                    e.queue_type,
                    e.scheduled_at,
                    e.updated_at,
                    now,
                );
                (score, i)
            })
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        let batch: Vec<Uuid> = scored
            .iter()
            .take(RANDOM_BATCH_SIZE)
            .map(|&(_, i)| candidates[i].id)
            .collect();
        deck::store_random_batch(&mut **tx, deck.id, stored_seed, &batch).await?;

        tracing::debug!(
            deck_id = %deck.id,
            regime = %regime,
            candidates = candidates.len(),
            batch = batch.len(),
            "rebuilt random-mode batch"
        );
        Ok(Some(candidates[scored[0].1].clone()))
    }

    /// Apply a review action: record the audit row, update the entry's
    /// scheduling state and keep the deck's counter cache in step, all as
    /// one transaction.
    pub async fn submit_action(
        &self,
        user_id: Uuid,
        deck_id: Uuid,
        entry_id: Uuid,
        action_type: ActionType,
        now: DateTime<Utc>,
    ) -> Result<PracticeEntry, PracticeError> {
        let mut tx = self.pool.begin().await?;
        let deck = Self::deck_locked(&mut tx, deck_id, user_id).await?;

        let entry = entry::get_entry_for_update(&mut *tx, entry_id)
            .await?
            .ok_or(PracticeError::EntryNotFound(entry_id))?;
        if entry.deck_id != deck.id {
            return Err(PracticeError::DeckMismatch {
                entry_id,
                expected: deck.id,
                actual: entry.deck_id,
            });
        }

        let outcome = kotoba_srs::apply_action(
            ReviewState {
                queue: entry.queue_type,
                ease_factor: entry.ease_factor,
            },
            action_type,
            &deck.tuning(),
            now,
        );

        // The action records the queue the entry was reviewed from.
        action::insert_action(&mut *tx, entry.id, deck.id, entry.queue_type, action_type, now)
            .await?;
        entry::apply_review(
            &mut *tx,
            entry.id,
            outcome.queue,
            outcome.ease_factor,
            outcome.scheduled_at,
            now,
        )
        .await?;
        deck::bump_action_count(&mut *tx, deck.id, action_type).await?;
        if entry.queue_type != outcome.queue {
            deck::shift_entry_count(&mut *tx, deck.id, entry.queue_type, outcome.queue).await?;
        }

        tx.commit().await?;

        tracing::debug!(
            deck_id = %deck.id,
            entry_id = %entry.id,
            action = %action_type,
            from = %entry.queue_type,
            to = %outcome.queue,
            "applied practice action"
        );

        Ok(PracticeEntry {
            queue_type: outcome.queue,
            ease_factor: outcome.ease_factor,
            scheduled_at: outcome.scheduled_at,
            practice_actions_count: entry.practice_actions_count + 1,
            updated_at: now,
            ..entry
        })
    }

    /// Enroll bookmarked caption lines into a deck. Idempotent per line;
    /// returns how many entries were actually created.
    pub async fn enroll(
        &self,
        user_id: Uuid,
        deck_id: Uuid,
        caption_entry_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<u64, PracticeError> {
        let mut tx = self.pool.begin().await?;
        let deck = Self::deck_locked(&mut tx, deck_id, user_id).await?;

        let inserted = entry::enroll(&mut *tx, deck.id, caption_entry_ids, now).await?;
        if inserted > 0 {
            deck::add_new_entries(&mut *tx, deck.id, i64::try_from(inserted).unwrap_or(i64::MAX))
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            deck_id = %deck.id,
            requested = caption_entry_ids.len(),
            inserted,
            "enrolled caption lines"
        );
        Ok(inserted)
    }

    /// Daily (since local midnight) and total (from the counter cache)
    /// progress figures.
    pub async fn statistics(
        &self,
        user_id: Uuid,
        deck_id: Uuid,
        tz: &str,
        now: DateTime<Utc>,
    ) -> Result<DeckStatistics, PracticeError> {
        let offset = parse_offset(tz)?;
        let start = local_midnight(now, offset);

        let deck = deck::get_deck(&self.pool, deck_id)
            .await?
            .filter(|d| d.user_id == user_id)
            .ok_or(PracticeError::DeckNotFound(deck_id))?;

        let by_queue = action::counts_by_queue_since(&self.pool, deck.id, start).await?;
        let by_action = action::counts_by_action_since(&self.pool, deck.id, start).await?;

        Ok(DeckStatistics {
            daily: DailyStatistics {
                actions_by_queue: QueueCounts::from_rows(&by_queue)?,
                actions_by_action: ActionCounts::from_rows(&by_action)?,
            },
            total: TotalStatistics::from_deck(&deck),
        })
    }

    /// Rebuild the whole counter cache from the underlying rows. Recovery
    /// path after bulk imports, manual corrections or suspected drift.
    pub async fn reset_cache(&self, user_id: Uuid, deck_id: Uuid) -> Result<(), PracticeError> {
        let mut tx = self.pool.begin().await?;
        let deck = Self::deck_locked(&mut tx, deck_id, user_id).await?;
        deck::reset_cache(&mut *tx, deck.id).await?;
        tx.commit().await?;

        tracing::info!(deck_id = %deck.id, "recomputed deck counter cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Pure simulation of the counter-cache maintenance rule: the cache is
    //! only shifted when an action changes an entry's queue, and must then
    //! always equal a from-scratch recount.

    use chrono::Utc;
    use kotoba_srs::{DeckTuning, ReviewOutcome, apply_action};

    use super::*;
    use crate::stats::QueueCounts;

    struct SimEntry {
        queue: QueueType,
        ease_factor: f64,
    }

    struct Sim {
        entries: Vec<SimEntry>,
        cached_entries: QueueCounts,
        cached_actions: ActionCounts,
        tuning: DeckTuning,
    }

    impl Sim {
        fn with_new_entries(n: usize) -> Self {
            let entries = (0..n)
                .map(|_| SimEntry {
                    queue: QueueType::New,
                    ease_factor: 1.0,
                })
                .collect();
            Self {
                entries,
                cached_entries: QueueCounts {
                    new: n as i64,
                    learn: 0,
                    review: 0,
                },
                cached_actions: ActionCounts::default(),
                tuning: DeckTuning {
                    ease_multiplier: 2.0,
                    ease_bonus: 1.5,
                },
            }
        }

        /// Mirrors `submit_action`'s cache bookkeeping.
        fn act(&mut self, index: usize, action: ActionType) -> ReviewOutcome {
            let entry = &mut self.entries[index];
            let outcome = apply_action(
                ReviewState {
                    queue: entry.queue,
                    ease_factor: entry.ease_factor,
                },
                action,
                &self.tuning,
                Utc::now(),
            );
            self.cached_actions.add(action, 1);
            if entry.queue != outcome.queue {
                self.cached_entries.add(entry.queue, -1);
                self.cached_entries.add(outcome.queue, 1);
            }
            entry.queue = outcome.queue;
            entry.ease_factor = outcome.ease_factor;
            outcome
        }

        fn recount(&self) -> QueueCounts {
            let mut counts = QueueCounts::default();
            for entry in &self.entries {
                counts.add(entry.queue, 1);
            }
            counts
        }
    }

    #[test]
    fn cache_matches_recount_through_arbitrary_sequences() {
        let mut sim = Sim::with_new_entries(8);
        let script = [
            (0, ActionType::Good),
            (1, ActionType::Easy),
            (0, ActionType::Good),
            (2, ActionType::Again),
            (0, ActionType::Hard),
            (1, ActionType::Again),
            (3, ActionType::Easy),
            (0, ActionType::Good),
            (4, ActionType::Hard),
            (2, ActionType::Good),
        ];
        for (index, action) in script {
            sim.act(index, action);
            assert_eq!(sim.cached_entries, sim.recount());
        }
        let total_actions = sim.cached_actions.again
            + sim.cached_actions.hard
            + sim.cached_actions.good
            + sim.cached_actions.easy;
        assert_eq!(total_actions, script.len() as i64);
    }

    #[test]
    fn first_scenario_from_new_to_learn() {
        // One NEW entry, action GOOD: moves to LEARN a day out, ease
        // untouched, NEW count drops to zero, LEARN count rises to one.
        let mut sim = Sim::with_new_entries(1);
        let outcome = sim.act(0, ActionType::Good);
        assert_eq!(outcome.queue, QueueType::Learn);
        assert_eq!(outcome.ease_factor, 1.0);
        assert_eq!(outcome.interval, kotoba_srs::Timedelta::days(1));
        assert_eq!(
            sim.cached_entries,
            QueueCounts {
                new: 0,
                learn: 1,
                review: 0
            }
        );
        assert_eq!(sim.cached_actions.good, 1);
    }

    #[test]
    fn totals_never_decrease() {
        let mut sim = Sim::with_new_entries(3);
        let mut last = 0;
        for action in [
            ActionType::Good,
            ActionType::Again,
            ActionType::Easy,
            ActionType::Hard,
            ActionType::Good,
        ] {
            sim.act(0, action);
            let total = sim.cached_actions.again
                + sim.cached_actions.hard
                + sim.cached_actions.good
                + sim.cached_actions.easy;
            assert!(total > last);
            last = total;
        }
    }
}
