use chrono::{DateTime, Utc};
use kotoba_srs::QueueType;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::PracticeEntry;

pub async fn get_entry<'e, E>(
    executor: E,
    entry_id: Uuid,
) -> Result<Option<PracticeEntry>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT * FROM practice_entries WHERE id = $1
        "#,
    )
    .bind(entry_id)
    .fetch_optional(executor)
    .await
}

/// Fetch an entry with a row lock so the read state is still current when
/// the surrounding transaction writes the review back.
pub async fn get_entry_for_update<'e, E>(
    executor: E,
    entry_id: Uuid,
) -> Result<Option<PracticeEntry>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT * FROM practice_entries WHERE id = $1 FOR UPDATE
        "#,
    )
    .bind(entry_id)
    .fetch_optional(executor)
    .await
}

/// The due entry with the minimum `scheduled_at` for one queue type.
pub async fn earliest_due<'e, E>(
    executor: E,
    deck_id: Uuid,
    queue: QueueType,
    now: DateTime<Utc>,
) -> Result<Option<PracticeEntry>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT * FROM practice_entries
            WHERE deck_id = $1 AND queue_type = $2 AND scheduled_at <= $3
            ORDER BY scheduled_at
            LIMIT 1
        "#,
    )
    .bind(deck_id)
    .bind(queue.as_str())
    .bind(now)
    .fetch_optional(executor)
    .await
}

/// All due entries of a deck, the candidate set for random-mode scoring.
pub async fn due_entries<'e, E>(
    executor: E,
    deck_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<PracticeEntry>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT * FROM practice_entries
            WHERE deck_id = $1 AND scheduled_at <= $2
        "#,
    )
    .bind(deck_id)
    .bind(now)
    .fetch_all(executor)
    .await
}

/// `updated_at` of the most recently updated entry; the deck-seed source
/// for random mode. `None` for a deck with no entries.
pub async fn latest_update<'e, E>(
    executor: E,
    deck_id: Uuid,
) -> Result<Option<DateTime<Utc>>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT MAX(updated_at) FROM practice_entries WHERE deck_id = $1
        "#,
    )
    .bind(deck_id)
    .fetch_one(executor)
    .await
}

/// Enroll caption lines into a deck. Lines already tracked are silently
/// skipped; returns the number of rows actually inserted.
pub async fn enroll<'e, E>(
    executor: E,
    deck_id: Uuid,
    caption_entry_ids: &[Uuid],
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO practice_entries (deck_id, caption_entry_id, queue_type, ease_factor, scheduled_at)
            SELECT $1, caption_entry_id, 'NEW', 1.0, $3
            FROM UNNEST($2::uuid[]) AS caption_entry_id
            ON CONFLICT (deck_id, caption_entry_id) DO NOTHING
        "#,
    )
    .bind(deck_id)
    .bind(caption_entry_ids)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Write the outcome of a review back to the entry and bump its
/// denormalized action count in the same statement.
///
/// `updated_at` is stamped with the caller's clock, not the database's:
/// the random-mode deck seed derives from `MAX(updated_at)`, and the audit
/// row written alongside this update carries the same instant.
pub async fn apply_review<'e, E>(
    executor: E,
    entry_id: Uuid,
    queue: QueueType,
    ease_factor: f64,
    scheduled_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE practice_entries SET
                queue_type = $2,
                ease_factor = $3,
                scheduled_at = $4,
                practice_actions_count = practice_actions_count + 1,
                updated_at = $5
            WHERE id = $1
        "#,
    )
    .bind(entry_id)
    .bind(queue.as_str())
    .bind(ease_factor)
    .bind(scheduled_at)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}
