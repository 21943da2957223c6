use chrono::{DateTime, Utc};
use kotoba_srs::{ActionType, QueueType};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

/// Append one action record. `queue` is the entry's queue type *before* the
/// action; the table is the append-only audit trail driving statistics.
pub async fn insert_action<'e, E>(
    executor: E,
    entry_id: Uuid,
    deck_id: Uuid,
    queue: QueueType,
    action: ActionType,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO practice_actions (practice_entry_id, deck_id, queue_type, action_type, created_at)
            VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(entry_id)
    .bind(deck_id)
    .bind(queue.as_str())
    .bind(action.as_str())
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// Actions taken since `since`, grouped by the queue type they were taken
/// from. Drives both daily statistics and the daily admission caps.
pub async fn counts_by_queue_since<'e, E>(
    executor: E,
    deck_id: Uuid,
    since: DateTime<Utc>,
) -> Result<Vec<(String, i64)>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT queue_type, COUNT(*)
            FROM practice_actions
            WHERE deck_id = $1 AND created_at >= $2
            GROUP BY queue_type
        "#,
    )
    .bind(deck_id)
    .bind(since)
    .fetch_all(executor)
    .await
}

/// Actions taken since `since`, grouped by action type.
pub async fn counts_by_action_since<'e, E>(
    executor: E,
    deck_id: Uuid,
    since: DateTime<Utc>,
) -> Result<Vec<(String, i64)>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT action_type, COUNT(*)
            FROM practice_actions
            WHERE deck_id = $1 AND created_at >= $2
            GROUP BY action_type
        "#,
    )
    .bind(deck_id)
    .bind(since)
    .fetch_all(executor)
    .await
}
