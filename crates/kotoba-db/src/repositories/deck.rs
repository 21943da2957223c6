use kotoba_srs::{ActionType, QueueType};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::Deck;

pub async fn get_deck<'e, E>(executor: E, deck_id: Uuid) -> Result<Option<Deck>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT * FROM decks WHERE id = $1
        "#,
    )
    .bind(deck_id)
    .fetch_optional(executor)
    .await
}

/// Fetch a deck with a row lock, serializing concurrent practice operations
/// on the same deck for the lifetime of the surrounding transaction.
pub async fn get_deck_for_update<'e, E>(
    executor: E,
    deck_id: Uuid,
) -> Result<Option<Deck>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT * FROM decks WHERE id = $1 FOR UPDATE
        "#,
    )
    .bind(deck_id)
    .fetch_optional(executor)
    .await
}

/// Increment one lifetime action counter. The increment is evaluated by the
/// database, never read-modify-written in application memory.
pub async fn bump_action_count<'e, E>(
    executor: E,
    deck_id: Uuid,
    action: ActionType,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    // Column names cannot be bound, so pick the statement per action type.
    let sql = match action {
        ActionType::Again => {
            "UPDATE decks SET actions_again_count = actions_again_count + 1, updated_at = NOW() WHERE id = $1"
        }
        ActionType::Hard => {
            "UPDATE decks SET actions_hard_count = actions_hard_count + 1, updated_at = NOW() WHERE id = $1"
        }
        ActionType::Good => {
            "UPDATE decks SET actions_good_count = actions_good_count + 1, updated_at = NOW() WHERE id = $1"
        }
        ActionType::Easy => {
            "UPDATE decks SET actions_easy_count = actions_easy_count + 1, updated_at = NOW() WHERE id = $1"
        }
    };
    sqlx::query(sql).bind(deck_id).execute(executor).await?;
    Ok(())
}

/// Move one cached entry count from `from` to `to` in a single statement.
/// Callers skip this entirely when the queue did not change.
pub async fn shift_entry_count<'e, E>(
    executor: E,
    deck_id: Uuid,
    from: QueueType,
    to: QueueType,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE decks SET
                entries_new_count = entries_new_count
                    + CASE WHEN $3 = 'NEW' THEN 1 ELSE 0 END
                    - CASE WHEN $2 = 'NEW' THEN 1 ELSE 0 END,
                entries_learn_count = entries_learn_count
                    + CASE WHEN $3 = 'LEARN' THEN 1 ELSE 0 END
                    - CASE WHEN $2 = 'LEARN' THEN 1 ELSE 0 END,
                entries_review_count = entries_review_count
                    + CASE WHEN $3 = 'REVIEW' THEN 1 ELSE 0 END
                    - CASE WHEN $2 = 'REVIEW' THEN 1 ELSE 0 END,
                updated_at = NOW()
            WHERE id = $1
        "#,
    )
    .bind(deck_id)
    .bind(from.as_str())
    .bind(to.as_str())
    .execute(executor)
    .await?;
    Ok(())
}

/// Add freshly enrolled entries to the cached NEW count.
pub async fn add_new_entries<'e, E>(
    executor: E,
    deck_id: Uuid,
    inserted: i64,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE decks
            SET entries_new_count = entries_new_count + $2, updated_at = NOW()
            WHERE id = $1
        "#,
    )
    .bind(deck_id)
    .bind(inserted)
    .execute(executor)
    .await?;
    Ok(())
}

/// Replace the random-mode selection buffer together with the seed it was
/// computed under.
pub async fn store_random_batch<'e, E>(
    executor: E,
    deck_id: Uuid,
    seed: i64,
    batch: &[Uuid],
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE decks
            SET random_batch = $3, random_batch_seed = $2
            WHERE id = $1
        "#,
    )
    .bind(deck_id)
    .bind(seed)
    .bind(batch)
    .execute(executor)
    .await?;
    Ok(())
}

/// Recompute the whole counter cache from the underlying rows and clear the
/// random buffer. Recovery path for suspected cache drift.
pub async fn reset_cache<'e, E>(executor: E, deck_id: Uuid) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE decks SET
                entries_new_count = (
                    SELECT COUNT(*) FROM practice_entries
                    WHERE deck_id = $1 AND queue_type = 'NEW'
                ),
                entries_learn_count = (
                    SELECT COUNT(*) FROM practice_entries
                    WHERE deck_id = $1 AND queue_type = 'LEARN'
                ),
                entries_review_count = (
                    SELECT COUNT(*) FROM practice_entries
                    WHERE deck_id = $1 AND queue_type = 'REVIEW'
                ),
                actions_again_count = (
                    SELECT COUNT(*) FROM practice_actions
                    WHERE deck_id = $1 AND action_type = 'AGAIN'
                ),
                actions_hard_count = (
                    SELECT COUNT(*) FROM practice_actions
                    WHERE deck_id = $1 AND action_type = 'HARD'
                ),
                actions_good_count = (
                    SELECT COUNT(*) FROM practice_actions
                    WHERE deck_id = $1 AND action_type = 'GOOD'
                ),
                actions_easy_count = (
                    SELECT COUNT(*) FROM practice_actions
                    WHERE deck_id = $1 AND action_type = 'EASY'
                ),
                random_batch = '{}',
                random_batch_seed = 0,
                updated_at = NOW()
            WHERE id = $1
        "#,
    )
    .bind(deck_id)
    .execute(executor)
    .await?;
    Ok(())
}
