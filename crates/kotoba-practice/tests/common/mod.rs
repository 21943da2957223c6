use sqlx::PgPool;
use uuid::Uuid;

/// Connect to the database named by `TEST_DATABASE_URL` and run migrations.
/// Returns `None` when the variable is unset; callers skip their test then.
pub async fn test_pool() -> anyhow::Result<Option<PgPool>> {
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        return Ok(None);
    };
    let pool = kotoba_db::create_pool(&database_url).await?;
    kotoba_db::ensure_db_and_migrate(&database_url, &pool).await?;
    Ok(Some(pool))
}

/// Create a deck with default tuning for `user_id` and return its id.
/// Each test creates its own deck so concurrent tests never share rows.
pub async fn create_test_deck(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Uuid> {
    let deck_id = Uuid::new_v4();
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO decks (id, user_id, name)
            VALUES ($1, $2, $3)
        "#,
    )
    .bind(deck_id)
    .bind(user_id)
    .bind(format!("Test deck {deck_id}"))
    .execute(pool)
    .await?;
    Ok(deck_id)
}

/// Delete a deck; related entries and actions cascade.
pub async fn delete_deck(pool: &PgPool, deck_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM decks WHERE id = $1
        "#,
    )
    .bind(deck_id)
    .execute(pool)
    .await?;
    Ok(())
}
