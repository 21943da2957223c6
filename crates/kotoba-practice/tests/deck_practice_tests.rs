use chrono::{DateTime, TimeZone, Utc};
use kotoba_practice::PracticeSystem;
use uuid::Uuid;

use crate::common;

#[tokio::test]
async fn enrolling_the_same_lines_twice_creates_each_entry_once() {
    let Some(pool) = common::test_pool().await.expect("Failed to set up test database") else {
        return;
    };
    let user_id = Uuid::new_v4();
    let deck_id = common::create_test_deck(&pool, user_id)
        .await
        .expect("Failed to create test deck");
    let system = PracticeSystem::new(pool.clone());

    let lines: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    let now = Utc::now();

    let first = system
        .enroll(user_id, deck_id, &lines, now)
        .await
        .expect("First enrollment failed");
    assert_eq!(first, 3);

    let second = system
        .enroll(user_id, deck_id, &lines, now)
        .await
        .expect("Second enrollment failed");
    assert_eq!(second, 0, "Re-enrolling the same lines should insert nothing");

    let rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM practice_entries WHERE deck_id = $1")
            .bind(deck_id)
            .fetch_one(&pool)
            .await
            .expect("Failed to count entries");
    assert_eq!(rows, 3, "Each line should be tracked exactly once");

    let new_count: i32 = sqlx::query_scalar("SELECT entries_new_count FROM decks WHERE id = $1")
        .bind(deck_id)
        .fetch_one(&pool)
        .await
        .expect("Failed to read deck cache");
    assert_eq!(new_count, 3, "NEW count must only reflect rows actually inserted");

    common::delete_deck(&pool, deck_id)
        .await
        .expect("Failed to clean up test deck");
}

#[tokio::test]
async fn overlapping_enrollment_counts_only_new_lines() {
    let Some(pool) = common::test_pool().await.expect("Failed to set up test database") else {
        return;
    };
    let user_id = Uuid::new_v4();
    let deck_id = common::create_test_deck(&pool, user_id)
        .await
        .expect("Failed to create test deck");
    let system = PracticeSystem::new(pool.clone());

    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let c = Uuid::new_v4();
    let now = Utc::now();

    let first = system
        .enroll(user_id, deck_id, &[a, b], now)
        .await
        .expect("First enrollment failed");
    assert_eq!(first, 2);

    let second = system
        .enroll(user_id, deck_id, &[b, c], now)
        .await
        .expect("Second enrollment failed");
    assert_eq!(second, 1, "Only the line not yet tracked should be inserted");

    let new_count: i32 = sqlx::query_scalar("SELECT entries_new_count FROM decks WHERE id = $1")
        .bind(deck_id)
        .fetch_one(&pool)
        .await
        .expect("Failed to read deck cache");
    assert_eq!(new_count, 3);

    common::delete_deck(&pool, deck_id)
        .await
        .expect("Failed to clean up test deck");
}

#[tokio::test]
async fn review_stamps_entry_with_the_submitted_time() {
    let Some(pool) = common::test_pool().await.expect("Failed to set up test database") else {
        return;
    };
    let user_id = Uuid::new_v4();
    let deck_id = common::create_test_deck(&pool, user_id)
        .await
        .expect("Failed to create test deck");
    let system = PracticeSystem::new(pool.clone());

    // Whole-second timestamps survive the round trip through TIMESTAMPTZ
    // (microsecond precision) unchanged.
    let enrolled_at = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
    let reviewed_at = Utc.with_ymd_and_hms(2026, 1, 5, 12, 30, 0).unwrap();

    let line = Uuid::new_v4();
    system
        .enroll(user_id, deck_id, &[line], enrolled_at)
        .await
        .expect("Enrollment failed");
    let entry_id: Uuid = sqlx::query_scalar("SELECT id FROM practice_entries WHERE deck_id = $1")
        .bind(deck_id)
        .fetch_one(&pool)
        .await
        .expect("Failed to fetch enrolled entry");

    let updated = system
        .submit_action(user_id, deck_id, entry_id, kotoba_srs::ActionType::Good, reviewed_at)
        .await
        .expect("Failed to submit action");
    assert_eq!(updated.updated_at, reviewed_at);

    // The stored row, the audit row and the returned entry all carry the
    // submitted instant; the random-mode deck seed derives from it.
    let stored: DateTime<Utc> =
        sqlx::query_scalar("SELECT updated_at FROM practice_entries WHERE id = $1")
            .bind(entry_id)
            .fetch_one(&pool)
            .await
            .expect("Failed to read entry");
    assert_eq!(stored, reviewed_at);

    let recorded: DateTime<Utc> =
        sqlx::query_scalar("SELECT created_at FROM practice_actions WHERE practice_entry_id = $1")
            .bind(entry_id)
            .fetch_one(&pool)
            .await
            .expect("Failed to read action");
    assert_eq!(recorded, reviewed_at);

    common::delete_deck(&pool, deck_id)
        .await
        .expect("Failed to clean up test deck");
}
