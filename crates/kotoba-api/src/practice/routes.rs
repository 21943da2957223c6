//! Practice endpoints.
//!
//! Authentication and session handling live in the upstream gateway, which
//! resolves the caller and injects the user id into the path. The user's
//! timezone arrives as a UTC-offset query parameter (`?tz=+09:00`) and
//! bounds the "daily" statistics window.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::Utc;
use kotoba_db::models::PracticeEntry;
use kotoba_practice::DeckStatistics;
use kotoba_srs::ActionType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, state::ApiState};

/// Create the practice routes
pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/practice/{user_id}/{deck_id}/next", get(next_entry))
        .route("/practice/{user_id}/{deck_id}/entries", post(enroll))
        .route("/practice/{user_id}/{deck_id}/stats", get(statistics))
        .route("/practice/{user_id}/{deck_id}/cache/reset", post(reset_cache))
        .route(
            "/practice/{user_id}/{deck_id}/{entry_id}/review",
            post(submit_review),
        )
}

#[derive(Deserialize)]
struct TzQuery {
    #[serde(default = "default_tz")]
    tz: String,
}

fn default_tz() -> String {
    "+00:00".to_owned()
}

#[derive(Deserialize)]
struct ReviewSubmission {
    action: ActionType,
}

#[derive(Deserialize)]
struct EnrollSubmission {
    caption_entry_ids: Vec<Uuid>,
}

#[derive(Serialize)]
struct EnrollResponse {
    enrolled: u64,
}

/// The next entry to review, or `null` when nothing is due or admissible.
async fn next_entry(
    State(state): State<ApiState>,
    Path((user_id, deck_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<TzQuery>,
) -> Result<Json<Option<PracticeEntry>>, ApiError> {
    let entry = state
        .practice
        .next_entry(user_id, deck_id, &query.tz, Utc::now())
        .await?;
    Ok(Json(entry))
}

/// Apply a review action to an entry; returns the entry's new state.
async fn submit_review(
    State(state): State<ApiState>,
    Path((user_id, deck_id, entry_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(payload): Json<ReviewSubmission>,
) -> Result<Json<PracticeEntry>, ApiError> {
    let entry = state
        .practice
        .submit_action(user_id, deck_id, entry_id, payload.action, Utc::now())
        .await?;
    Ok(Json(entry))
}

/// Enroll bookmarked caption lines into the deck. Already-tracked lines
/// are skipped, so retries are harmless.
async fn enroll(
    State(state): State<ApiState>,
    Path((user_id, deck_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<EnrollSubmission>,
) -> Result<Json<EnrollResponse>, ApiError> {
    let enrolled = state
        .practice
        .enroll(user_id, deck_id, &payload.caption_entry_ids, Utc::now())
        .await?;
    Ok(Json(EnrollResponse { enrolled }))
}

/// Daily and total progress figures for the deck.
async fn statistics(
    State(state): State<ApiState>,
    Path((user_id, deck_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<TzQuery>,
) -> Result<Json<DeckStatistics>, ApiError> {
    let stats = state
        .practice
        .statistics(user_id, deck_id, &query.tz, Utc::now())
        .await?;
    Ok(Json(stats))
}

/// Recompute the deck's counter cache from the underlying rows.
async fn reset_cache(
    State(state): State<ApiState>,
    Path((user_id, deck_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.practice.reset_cache(user_id, deck_id).await?;
    Ok(Json(serde_json::json!({ "message": "cache recomputed" })))
}
