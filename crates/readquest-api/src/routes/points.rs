//! Routes for the points ledger.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use readquest_core::ids::{LearnerId, StoryId};
use readquest_progress::application::query_handlers::{self, PointsSummaryView};
use readquest_progress::application::command_handlers;
use readquest_progress::domain::aggregates::LedgerEntry;
use readquest_progress::domain::commands;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /award.
#[derive(Debug, Deserialize)]
pub struct AwardPointsRequest {
    /// The learner.
    pub learner_id: LearnerId,
    /// Story the points were earned in.
    pub story_id: StoryId,
    /// Points to add; must be positive.
    pub amount: i64,
    /// Ledger reason.
    pub reason: String,
}

/// The appended entry plus the persisted event ids.
#[derive(Debug, Serialize)]
pub struct AwardResponse {
    /// The new ledger entry.
    #[serde(flatten)]
    pub entry: LedgerEntry,
    /// IDs of the persisted events.
    pub event_ids: Vec<Uuid>,
}

/// POST /award
#[instrument(skip(state, request), fields(learner_id = %request.learner_id, amount = request.amount))]
async fn award_points(
    State(state): State<AppState>,
    Json(request): Json<AwardPointsRequest>,
) -> Result<Json<AwardResponse>, ApiError> {
    let command = commands::AwardPoints {
        correlation_id: Uuid::new_v4(),
        learner_id: request.learner_id,
        story_id: request.story_id,
        amount: request.amount,
        reason: request.reason,
    };

    info!(correlation_id = %command.correlation_id, "handling award_points command");

    let result = command_handlers::handle_award_points(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(AwardResponse {
        entry: result.entry,
        event_ids: result.stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// GET /{learner_id}
#[instrument(skip(state))]
async fn get_points_summary(
    State(state): State<AppState>,
    Path(learner_id): Path<LearnerId>,
) -> Result<Json<PointsSummaryView>, ApiError> {
    let view = query_handlers::get_points_summary(learner_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// Returns the router for the points ledger.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/award", post(award_points))
        .route("/{learner_id}", get(get_points_summary))
}
