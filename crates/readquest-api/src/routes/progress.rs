//! Routes for a learner's position inside a story.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use readquest_core::ids::{LearnerId, StoryId};
use readquest_progress::application::notifier::ProgressUpdated;
use readquest_progress::application::{command_handlers, query_handlers};
use readquest_progress::domain::aggregates::ProgressRecord;
use readquest_progress::domain::commands;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::stories::require_story;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /initialize.
#[derive(Debug, Deserialize)]
pub struct InitializeProgressRequest {
    /// The learner opening the story.
    pub learner_id: LearnerId,
    /// The story being opened.
    pub story_id: StoryId,
}

/// Request body for POST /advance.
#[derive(Debug, Deserialize)]
pub struct AdvanceProgressRequest {
    /// The learner.
    pub learner_id: LearnerId,
    /// The story.
    pub story_id: StoryId,
    /// Level to move to.
    pub next_level: u32,
    /// Step to move to.
    pub next_step: u32,
    /// Level just finished, if any.
    #[serde(default)]
    pub completed_level: Option<u32>,
}

/// A progress record plus the events the command persisted.
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    /// The record after the command.
    #[serde(flatten)]
    pub record: ProgressRecord,
    /// IDs of the persisted events; empty when nothing changed.
    pub event_ids: Vec<Uuid>,
}

/// POST /initialize
#[instrument(skip(state, request), fields(learner_id = %request.learner_id, story_id = %request.story_id))]
async fn initialize_progress(
    State(state): State<AppState>,
    Json(request): Json<InitializeProgressRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    require_story(&state, request.story_id)?;
    let command = commands::InitializeProgress {
        correlation_id: Uuid::new_v4(),
        learner_id: request.learner_id,
        story_id: request.story_id,
    };

    info!(correlation_id = %command.correlation_id, "handling initialize_progress command");

    let result = command_handlers::handle_initialize_progress(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(ProgressResponse {
        record: result.record,
        event_ids: result.stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// GET /{learner_id}/{story_id}
#[instrument(skip(state))]
async fn get_progress(
    State(state): State<AppState>,
    Path((learner_id, story_id)): Path<(LearnerId, StoryId)>,
) -> Result<Json<ProgressRecord>, ApiError> {
    query_handlers::get_progress(learner_id, story_id, &*state.event_repository)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::not_found(
                "progress_not_found",
                format!("learner {learner_id} has not opened story {story_id}"),
            )
        })
}

/// POST /advance
#[instrument(skip(state, request), fields(learner_id = %request.learner_id, story_id = %request.story_id))]
async fn advance_progress(
    State(state): State<AppState>,
    Json(request): Json<AdvanceProgressRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let command = commands::AdvanceProgress {
        correlation_id: Uuid::new_v4(),
        learner_id: request.learner_id,
        story_id: request.story_id,
        next_level: request.next_level,
        next_step: request.next_step,
        completed_level: request.completed_level,
    };

    info!(correlation_id = %command.correlation_id, "handling advance_progress command");

    let result = command_handlers::handle_advance_progress(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;
    state.notifier.publish(ProgressUpdated::from(&result.record));

    Ok(Json(ProgressResponse {
        record: result.record,
        event_ids: result.stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// Returns the router for the progress context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/initialize", post(initialize_progress))
        .route("/advance", post(advance_progress))
        .route("/{learner_id}/{story_id}", get(get_progress))
}
