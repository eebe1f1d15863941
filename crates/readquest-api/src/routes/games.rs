//! Mini-game routes: word-search grids and game completion awards.

use std::sync::PoisonError;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use readquest_core::ids::{LearnerId, StoryId};
use readquest_progress::application::command_handlers;
use readquest_progress::domain::aggregates::LedgerEntry;
use readquest_progress::domain::commands;
use readquest_scoring::{GameResult, MiniGame, points_for_game};
use readquest_wordgrid::{GridConfig, WordGrid, WordGridView};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::stories::require_story;
use crate::error::ApiError;
use crate::state::AppState;

/// Body of GET /word-search/{story_id}.
#[derive(Debug, Serialize)]
pub struct WordSearchResponse {
    /// Story the vocabulary came from.
    pub story_id: StoryId,
    /// The grid and the words hidden in it.
    #[serde(flatten)]
    pub grid: WordGridView,
    /// Vocabulary words that did not fit.
    pub unplaced: Vec<String>,
}

/// Request body for POST /complete.
#[derive(Debug, Deserialize)]
pub struct CompleteGameRequest {
    /// The learner.
    pub learner_id: LearnerId,
    /// Story the game belongs to.
    pub story_id: StoryId,
    /// Which game finished.
    pub game: MiniGame,
    /// Items cleared.
    pub found: u32,
    /// Items offered.
    pub total: u32,
    /// Whether the timer ran out.
    #[serde(default)]
    pub timed_out: bool,
}

/// Points earned by a finished game.
#[derive(Debug, Serialize)]
pub struct CompleteGameResponse {
    /// Points the result is worth.
    pub points: u32,
    /// The ledger entry; absent when the game scored nothing.
    pub entry: Option<LedgerEntry>,
}

/// GET /word-search/{story_id}
#[instrument(skip(state))]
async fn word_search(
    State(state): State<AppState>,
    Path(story_id): Path<StoryId>,
) -> Result<Json<WordSearchResponse>, ApiError> {
    let story = require_story(&state, story_id)?;
    let grid = {
        let mut rng = state.rng.lock().unwrap_or_else(PoisonError::into_inner);
        WordGrid::generate(&story.vocabulary, &GridConfig::default(), &mut *rng)?
    };

    info!(
        placed = grid.placements().len(),
        unplaced = grid.unplaced().len(),
        "word-search grid generated"
    );

    Ok(Json(WordSearchResponse {
        story_id,
        unplaced: grid.unplaced().to_vec(),
        grid: grid.view(),
    }))
}

/// POST /complete
#[instrument(skip(state, request), fields(learner_id = %request.learner_id, game = ?request.game))]
async fn complete_game(
    State(state): State<AppState>,
    Json(request): Json<CompleteGameRequest>,
) -> Result<Json<CompleteGameResponse>, ApiError> {
    require_story(&state, request.story_id)?;
    let result = GameResult {
        game: request.game,
        found: request.found,
        total: request.total,
        timed_out: request.timed_out,
    };
    let points = points_for_game(&result);
    if points == 0 {
        info!("game scored no points");
        return Ok(Json(CompleteGameResponse {
            points,
            entry: None,
        }));
    }

    let command = commands::AwardPoints {
        correlation_id: Uuid::new_v4(),
        learner_id: request.learner_id,
        story_id: request.story_id,
        amount: i64::from(points),
        reason: request.game.award_reason(),
    };

    info!(correlation_id = %command.correlation_id, points, "handling game award");

    let awarded = command_handlers::handle_award_points(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CompleteGameResponse {
        points,
        entry: Some(awarded.entry),
    }))
}

/// Returns the router for the mini-games.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/word-search/{story_id}", get(word_search))
        .route("/complete", post(complete_game))
}
