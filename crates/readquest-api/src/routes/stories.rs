//! Story list with per-learner lock state.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use readquest_catalog::{Story, StoryListView, StoryListing};
use readquest_core::ids::{LearnerId, StoryId};
use tracing::{debug, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Looks up a catalog story or fails with `story_not_found`.
pub(crate) fn require_story(state: &AppState, story_id: StoryId) -> Result<&Story, ApiError> {
    state
        .catalog
        .story(story_id)
        .ok_or_else(|| ApiError::not_found("story_not_found", format!("story {story_id} is not in the catalog")))
}

/// GET /{learner_id}
#[instrument(skip(state))]
async fn list_stories(
    State(state): State<AppState>,
    Path(learner_id): Path<LearnerId>,
) -> Result<Json<Vec<StoryListing>>, ApiError> {
    let view = StoryListView::new(
        learner_id,
        Arc::clone(&state.catalog),
        state.unlock_policy,
        Arc::clone(&state.progress_store),
    );
    let reachability = view.refresh().await?;
    debug!(unlocked = reachability.unlocked().count(), "story list built");
    Ok(Json(view.listings()))
}

/// Returns the router for the story list.
pub fn router() -> Router<AppState> {
    Router::new().route("/{learner_id}", get(list_stories))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use readquest_catalog::Mode;
    use readquest_core::ids::{LearnerId, StoryId};
    use readquest_test_support::FailingEventRepository;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::router;
    use crate::state::{AppState, state_with, test_state};

    async fn list(state: AppState, learner: LearnerId) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(format!("/{learner}"))
            .body(Body::empty())
            .unwrap();
        let response = router().with_state(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn locked_flags(json: &Value) -> Vec<bool> {
        json.as_array()
            .unwrap()
            .iter()
            .map(|story| story["locked"].as_bool().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_new_learner_in_production_sees_only_first_story_open() {
        let (status, json) = list(test_state(Mode::Production), LearnerId::new_v4()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(locked_flags(&json), vec![false, true, true, true, true]);
        assert_eq!(json[0]["title"], "Orman Şenliği");
        assert_eq!(json[0]["completed_level"], 0);
    }

    #[tokio::test]
    async fn test_finishing_a_story_unlocks_the_next() {
        // Arrange
        let state = test_state(Mode::Production);
        let learner = LearnerId::new_v4();
        state
            .progress_store
            .initialize_progress(learner, StoryId(1))
            .await
            .unwrap();
        state
            .progress_store
            .advance_progress(learner, StoryId(1), 6, 1, Some(5))
            .await
            .unwrap();

        // Act
        let (_, json) = list(state, learner).await;

        // Assert
        assert_eq!(locked_flags(&json), vec![false, false, true, true, true]);
        assert_eq!(json[0]["completed_level"], 5);
    }

    #[tokio::test]
    async fn test_development_mode_only_honours_static_lock() {
        let (_, json) = list(test_state(Mode::Development), LearnerId::new_v4()).await;

        assert_eq!(locked_flags(&json), vec![false, false, false, false, true]);
    }

    #[tokio::test]
    async fn test_store_failure_returns_500() {
        let state = state_with(Arc::new(FailingEventRepository), Mode::Production);

        let (status, json) = list(state, LearnerId::new_v4()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "infrastructure_error");
    }
}
