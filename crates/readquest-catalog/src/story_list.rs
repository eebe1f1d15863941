//! The learner's story list and its unlock state.
//!
//! The view never caches an unlock answer across progress changes: every
//! [`ProgressUpdated`] for its learner triggers a re-read of the store and
//! a rebuild of the [`ReachabilityMap`].

use std::sync::{Arc, PoisonError, RwLock};

use readquest_core::error::DomainError;
use readquest_core::ids::{LearnerId, StoryId};
use readquest_progress::application::notifier::ProgressUpdated;
use readquest_progress::application::store::ProgressStore;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::catalog::Catalog;
use crate::unlock::{CompletionMap, ReachabilityMap, UnlockPolicy};

/// One row of the story list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryListing {
    /// Story identifier.
    pub id: StoryId,
    /// Display title.
    pub title: String,
    /// Number of levels.
    pub level_count: u32,
    /// Highest level the learner finished.
    pub completed_level: u32,
    /// Derived lock state.
    pub locked: bool,
}

#[derive(Debug, Default)]
struct Snapshot {
    completions: CompletionMap,
    reachability: ReachabilityMap,
}

/// Unlock state of every catalog story for one learner.
pub struct StoryListView {
    learner_id: LearnerId,
    catalog: Arc<Catalog>,
    policy: UnlockPolicy,
    store: Arc<dyn ProgressStore>,
    snapshot: RwLock<Snapshot>,
}

impl std::fmt::Debug for StoryListView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryListView")
            .field("learner_id", &self.learner_id)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl StoryListView {
    /// Creates an empty view; call [`StoryListView::refresh`] before reading.
    #[must_use]
    pub fn new(
        learner_id: LearnerId,
        catalog: Arc<Catalog>,
        policy: UnlockPolicy,
        store: Arc<dyn ProgressStore>,
    ) -> Self {
        Self {
            learner_id,
            catalog,
            policy,
            store,
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    /// Re-reads the learner's progress for every catalog story and
    /// rebuilds the reachability map.
    ///
    /// # Errors
    ///
    /// Propagates the first store failure; the previous snapshot is kept.
    #[instrument(skip(self), fields(learner_id = %self.learner_id))]
    pub async fn refresh(&self) -> Result<ReachabilityMap, DomainError> {
        let mut completions = CompletionMap::new();
        for story in self.catalog.stories() {
            if let Some(record) = self.store.read_progress(self.learner_id, story.id).await? {
                completions.set(story.id, record.completed_level);
            }
        }
        let reachability = ReachabilityMap::build(&self.catalog, &completions, self.policy);

        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.completions = completions;
        snapshot.reachability = reachability.clone();
        debug!("story list refreshed");
        Ok(reachability)
    }

    /// The current reachability map.
    #[must_use]
    pub fn reachability(&self) -> ReachabilityMap {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .reachability
            .clone()
    }

    /// The catalog joined with the learner's completion and lock state.
    #[must_use]
    pub fn listings(&self) -> Vec<StoryListing> {
        let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        self.catalog
            .stories()
            .iter()
            .map(|story| StoryListing {
                id: story.id,
                title: story.title.clone(),
                level_count: story.level_count,
                completed_level: snapshot.completions.completed_level(story.id),
                locked: snapshot.reachability.is_locked(story.id),
            })
            .collect()
    }

    /// Handles one notification; updates for other learners are ignored.
    /// Returns whether a refresh happened.
    pub async fn on_progress_updated(&self, update: &ProgressUpdated) -> bool {
        if update.learner_id != self.learner_id {
            return false;
        }
        match self.refresh().await {
            Ok(_) => true,
            Err(error) => {
                warn!(%error, story_id = %update.story_id, "story list refresh failed");
                false
            }
        }
    }

    /// Keeps the view current until the notification channel closes.
    pub fn spawn(self: Arc<Self>, mut updates: broadcast::Receiver<ProgressUpdated>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(update) => {
                        self.on_progress_updated(&update).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "story list lagged behind progress updates");
                        if let Err(error) = self.refresh().await {
                            warn!(%error, "story list refresh failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!(learner_id = %self.learner_id, "progress notifications closed");
                        break;
                    }
                }
            }
        })
    }
}
