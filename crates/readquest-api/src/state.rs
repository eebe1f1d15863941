//! Shared application state.

use std::fmt;
use std::sync::{Arc, Mutex};

use readquest_catalog::{Catalog, UnlockPolicy};
use readquest_core::clock::Clock;
use readquest_core::repository::EventRepository;
use readquest_core::rng::DeterministicRng;
use readquest_progress::application::notifier::ProgressNotifier;
use readquest_progress::application::store::{EventSourcedProgressStore, ProgressStore};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for deterministic time.
    pub clock: Arc<dyn Clock>,
    /// RNG for word-search grids.
    pub rng: Arc<Mutex<dyn DeterministicRng>>,
    /// Event repository for persistence.
    pub event_repository: Arc<dyn EventRepository>,
    /// Progress and points store over `event_repository`.
    pub progress_store: Arc<dyn ProgressStore>,
    /// Story catalog.
    pub catalog: Arc<Catalog>,
    /// Lock rule derived from the configured mode.
    pub unlock_policy: UnlockPolicy,
    /// Broadcasts progress changes to listeners.
    pub notifier: ProgressNotifier,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("stories", &self.catalog.stories().len())
            .field("unlock_policy", &self.unlock_policy)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        rng: Arc<Mutex<dyn DeterministicRng>>,
        event_repository: Arc<dyn EventRepository>,
        catalog: Arc<Catalog>,
        unlock_policy: UnlockPolicy,
    ) -> Self {
        let progress_store = Arc::new(EventSourcedProgressStore::new(
            Arc::clone(&clock),
            Arc::clone(&event_repository),
        ));
        Self {
            clock,
            rng,
            event_repository,
            progress_store,
            catalog,
            unlock_policy,
            notifier: ProgressNotifier::new(),
        }
    }
}

#[cfg(test)]
pub(crate) fn state_with(
    event_repository: Arc<dyn EventRepository>,
    mode: readquest_catalog::Mode,
) -> AppState {
    use readquest_test_support::{FixedClock, MockRng, fixed_now};

    AppState::new(
        Arc::new(FixedClock(fixed_now())),
        Arc::new(Mutex::new(MockRng)),
        event_repository,
        Arc::new(Catalog::embedded().unwrap()),
        UnlockPolicy::new(mode),
    )
}

#[cfg(test)]
pub(crate) fn test_state(mode: readquest_catalog::Mode) -> AppState {
    state_with(
        Arc::new(readquest_test_support::InMemoryEventRepository::new()),
        mode,
    )
}
