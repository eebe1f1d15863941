//! The level completion ceremony.
//!
//! One [`CompletionOrchestrator`] runs at most one ceremony. The ceremony
//! task narrates, reveals the recap cards on the [`RevealSchedule`], awards
//! the level's points once the award offset has elapsed, advances progress
//! and finally publishes the next [`NavigationTarget`].
//!
//! Persistence failures are logged and published as events; they never
//! stop the ceremony. Abandoning before the award cancels the remaining
//! timers and skips both writes. Once the award has begun, both writes run
//! to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use readquest_core::error::DomainError;
use readquest_core::ids::{LearnerId, StoryId};
use readquest_progress::application::notifier::{ProgressNotifier, ProgressUpdated};
use readquest_progress::application::store::ProgressStore;
use readquest_progress::domain::aggregates::LedgerEntry;
use readquest_scoring::{level_award_reason, points_for_level};
use tokio::sync::{broadcast, watch};
use tokio::time::{self, Instant};
use tracing::{debug, info, instrument, warn};

use crate::domain::events::{CeremonyEvent, CeremonyState};
use crate::domain::navigation::NavigationTarget;
use crate::domain::schedule::{RevealSchedule, recap_cards};
use crate::domain::sequencer::StepPayload;
use crate::media::{AudioBus, AudioSignal, NarrationPlayer, OwnedPlayback, level_narration_asset};

const EVENT_CAPACITY: usize = 32;

/// The level a ceremony celebrates.
#[derive(Debug, Clone, PartialEq)]
pub struct CeremonyContext {
    /// The learner.
    pub learner_id: LearnerId,
    /// The story.
    pub story_id: StoryId,
    /// The level just finished.
    pub level: u32,
    /// Steps the level had.
    pub step_count: u32,
    /// Whether `level` is the story's last.
    pub is_final_level: bool,
    /// What each step reported, in step order.
    pub payloads: Vec<StepPayload>,
}

/// Collaborators shared by every ceremony.
#[derive(Clone)]
pub struct CeremonyServices {
    /// Progress and points persistence.
    pub store: Arc<dyn ProgressStore>,
    /// Narration playback.
    pub player: Arc<dyn NarrationPlayer>,
    /// Receives a notification after each successful advance.
    pub notifier: ProgressNotifier,
    /// Global stop-all-audio signal.
    pub audio_bus: AudioBus,
    /// Reveal and award timing.
    pub schedule: RevealSchedule,
}

impl std::fmt::Debug for CeremonyServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CeremonyServices")
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

/// Answer to a level-completed signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The ceremony began.
    Started,
    /// A ceremony already ran or is running on this instance.
    AlreadyStarted,
    /// The instance was abandoned before the signal arrived.
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AwardGuard {
    Unset,
    InFlight,
    Awarded,
}

struct Inner {
    context: CeremonyContext,
    services: CeremonyServices,
    started: AtomicBool,
    award_due: AtomicBool,
    guard: Mutex<AwardGuard>,
    state: watch::Sender<CeremonyState>,
    cancel: watch::Sender<bool>,
    events: broadcast::Sender<CeremonyEvent>,
    playback: Mutex<OwnedPlayback>,
}

/// Runs the completion ceremony for one finished level.
///
/// Dropping the orchestrator abandons the ceremony and stops its narration.
pub struct CompletionOrchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CompletionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionOrchestrator")
            .field("context", &self.inner.context)
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl CompletionOrchestrator {
    /// An idle orchestrator for `context`.
    #[must_use]
    pub fn new(context: CeremonyContext, services: CeremonyServices) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                context,
                services,
                started: AtomicBool::new(false),
                award_due: AtomicBool::new(false),
                guard: Mutex::new(AwardGuard::Unset),
                state: watch::Sender::new(CeremonyState::Idle),
                cancel: watch::Sender::new(false),
                events,
                playback: Mutex::new(OwnedPlayback::default()),
            }),
        }
    }

    /// The level being celebrated.
    #[must_use]
    pub fn context(&self) -> &CeremonyContext {
        &self.inner.context
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CeremonyState {
        self.inner.state.borrow().clone()
    }

    /// Watches state changes.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<CeremonyState> {
        self.inner.state.subscribe()
    }

    /// Subscribes to ceremony events published from now on.
    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<CeremonyEvent> {
        self.inner.events.subscribe()
    }

    /// The next target once the ceremony is `Ready`.
    #[must_use]
    pub fn next_target(&self) -> Option<NavigationTarget> {
        match &*self.inner.state.borrow() {
            CeremonyState::Ready { target } => Some(*target),
            _ => None,
        }
    }

    /// Handles the level-completed signal. Only the first call starts the
    /// ceremony; later calls change nothing.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn signal_level_completed(&self) -> StartOutcome {
        if *self.inner.cancel.borrow() {
            return StartOutcome::Abandoned;
        }
        if self.inner.started.swap(true, Ordering::SeqCst) {
            debug!(level = self.inner.context.level, "ceremony already started");
            return StartOutcome::AlreadyStarted;
        }
        tokio::spawn(Inner::run(Arc::clone(&self.inner)));
        StartOutcome::Started
    }

    /// Waits until the ceremony is `Ready` or `Abandoned`.
    pub async fn settled(&self) -> CeremonyState {
        let mut state = self.inner.state.subscribe();
        match state.wait_for(CeremonyState::is_terminal).await {
            Ok(current) => current.clone(),
            Err(_) => self.state(),
        }
    }

    /// Re-attempts a failed award. Returns `Ok(None)` without writing when
    /// the award is already done, in flight, or not yet due.
    ///
    /// # Errors
    ///
    /// Returns the store failure; the guard stays unset so a later retry
    /// may succeed.
    pub async fn retry_award(&self) -> Result<Option<LedgerEntry>, DomainError> {
        if !self.inner.award_due.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.award_once().await
    }

    /// Abandons the ceremony and stops its narration. Also serves as the
    /// explicit teardown; calling it again is harmless.
    pub fn abandon(&self) {
        self.inner.cancel.send_replace(true);
        self.inner.release_playback();
        if !self.inner.started.swap(true, Ordering::SeqCst) {
            self.inner.finish_abandoned();
        }
    }
}

impl Drop for CompletionOrchestrator {
    fn drop(&mut self) {
        self.abandon();
    }
}

impl Inner {
    #[instrument(skip_all, fields(
        learner_id = %self.context.learner_id,
        story_id = %self.context.story_id,
        level = self.context.level,
    ))]
    async fn run(self: Arc<Self>) {
        let context = &self.context;
        let schedule = self.services.schedule;
        let started_at = Instant::now();
        let mut cancel = self.cancel.subscribe();
        self.watch_audio_bus();

        self.state.send_replace(CeremonyState::Narrating);
        info!(payloads = context.payloads.len(), "ceremony started");
        self.start_narration().await;

        let amount = points_for_level(context.level, context.step_count);
        let target =
            NavigationTarget::after_level(context.story_id, context.level, context.is_final_level);
        let cards = recap_cards(context.level, context.step_count, amount, target);

        self.state.send_replace(CeremonyState::Revealing { revealed: 0 });
        for (index, (offset, card)) in schedule.reveals().iter().zip(cards).enumerate() {
            if !sleep_unless_cancelled(started_at + *offset, &mut cancel).await {
                self.finish_abandoned();
                return;
            }
            self.publish(CeremonyEvent::CardRevealed { index, card });
            self.state
                .send_replace(CeremonyState::Revealing { revealed: index + 1 });
        }

        if !sleep_unless_cancelled(started_at + schedule.award_at(), &mut cancel).await {
            self.finish_abandoned();
            return;
        }

        self.state.send_replace(CeremonyState::Awarding);
        self.award_due.store(true, Ordering::SeqCst);
        // Failures are already logged and published.
        let _ = self.award_once().await;

        self.state.send_replace(CeremonyState::Advancing);
        self.advance().await;

        if *cancel.borrow() {
            self.finish_abandoned();
            return;
        }
        self.state.send_replace(CeremonyState::Ready { target });
        self.publish(CeremonyEvent::Ready { target });
        info!(%target, "ceremony ready");
    }

    async fn start_narration(&self) {
        let asset = level_narration_asset(self.context.level);
        match self.services.player.play(&asset).await {
            Ok(handle) => {
                let mut playback = self.playback.lock().unwrap_or_else(PoisonError::into_inner);
                if *self.cancel.borrow() {
                    handle.stop();
                    return;
                }
                playback.replace(handle);
                drop(playback);
                self.publish(CeremonyEvent::NarrationStarted { asset });
            }
            Err(error) => {
                warn!(%error, %asset, "narration unavailable; continuing without audio");
                self.publish(CeremonyEvent::NarrationUnavailable {
                    asset,
                    reason: error.to_string(),
                });
            }
        }
    }

    async fn award_once(&self) -> Result<Option<LedgerEntry>, DomainError> {
        {
            let mut guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
            if *guard != AwardGuard::Unset {
                debug!(guard = ?*guard, "award skipped");
                return Ok(None);
            }
            *guard = AwardGuard::InFlight;
        }

        let context = &self.context;
        let amount = i64::from(points_for_level(context.level, context.step_count));
        let result = self
            .services
            .store
            .award_points(
                context.learner_id,
                context.story_id,
                amount,
                &level_award_reason(context.level),
            )
            .await;

        let settled = match &result {
            Ok(_) => AwardGuard::Awarded,
            Err(_) => AwardGuard::Unset,
        };
        *self.guard.lock().unwrap_or_else(PoisonError::into_inner) = settled;

        match result {
            Ok(entry) => {
                info!(amount, entry_id = %entry.entry_id, "level points awarded");
                self.publish(CeremonyEvent::PointsAwarded {
                    entry_id: entry.entry_id,
                    amount,
                });
                Ok(Some(entry))
            }
            Err(error) => {
                warn!(%error, amount, "level award failed");
                self.publish(CeremonyEvent::AwardFailed {
                    reason: error.to_string(),
                });
                Err(error)
            }
        }
    }

    async fn advance(&self) {
        let context = &self.context;
        let result = self
            .services
            .store
            .advance_progress(
                context.learner_id,
                context.story_id,
                context.level + 1,
                1,
                Some(context.level),
            )
            .await;

        match result {
            Ok(record) => {
                self.services.notifier.publish(ProgressUpdated::from(&record));
                info!(
                    current_level = record.current_level,
                    completed_level = record.completed_level,
                    "progress advanced"
                );
                self.publish(CeremonyEvent::ProgressAdvanced {
                    current_level: record.current_level,
                    completed_level: record.completed_level,
                });
            }
            Err(error) => {
                warn!(%error, "progress advance failed");
                self.publish(CeremonyEvent::AdvanceFailed {
                    reason: error.to_string(),
                });
            }
        }
    }

    fn watch_audio_bus(self: &Arc<Self>) {
        let inner: Weak<Self> = Arc::downgrade(self);
        let mut audio = self.services.audio_bus.subscribe();
        let mut cancel = self.cancel.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancelled(&mut cancel) => break,
                    signal = audio.recv() => match signal {
                        Ok(AudioSignal::StopAll) | Err(broadcast::error::RecvError::Lagged(_)) => {
                            let Some(inner) = inner.upgrade() else { break };
                            inner.release_playback();
                            debug!("narration stopped by stop-all");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });
    }

    fn release_playback(&self) {
        self.playback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .release();
    }

    fn finish_abandoned(&self) {
        self.release_playback();
        self.state.send_replace(CeremonyState::Abandoned);
        self.publish(CeremonyEvent::Abandoned);
        info!(level = self.context.level, "ceremony abandoned");
    }

    fn publish(&self, event: CeremonyEvent) {
        if self.events.send(event).is_err() {
            debug!("no ceremony event listeners");
        }
    }
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|cancelled| *cancelled).await;
}

/// Sleeps until `deadline`; returns `false` if cancelled first.
async fn sleep_unless_cancelled(deadline: Instant, cancel: &mut watch::Receiver<bool>) -> bool {
    if *cancel.borrow() {
        return false;
    }
    tokio::select! {
        biased;
        () = cancelled(cancel) => false,
        () = time::sleep_until(deadline) => true,
    }
}
