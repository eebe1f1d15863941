//! One learner playing through one level.
//!
//! Connects the [`StepSequencer`] to a [`CompletionOrchestrator`]: the
//! last reported step starts the ceremony.

use readquest_catalog::{StepKind, Story};
use readquest_core::error::DomainError;
use readquest_core::ids::{LearnerId, StoryId};
use tracing::{info, instrument};

use super::orchestrator::{CeremonyContext, CeremonyServices, CompletionOrchestrator, StartOutcome};
use crate::domain::sequencer::{StepOutcome, StepPayload, StepSequencer};

/// What happened after a step was reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// The learner moves on to another step.
    Step {
        /// 1-based index of the new step.
        step_index: u32,
        /// Its kind.
        kind: StepKind,
    },
    /// The level is finished and its ceremony is running.
    CeremonyStarted,
}

/// Drives one level from its first step to its completion ceremony.
#[derive(Debug)]
pub struct LevelSession {
    learner_id: LearnerId,
    story_id: StoryId,
    is_final_level: bool,
    sequencer: StepSequencer,
    services: CeremonyServices,
    orchestrator: Option<CompletionOrchestrator>,
}

impl LevelSession {
    /// A session for `level` of `story`.
    #[must_use]
    pub fn new(learner_id: LearnerId, story: &Story, level: u32, services: CeremonyServices) -> Self {
        Self {
            learner_id,
            story_id: story.id,
            is_final_level: story.is_final_level(level),
            sequencer: StepSequencer::new(story.plan(level)),
            services,
            orchestrator: None,
        }
    }

    /// Opens `story` at the learner's current level, creating their
    /// progress record on first visit.
    ///
    /// # Errors
    ///
    /// Propagates store failures. Returns `DomainError::Validation` when
    /// every level of the story is already finished.
    #[instrument(skip(story, services), fields(story_id = %story.id))]
    pub async fn open(
        learner_id: LearnerId,
        story: &Story,
        services: CeremonyServices,
    ) -> Result<Self, DomainError> {
        let record = match services.store.read_progress(learner_id, story.id).await? {
            Some(record) => record,
            None => services.store.initialize_progress(learner_id, story.id).await?,
        };
        if record.current_level > story.level_count {
            return Err(DomainError::Validation(format!(
                "story {} is already complete",
                story.id
            )));
        }
        info!(level = record.current_level, "level session opened");
        Ok(Self::new(learner_id, story, record.current_level, services))
    }

    /// The level being played.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.sequencer.level()
    }

    /// The step the learner is on.
    #[must_use]
    pub fn current_step(&self) -> Option<StepKind> {
        self.sequencer.current_step()
    }

    /// Shows the first step.
    ///
    /// # Errors
    ///
    /// As [`StepSequencer::start`].
    pub fn start(&mut self) -> Result<StepKind, DomainError> {
        self.sequencer.start()
    }

    /// Reports the current step as finished. After the last step the
    /// completion ceremony is signalled.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless a step is in progress.
    ///
    /// # Panics
    ///
    /// Panics outside a Tokio runtime when the ceremony starts.
    pub fn complete_step(&mut self, payload: StepPayload) -> Result<SessionUpdate, DomainError> {
        match self.sequencer.complete_step(payload)? {
            StepOutcome::Next { step_index, kind } => Ok(SessionUpdate::Step { step_index, kind }),
            StepOutcome::LevelCompleted(completion) => {
                let orchestrator = CompletionOrchestrator::new(
                    CeremonyContext {
                        learner_id: self.learner_id,
                        story_id: self.story_id,
                        level: completion.level,
                        step_count: completion.step_count,
                        is_final_level: self.is_final_level,
                        payloads: completion.payloads,
                    },
                    self.services.clone(),
                );
                let outcome = orchestrator.signal_level_completed();
                debug_assert_eq!(outcome, StartOutcome::Started);
                self.orchestrator = Some(orchestrator);
                Ok(SessionUpdate::CeremonyStarted)
            }
        }
    }

    /// The ceremony, once the level is finished.
    #[must_use]
    pub fn orchestrator(&self) -> Option<&CompletionOrchestrator> {
        self.orchestrator.as_ref()
    }

    /// Navigating away. Mid-level this discards the step payloads and the
    /// level can be started again; once the ceremony exists it is abandoned
    /// and the level stays finished for this session.
    pub fn abandon(&mut self) {
        match &self.orchestrator {
            Some(orchestrator) => orchestrator.abandon(),
            None => self.sequencer.cancel(),
        }
    }
}
