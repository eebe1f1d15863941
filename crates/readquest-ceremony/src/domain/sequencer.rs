//! Per-level step controller.
//!
//! Holds no persisted state. Cancelling discards everything recorded so far.

use readquest_catalog::{LevelPlan, StepKind};
use readquest_core::error::DomainError;
use serde_json::Value;

/// Opaque data a step view reports when it finishes.
pub type StepPayload = Value;

/// Where the sequencer is within its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// `start` has not been called.
    NotStarted,
    /// Waiting for step `step_index` (1-based) to be reported.
    InProgress {
        /// Current step.
        step_index: u32,
    },
    /// Every step was reported.
    Completed,
}

/// Everything the ceremony needs from a finished level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelCompletion {
    /// The level just finished.
    pub level: u32,
    /// How many steps the level had.
    pub step_count: u32,
    /// One payload per step, in step order.
    pub payloads: Vec<StepPayload>,
}

/// Result of reporting a step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Another step follows.
    Next {
        /// 1-based index of the new current step.
        step_index: u32,
        /// Kind of the new current step.
        kind: StepKind,
    },
    /// That was the last step.
    LevelCompleted(LevelCompletion),
}

/// Walks the ordered steps of one level.
#[derive(Debug, Clone)]
pub struct StepSequencer {
    plan: LevelPlan,
    state: SequencerState,
    payloads: Vec<StepPayload>,
}

impl StepSequencer {
    /// A sequencer for `plan`, not yet started.
    #[must_use]
    pub fn new(plan: LevelPlan) -> Self {
        Self {
            plan,
            state: SequencerState::NotStarted,
            payloads: Vec::new(),
        }
    }

    /// The level being sequenced.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.plan.level
    }

    /// Number of steps in the level.
    #[must_use]
    pub fn step_count(&self) -> u32 {
        self.plan.step_count()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Kind of the step the learner is on, if in progress.
    #[must_use]
    pub fn current_step(&self) -> Option<StepKind> {
        match self.state {
            SequencerState::InProgress { step_index } => self.kind_at(step_index),
            _ => None,
        }
    }

    /// Moves to step 1.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if already started or the plan is
    /// empty.
    pub fn start(&mut self) -> Result<StepKind, DomainError> {
        if self.state != SequencerState::NotStarted {
            return Err(DomainError::Validation(format!(
                "level {} already started",
                self.plan.level
            )));
        }
        let kind = self.kind_at(1).ok_or_else(|| {
            DomainError::Validation(format!("level {} has no steps", self.plan.level))
        })?;
        self.state = SequencerState::InProgress { step_index: 1 };
        Ok(kind)
    }

    /// Records the current step's payload and advances.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless the sequencer is in progress.
    pub fn complete_step(&mut self, payload: StepPayload) -> Result<StepOutcome, DomainError> {
        let SequencerState::InProgress { step_index } = self.state else {
            return Err(DomainError::Validation(format!(
                "level {} is not in progress",
                self.plan.level
            )));
        };
        self.payloads.push(payload);

        let next = step_index + 1;
        if let Some(kind) = self.kind_at(next) {
            self.state = SequencerState::InProgress { step_index: next };
            return Ok(StepOutcome::Next {
                step_index: next,
                kind,
            });
        }

        self.state = SequencerState::Completed;
        Ok(StepOutcome::LevelCompleted(LevelCompletion {
            level: self.plan.level,
            step_count: self.plan.step_count(),
            payloads: std::mem::take(&mut self.payloads),
        }))
    }

    /// Discards recorded payloads and returns to `NotStarted`.
    pub fn cancel(&mut self) {
        self.payloads.clear();
        self.state = SequencerState::NotStarted;
    }

    fn kind_at(&self, step_index: u32) -> Option<StepKind> {
        let index = usize::try_from(step_index).ok()?.checked_sub(1)?;
        self.plan.steps.get(index).copied()
    }
}
