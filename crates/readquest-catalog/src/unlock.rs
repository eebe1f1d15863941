//! The sequential unlock policy.

use std::collections::{BTreeMap, HashMap};

use readquest_core::ids::StoryId;
use readquest_progress::domain::aggregates::ProgressRecord;
use serde::Serialize;

use crate::catalog::{Catalog, Story};
use crate::mode::Mode;

/// Highest completed level per story for one learner. Stories never
/// opened are absent and count as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionMap(HashMap<StoryId, u32>);

impl CompletionMap {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the completed level of one story.
    pub fn set(&mut self, story_id: StoryId, completed_level: u32) {
        self.0.insert(story_id, completed_level);
    }

    /// Completed level of `story_id`, 0 if unknown.
    #[must_use]
    pub fn completed_level(&self, story_id: StoryId) -> u32 {
        self.0.get(&story_id).copied().unwrap_or(0)
    }
}

impl<'a> FromIterator<&'a ProgressRecord> for CompletionMap {
    fn from_iter<I: IntoIterator<Item = &'a ProgressRecord>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|record| (record.story_id, record.completed_level))
                .collect(),
        )
    }
}

impl FromIterator<(StoryId, u32)> for CompletionMap {
    fn from_iter<I: IntoIterator<Item = (StoryId, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Decides whether a story is accessible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockPolicy {
    mode: Mode,
}

impl UnlockPolicy {
    /// A policy for `mode`.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    /// The mode this policy was built for.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Editorial lock wins in every mode. In production a story other than
    /// the first opens only once its predecessor's final level is done.
    #[must_use]
    pub fn is_locked(&self, story: &Story, completions: &CompletionMap, catalog: &Catalog) -> bool {
        if story.locked {
            return true;
        }
        if self.mode == Mode::Development || story.id <= StoryId::FIRST {
            return false;
        }
        match story.id.previous() {
            Some(previous) => completions.completed_level(previous) < catalog.final_level(previous),
            None => false,
        }
    }
}

/// Precomputed `story → locked` for a whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReachabilityMap(BTreeMap<StoryId, bool>);

impl ReachabilityMap {
    /// Evaluates the policy for every story in `catalog`.
    #[must_use]
    pub fn build(catalog: &Catalog, completions: &CompletionMap, policy: UnlockPolicy) -> Self {
        Self(
            catalog
                .stories()
                .iter()
                .map(|story| (story.id, policy.is_locked(story, completions, catalog)))
                .collect(),
        )
    }

    /// Whether `story_id` is locked. Unknown stories are locked.
    #[must_use]
    pub fn is_locked(&self, story_id: StoryId) -> bool {
        self.0.get(&story_id).copied().unwrap_or(true)
    }

    /// Stories currently reachable, in id order.
    pub fn unlocked(&self) -> impl Iterator<Item = StoryId> + '_ {
        self.0
            .iter()
            .filter(|(_, locked)| !**locked)
            .map(|(id, _)| *id)
    }
}
