//! The static story catalog.

use std::collections::HashSet;
use std::path::Path;

use readquest_core::ids::StoryId;
use serde::{Deserialize, Serialize};

/// Level count assumed for a story that is not in the catalog.
pub const DEFAULT_LEVEL_COUNT: u32 = 5;

const EMBEDDED_CATALOG: &str = include_str!("../data/catalog.yaml");

/// Errors raised while loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The YAML did not match the catalog schema.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The catalog parsed but is inconsistent.
    #[error("invalid catalog: {0}")]
    Invalid(String),
}

/// One learner-facing activity inside a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Story introduction.
    Intro,
    /// The narrator reads the page aloud.
    ModelReading,
    /// The learner reads against a timer.
    TimedReading,
    /// Questions about the text.
    Comprehension,
    /// Mini-game reward.
    Reward,
}

/// The ordered steps of one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelPlan {
    /// 1-based level number.
    pub level: u32,
    /// Steps in the order they are presented.
    pub steps: Vec<StepKind>,
}

impl LevelPlan {
    /// The plan used when the catalog does not list one: four steps for
    /// the first two levels, comprehension added from level 3 on.
    #[must_use]
    pub fn standard(level: u32) -> Self {
        let steps = if level <= 2 {
            vec![
                StepKind::Intro,
                StepKind::ModelReading,
                StepKind::TimedReading,
                StepKind::Reward,
            ]
        } else {
            vec![
                StepKind::Intro,
                StepKind::ModelReading,
                StepKind::TimedReading,
                StepKind::Comprehension,
                StepKind::Reward,
            ]
        };
        Self { level, steps }
    }

    /// Number of steps in the level.
    #[must_use]
    pub fn step_count(&self) -> u32 {
        u32::try_from(self.steps.len()).unwrap_or(u32::MAX)
    }
}

fn default_level_count() -> u32 {
    DEFAULT_LEVEL_COUNT
}

/// A catalog entry. Immutable at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Story identifier.
    pub id: StoryId,
    /// Display title.
    pub title: String,
    /// Number of levels; the last level is `level_count`.
    #[serde(default = "default_level_count")]
    pub level_count: u32,
    /// Editorial lock, independent of learner progress.
    #[serde(default)]
    pub locked: bool,
    /// Explicit level plans; missing levels use [`LevelPlan::standard`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub levels: Vec<LevelPlan>,
    /// Words offered to the word-search game.
    #[serde(default)]
    pub vocabulary: Vec<String>,
}

impl Story {
    /// The plan for `level`.
    #[must_use]
    pub fn plan(&self, level: u32) -> LevelPlan {
        self.levels
            .iter()
            .find(|plan| plan.level == level)
            .cloned()
            .unwrap_or_else(|| LevelPlan::standard(level))
    }

    /// Whether `level` is the story's last level.
    #[must_use]
    pub fn is_final_level(&self, level: u32) -> bool {
        level >= self.level_count
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    stories: Vec<Story>,
}

/// The ordered set of stories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    stories: Vec<Story>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate ids, id 0 and stories
    /// without levels. Stories are kept sorted by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` on the first inconsistency.
    pub fn new(mut stories: Vec<Story>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for story in &stories {
            if story.id.0 == 0 {
                return Err(CatalogError::Invalid("story id 0 is reserved".to_owned()));
            }
            if story.level_count == 0 {
                return Err(CatalogError::Invalid(format!(
                    "story {} has no levels",
                    story.id
                )));
            }
            if !seen.insert(story.id) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate story id {}",
                    story.id
                )));
            }
            if let Some(plan) = story.levels.iter().find(|plan| plan.steps.is_empty()) {
                return Err(CatalogError::Invalid(format!(
                    "story {} level {} has no steps",
                    story.id, plan.level
                )));
            }
        }
        stories.sort_by_key(|story| story.id);
        Ok(Self { stories })
    }

    /// Parses a catalog document.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for malformed YAML, or
    /// `CatalogError::Invalid` for inconsistent content.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        Self::new(file.stories)
    }

    /// Reads and parses a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` if the file cannot be read, otherwise
    /// as [`Catalog::from_yaml`].
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// The catalog compiled into the binary.
    ///
    /// # Errors
    ///
    /// Only if the bundled document is broken.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_yaml(EMBEDDED_CATALOG)
    }

    /// All stories in id order.
    #[must_use]
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    /// Looks up one story.
    #[must_use]
    pub fn story(&self, id: StoryId) -> Option<&Story> {
        self.stories
            .binary_search_by_key(&id, |story| story.id)
            .ok()
            .map(|index| &self.stories[index])
    }

    /// The final level of `id`, or [`DEFAULT_LEVEL_COUNT`] when the story
    /// is unknown.
    #[must_use]
    pub fn final_level(&self, id: StoryId) -> u32 {
        self.story(id)
            .map_or(DEFAULT_LEVEL_COUNT, |story| story.level_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_parses() {
        let catalog = Catalog::embedded().unwrap();

        assert!(!catalog.stories().is_empty());
        assert_eq!(catalog.stories()[0].id, StoryId(1));
        assert!(catalog.stories().iter().all(|story| story.level_count == 5));
    }

    #[test]
    fn test_embedded_catalog_holds_back_only_the_unpublished_story() {
        let catalog = Catalog::embedded().unwrap();

        let locked: Vec<StoryId> = catalog
            .stories()
            .iter()
            .filter(|story| story.locked)
            .map(|story| story.id)
            .collect();

        assert_eq!(locked, vec![StoryId(5)]);
    }

    #[test]
    fn test_defaults_are_applied_for_missing_fields() {
        let catalog = Catalog::from_yaml("stories:\n  - id: 7\n    title: Tek\n").unwrap();

        let story = catalog.story(StoryId(7)).unwrap();
        assert_eq!(story.level_count, 5);
        assert!(!story.locked);
        assert!(story.vocabulary.is_empty());
    }

    #[test]
    fn test_stories_are_sorted_by_id() {
        let yaml = "stories:\n  - {id: 3, title: C}\n  - {id: 1, title: A}\n  - {id: 2, title: B}\n";

        let catalog = Catalog::from_yaml(yaml).unwrap();

        let ids: Vec<u32> = catalog.stories().iter().map(|story| story.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let yaml = "stories:\n  - {id: 1, title: A}\n  - {id: 1, title: B}\n";

        let result = Catalog::from_yaml(yaml);

        assert!(matches!(result, Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn test_zero_level_count_is_rejected() {
        let result = Catalog::from_yaml("stories:\n  - {id: 1, title: A, level_count: 0}\n");

        assert!(matches!(result, Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn test_malformed_yaml_is_a_parse_error() {
        let result = Catalog::from_yaml("stories: [ {id: one} ]");

        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_standard_plans_by_level() {
        assert_eq!(LevelPlan::standard(1).step_count(), 4);
        assert_eq!(LevelPlan::standard(2).step_count(), 4);
        assert_eq!(LevelPlan::standard(3).step_count(), 5);
        assert_eq!(
            LevelPlan::standard(5).steps[3],
            StepKind::Comprehension
        );
    }

    #[test]
    fn test_explicit_plan_overrides_standard() {
        let yaml = "stories:\n  - id: 1\n    title: A\n    levels:\n      - level: 2\n        steps: [intro, reward]\n";
        let catalog = Catalog::from_yaml(yaml).unwrap();
        let story = catalog.story(StoryId(1)).unwrap();

        assert_eq!(story.plan(2).steps, vec![StepKind::Intro, StepKind::Reward]);
        assert_eq!(story.plan(1).step_count(), 4);
    }

    #[test]
    fn test_final_level_defaults_for_unknown_story() {
        let catalog = Catalog::from_yaml("stories:\n  - {id: 1, title: A, level_count: 3}\n").unwrap();

        assert_eq!(catalog.final_level(StoryId(1)), 3);
        assert_eq!(catalog.final_level(StoryId(9)), DEFAULT_LEVEL_COUNT);
        assert!(catalog.story(StoryId(1)).unwrap().is_final_level(3));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let result = Catalog::load(Path::new("/nonexistent/readquest/catalog.yaml"));

        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }
}
