//! ReadQuest: Story catalog and unlock policy.
//!
//! The catalog is static data loaded from YAML. Which stories a learner
//! may open is derived from their progress and the runtime [`mode::Mode`].

pub mod catalog;
pub mod mode;
pub mod story_list;
pub mod unlock;

pub use catalog::{Catalog, CatalogError, LevelPlan, StepKind, Story};
pub use mode::{Mode, ParseModeError};
pub use story_list::{StoryListView, StoryListing};
pub use unlock::{CompletionMap, ReachabilityMap, UnlockPolicy};
