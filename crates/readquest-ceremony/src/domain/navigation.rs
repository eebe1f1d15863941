//! Where the learner goes once the ceremony is over.

use std::fmt;

use readquest_core::ids::StoryId;
use serde::{Serialize, Serializer};

/// The next navigable location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTarget {
    /// First step of another level.
    Level {
        /// Level number.
        level: u32,
        /// Step number.
        step: u32,
    },
    /// The story's closing screen.
    StoryComplete {
        /// The finished story.
        story_id: StoryId,
    },
}

impl NavigationTarget {
    /// Target after finishing `level` of `story_id`.
    #[must_use]
    pub fn after_level(story_id: StoryId, level: u32, is_final_level: bool) -> Self {
        if is_final_level {
            Self::StoryComplete { story_id }
        } else {
            Self::Level {
                level: level + 1,
                step: 1,
            }
        }
    }

    /// Route path of the target.
    #[must_use]
    pub fn path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level { level, step } => write!(f, "/level/{level}/step/{step}"),
            Self::StoryComplete { story_id } => write!(f, "/stories/{story_id}/complete"),
        }
    }
}

impl Serialize for NavigationTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
