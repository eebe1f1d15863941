//! Identifier types shared across bounded contexts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies the active child user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearnerId(pub Uuid);

impl LearnerId {
    /// Generates a fresh learner identifier.
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for LearnerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Numeric catalog identifier of a story. Stories are ordered by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub u32);

impl StoryId {
    /// The story that is always open in production mode.
    pub const FIRST: Self = Self(1);

    /// Returns the id of the story immediately before this one, if any.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        self.0.checked_sub(1).filter(|id| *id > 0).map(Self)
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for StoryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_story_of_first_is_none() {
        assert_eq!(StoryId::FIRST.previous(), None);
        assert_eq!(StoryId(0).previous(), None);
    }

    #[test]
    fn test_previous_story_decrements_id() {
        assert_eq!(StoryId(4).previous(), Some(StoryId(3)));
    }

    #[test]
    fn test_story_id_serializes_as_plain_number() {
        let json = serde_json::to_value(StoryId(7)).unwrap();
        assert_eq!(json, serde_json::json!(7));
    }
}
