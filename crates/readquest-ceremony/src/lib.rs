//! ReadQuest: Step sequencing and the level completion ceremony.
//!
//! A [`application::session::LevelSession`] walks the learner through the
//! steps of one level. When the last step is reported it hands over to a
//! [`application::orchestrator::CompletionOrchestrator`], which narrates,
//! reveals the recap cards, awards the level's points at most once,
//! advances progress and finally exposes where the learner goes next.

pub mod application;
pub mod domain;
pub mod media;
