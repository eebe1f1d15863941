//! ReadQuest: Progress & Points bounded context.
//!
//! Owns the learner's position inside each story and the append-only
//! points ledger. [`application::store::ProgressStore`] is the only way
//! other contexts read or write this state.

pub mod application;
pub mod domain;
