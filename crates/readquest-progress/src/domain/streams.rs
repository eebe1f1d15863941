//! Deterministic event-stream identifiers.
//!
//! A progress record is keyed by (learner, story) and a ledger by learner,
//! so their aggregate ids are derived rather than generated.

use readquest_core::ids::{LearnerId, StoryId};
use uuid::Uuid;

const STREAM_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f_2c4e_9a0d_4f5b_8e27_31c9_d4a6_0f18);

/// Aggregate id of the progress record for `(learner_id, story_id)`.
#[must_use]
pub fn progress_stream_id(learner_id: LearnerId, story_id: StoryId) -> Uuid {
    Uuid::new_v5(
        &STREAM_NAMESPACE,
        format!("progress:{learner_id}:{story_id}").as_bytes(),
    )
}

/// Aggregate id of the points ledger for `learner_id`.
#[must_use]
pub fn ledger_stream_id(learner_id: LearnerId) -> Uuid {
    Uuid::new_v5(&STREAM_NAMESPACE, format!("ledger:{learner_id}").as_bytes())
}
