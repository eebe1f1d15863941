//! Domain layer for the Ceremony context.

pub mod events;
pub mod navigation;
pub mod schedule;
pub mod sequencer;
