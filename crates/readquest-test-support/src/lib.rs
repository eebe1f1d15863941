//! Shared test mocks and utilities for the ReadQuest engine.

mod clock;
mod repository;
mod rng;

pub use clock::{FixedClock, fixed_now};
pub use repository::{
    EmptyEventRepository, FailingEventRepository, InMemoryEventRepository,
    RecordingEventRepository,
};
pub use rng::{CyclingRng, MockRng, SequenceRng};
