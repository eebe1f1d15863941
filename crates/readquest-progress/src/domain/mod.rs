//! Domain model for the Progress & Points context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod streams;
