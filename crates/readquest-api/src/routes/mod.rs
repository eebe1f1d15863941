//! Route modules organized by bounded context.

pub mod games;
pub mod health;
pub mod points;
pub mod progress;
pub mod stories;
