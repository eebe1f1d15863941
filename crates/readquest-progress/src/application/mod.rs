//! Application services for the Progress & Points context.

pub mod command_handlers;
pub mod notifier;
pub mod query_handlers;
pub mod store;
