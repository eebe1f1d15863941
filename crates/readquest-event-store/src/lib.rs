//! ReadQuest: PostgreSQL event store.
//!
//! Implements [`readquest_core::repository::EventRepository`] on a single
//! `domain_events` table. The schema ships as embedded migrations.

pub mod migrations;
pub mod pg_event_repository;

pub use migrations::run_migrations;
pub use pg_event_repository::PgEventRepository;
