//! Embedded schema migrations.

use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Applies any pending migrations.
///
/// # Errors
///
/// Returns the migrator's error if a migration fails or the recorded
/// history does not match the embedded files.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}
