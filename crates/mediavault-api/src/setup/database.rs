//! Database pool creation and migrations.

use anyhow::{Context, Result};
use mediavault_core::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;

pub async fn initialize_database(config: &Config) -> Result<PgPool> {
    tracing::info!(
        max_connections = config.db_max_connections,
        "Connecting to database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../mediavault-db/migrations");
    sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    tracing::info!("Database ready");
    Ok(pool)
}
