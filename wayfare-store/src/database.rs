use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::StoreError;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Unique-key violations become `Conflict` so callers can retry with a new
/// reference; everything else is opaque.
pub(crate) fn map_db_error(err: sqlx::Error) -> wayfare_core::CoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            wayfare_core::CoreError::Conflict(db_err.message().to_string())
        }
        _ => wayfare_core::CoreError::InternalError(err.to_string()),
    }
}
