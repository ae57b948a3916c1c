//! Postgres persistence for bookings, enabled with the `database` feature.

pub mod booking_repository;
pub mod error;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{error as log_error, info, warn};

use self::error::{DatabaseError, DatabaseErrorKind};
use crate::config::DatabaseConfig;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

impl From<&DatabaseConfig> for PoolConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            min_connections: config.min_connections.min(config.max_connections),
            acquire_timeout: Duration::from_secs(config.connection_timeout),
            idle_timeout: Duration::from_secs(config.idle_timeout),
            ..Self::default()
        }
    }
}

/// Connect and verify one connection can be acquired
pub async fn init_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, DatabaseError> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout = ?config.acquire_timeout,
        "connecting to booking database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect(database_url)
        .await
        .map_err(|e| {
            log_error!(error = %e, "failed to connect to booking database");
            DatabaseError::from_sqlx(e)
        })?;

    pool.acquire().await.map_err(DatabaseError::from_sqlx)?;
    Ok(pool)
}

pub async fn init_pool_from_config(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    init_pool(&config.url, PoolConfig::from(config)).await
}

pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "database health check failed");
            DatabaseError::from_sqlx(e)
        })?;
    Ok(())
}

/// Apply the embedded migrations under `migrations/`
pub async fn run_migrations(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        log_error!(error = %e, "booking migrations failed");
        DatabaseError::new(DatabaseErrorKind::Query, e.to_string())
    })?;
    info!("booking migrations applied");
    Ok(())
}
