use crate::shared::config::StorageConfig;
use crate::shared::error::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Where the on-device database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
    /// The host offers no persistent storage; carries the reason.
    Unavailable(String),
}

impl StoreLocation {
    pub fn from_config(config: &StorageConfig) -> Self {
        if config.in_memory {
            return StoreLocation::Memory;
        }
        match config.resolve_data_dir() {
            Some(dir) => StoreLocation::File(dir.join(&config.database_file)),
            None => StoreLocation::Unavailable(
                "no persistent data directory is available on this host".to_string(),
            ),
        }
    }
}

#[derive(Clone)]
pub struct ConnectionPool {
    pool: SqlitePool,
}

impl ConnectionPool {
    /// Connects and runs the embedded migrations. Nothing is kept on failure.
    pub async fn open(location: &StoreLocation, timeout: Duration) -> Result<Self, AppError> {
        let pool = Self::connect(location, timeout).await?;
        let pool = Self { pool };
        if let Err(err) = pool.migrate().await {
            pool.close().await;
            return Err(AppError::StorageOpenFailed(format!(
                "schema migration failed: {err}"
            )));
        }
        Ok(pool)
    }

    async fn connect(location: &StoreLocation, timeout: Duration) -> Result<SqlitePool, AppError> {
        match location {
            StoreLocation::Unavailable(reason) => {
                Err(AppError::StorageUnavailable(reason.clone()))
            }
            StoreLocation::Memory => {
                let options = SqliteConnectOptions::from_str("sqlite::memory:")
                    .map_err(|err| AppError::StorageOpenFailed(err.to_string()))?;
                // A single long-lived connection, otherwise every new connection
                // would see its own empty database.
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .acquire_timeout(timeout)
                    .connect_with(options)
                    .await
                    .map_err(|err| AppError::StorageOpenFailed(err.to_string()))
            }
            StoreLocation::File(path) => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    tokio::fs::create_dir_all(parent).await.map_err(|err| {
                        AppError::StorageOpenFailed(format!(
                            "cannot create data directory {}: {err}",
                            parent.display()
                        ))
                    })?;
                }
                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal);
                SqlitePoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(timeout)
                    .connect_with(options)
                    .await
                    .map_err(|err| {
                        AppError::StorageOpenFailed(format!("{}: {err}", path.display()))
                    })
            }
        }
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
