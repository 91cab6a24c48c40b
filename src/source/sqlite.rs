//! SQLite-backed channel source.
//!
//! Reads `SELECT name FROM channels WHERE enabled = 1`. The table is created
//! if missing so a fresh database file works out of the box.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{ChannelSource, ChannelSourceError, normalize_all, normalize_channel};

/// Channel source over a SQLite `channels(name, enabled)` table.
///
/// The pool connects lazily and the schema is created on first use, so a
/// database that is unavailable at startup only fails the reconciliations
/// that run while it is down.
#[derive(Clone)]
pub struct SqliteChannelSource {
    pool: SqlitePool,
    schema: Arc<OnceCell<()>>,
}

impl SqliteChannelSource {
    /// Connection acquire timeout.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Source for the database at `path`, without touching it yet.
    pub fn open(path: &str) -> Self {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(path = %parent.display(), error = %e, "Failed to create database directory");
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .connect_lazy_with(options);

        Self {
            pool,
            schema: Arc::new(OnceCell::new()),
        }
    }

    /// Open (creating if needed) the database at `path` and check it works.
    pub async fn connect(path: &str) -> Result<Self, ChannelSourceError> {
        let source = Self::open(path);
        source.ensure_schema().await?;
        info!(path = %path, "Channel database connected");
        Ok(source)
    }

    async fn ensure_schema(&self) -> Result<(), ChannelSourceError> {
        self.schema
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS channels (
                        name TEXT PRIMARY KEY NOT NULL,
                        enabled INTEGER NOT NULL DEFAULT 1
                    )
                    "#,
                )
                .execute(&self.pool)
                .await
                .map(|_| ())
            })
            .await?;
        Ok(())
    }

    /// Get reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert or update a channel row.
    pub async fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), ChannelSourceError> {
        self.ensure_schema().await?;
        let name = normalize_channel(name).unwrap_or_else(|| name.to_string());
        sqlx::query(
            r#"
            INSERT INTO channels (name, enabled) VALUES (?, ?)
            ON CONFLICT(name) DO UPDATE SET enabled = excluded.enabled
            "#,
        )
        .bind(name)
        .bind(enabled)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ChannelSource for SqliteChannelSource {
    async fn enabled_channels(&self) -> Result<BTreeSet<String>, ChannelSourceError> {
        self.ensure_schema().await?;
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM channels WHERE enabled = 1 ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(normalize_all(names))
    }

    fn describe(&self) -> &'static str {
        "sqlite"
    }
}
