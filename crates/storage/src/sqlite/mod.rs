use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use snafu::{ResultExt, ensure};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Connection, SqliteConnection, SqlitePool};

use super::KeyValueStore;
use super::error::{
    CreateSqliteDirectorySnafu, EmptyKeySnafu, InvariantViolationSnafu, SqliteConnectOptionsSnafu,
    SqliteConnectSnafu, SqliteMigrateSnafu, SqlitePragmaSnafu, SqliteQuerySnafu,
    SqliteRuntimeInitSnafu, SqliteThreadSpawnSnafu, StorageResult,
};

/// Key-value store persisted in a single sqlite table.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    // Holds the database open for the store's lifetime; calls use their own connections.
    _pool: SqlitePool,
    database_url: String,
}

impl SqliteStorage {
    pub async fn open(database_location: &str) -> StorageResult<Self> {
        ensure_database_directory(database_location)?;

        let database_url = normalize_database_url(database_location);
        let connect_options = SqliteConnectOptions::from_str(&database_url)
            .context(SqliteConnectOptionsSnafu {
                stage: "sqlite-open-parse-url",
                database_url: database_url.clone(),
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(5_000));

        // Never reaped, so a named in-memory database keeps its schema and rows.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await
            .context(SqliteConnectSnafu {
                stage: "sqlite-open-connect",
                database_url: database_url.clone(),
            })?;

        let _: String = sqlx::query_scalar("PRAGMA journal_mode = WAL;")
            .fetch_one(&pool)
            .await
            .context(SqlitePragmaSnafu {
                stage: "sqlite-open-pragma-journal-mode",
                pragma: "journal_mode",
            })?;
        sqlx::query("PRAGMA busy_timeout = 5000;")
            .execute(&pool)
            .await
            .context(SqlitePragmaSnafu {
                stage: "sqlite-open-pragma-busy-timeout",
                pragma: "busy_timeout",
            })?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context(SqliteMigrateSnafu {
                stage: "sqlite-open-migrate",
            })?;

        tracing::info!("opened key-value store at {database_url}");
        Ok(Self {
            _pool: pool,
            database_url,
        })
    }

    fn run_db_call<T, F>(&self, stage: &'static str, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: Future<Output = StorageResult<T>> + Send + 'static,
    {
        // The store trait is sync, so each call executes on a dedicated worker thread
        // with its own current-thread runtime to avoid nested-runtime blocking panics.
        let worker = std::thread::Builder::new()
            .name(format!("sqlite-kv-{stage}"))
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .context(SqliteRuntimeInitSnafu {
                        stage: "sqlite-kv-runtime-build",
                    })?;
                runtime.block_on(op)
            })
            .context(SqliteThreadSpawnSnafu {
                stage: "sqlite-kv-spawn-worker",
            })?;

        match worker.join() {
            Ok(result) => result,
            Err(_) => InvariantViolationSnafu {
                stage,
                details: "sqlite storage worker thread panicked".to_string(),
            }
            .fail(),
        }
    }
}

impl KeyValueStore for SqliteStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        ensure!(!key.is_empty(), EmptyKeySnafu { stage: "kv-get" });

        let database_url = self.database_url.clone();
        let key = key.to_string();
        self.run_db_call("kv-get", async move {
            let mut connection =
                connect_store_connection(&database_url, "kv-get-connect").await?;
            sqlx::query_scalar::<_, String>("SELECT value FROM kv_entries WHERE key = ?")
                .bind(key)
                .fetch_optional(&mut connection)
                .await
                .context(SqliteQuerySnafu {
                    stage: "kv-get-query",
                })
        })
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        ensure!(!key.is_empty(), EmptyKeySnafu { stage: "kv-set" });

        let database_url = self.database_url.clone();
        let key = key.to_string();
        let value = value.to_string();
        self.run_db_call("kv-set", async move {
            let mut connection =
                connect_store_connection(&database_url, "kv-set-connect").await?;
            sqlx::query(
                "INSERT INTO kv_entries (key, value, updated_at) VALUES (?, ?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(value)
            .bind(unix_timestamp_seconds())
            .execute(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "kv-set-upsert",
            })?;

            Ok(())
        })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        ensure!(!key.is_empty(), EmptyKeySnafu { stage: "kv-remove" });

        let database_url = self.database_url.clone();
        let key = key.to_string();
        self.run_db_call("kv-remove", async move {
            let mut connection =
                connect_store_connection(&database_url, "kv-remove-connect").await?;
            sqlx::query("DELETE FROM kv_entries WHERE key = ?")
                .bind(key)
                .execute(&mut connection)
                .await
                .context(SqliteQuerySnafu {
                    stage: "kv-remove-delete",
                })?;

            Ok(())
        })
    }
}

async fn connect_store_connection(
    database_url: &str,
    stage: &'static str,
) -> StorageResult<SqliteConnection> {
    let mut connection =
        SqliteConnection::connect(database_url)
            .await
            .context(SqliteConnectSnafu {
                stage,
                database_url: database_url.to_string(),
            })?;

    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(&mut connection)
        .await
        .context(SqlitePragmaSnafu {
            stage: "sqlite-kv-pragma-busy-timeout",
            pragma: "busy_timeout",
        })?;

    Ok(connection)
}

fn unix_timestamp_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0_i64, |duration| duration.as_secs() as i64)
}

fn ensure_database_directory(database_location: &str) -> StorageResult<()> {
    if database_location.starts_with("sqlite:") || database_location == ":memory:" {
        return Ok(());
    }

    let path = Path::new(database_location);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context(CreateSqliteDirectorySnafu {
            stage: "sqlite-open-create-directory",
            path: parent.display().to_string(),
        })?;
    }

    Ok(())
}

fn normalize_database_url(database_location: &str) -> String {
    if database_location.starts_with("sqlite:") {
        return database_location.to_string();
    }

    // Every connection to `sqlite::memory:` opens a fresh database, so each store gets its own
    // shared-cache name instead.
    if database_location == ":memory:" {
        static NEXT_MEMORY_DATABASE: AtomicU64 = AtomicU64::new(0);
        let seqno = NEXT_MEMORY_DATABASE.fetch_add(1, Ordering::Relaxed);
        return format!(
            "sqlite:file:murmur-memory-{}-{seqno}?mode=memory&cache=shared",
            std::process::id()
        );
    }

    format!("sqlite://{database_location}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database_path(dir: &tempfile::TempDir) -> String {
        dir.path().join("nested/murmur.db").display().to_string()
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = database_path(&dir);

        let storage = SqliteStorage::open(&path).await.unwrap();
        storage.set("currentUser", "{\"phoneNumber\":\"+19876543210\"}").unwrap();
        storage.set("chatrooms_+19876543210", "[]").unwrap();
        storage.set("chatrooms_+19876543210", "[{\"id\":\"1\"}]").unwrap();
        drop(storage);

        let reopened = SqliteStorage::open(&path).await.unwrap();
        assert_eq!(
            reopened.get("chatrooms_+19876543210").unwrap().as_deref(),
            Some("[{\"id\":\"1\"}]")
        );
        assert_eq!(
            reopened.get("currentUser").unwrap().as_deref(),
            Some("{\"phoneNumber\":\"+19876543210\"}")
        );
    }

    #[tokio::test]
    async fn remove_deletes_only_the_given_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::open(&database_path(&dir)).await.unwrap();

        storage.set("chatrooms_+1", "[]").unwrap();
        storage.set("chatrooms_+2", "[]").unwrap();
        storage.remove("chatrooms_+1").unwrap();
        storage.remove("chatrooms_+1").unwrap();

        assert_eq!(storage.get("chatrooms_+1").unwrap(), None);
        assert_eq!(storage.get("chatrooms_+2").unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn in_memory_store_keeps_its_schema_between_calls() {
        let storage = SqliteStorage::open(":memory:").await.unwrap();
        let other = SqliteStorage::open(":memory:").await.unwrap();

        storage.set("currentUser", "{}").unwrap();
        assert_eq!(storage.get("currentUser").unwrap().as_deref(), Some("{}"));
        assert_eq!(other.get("currentUser").unwrap(), None);

        storage.remove("currentUser").unwrap();
        assert_eq!(storage.get("currentUser").unwrap(), None);
    }

    #[tokio::test]
    async fn empty_key_is_rejected_before_touching_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::open(&database_path(&dir)).await.unwrap();

        assert!(matches!(
            storage.get(""),
            Err(crate::StorageError::EmptyKey { .. })
        ));
    }

    #[test]
    fn database_urls_are_normalized() {
        let first = normalize_database_url(":memory:");
        let second = normalize_database_url(":memory:");
        assert!(first.starts_with("sqlite:file:murmur-memory-"));
        assert!(first.ends_with("?mode=memory&cache=shared"));
        assert_ne!(first, second);
        assert_eq!(
            normalize_database_url("sqlite://already.db"),
            "sqlite://already.db"
        );
        assert_eq!(normalize_database_url("/tmp/a.db"), "sqlite:///tmp/a.db");
    }
}
