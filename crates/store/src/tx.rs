use std::time::Duration;

use foodcourtio_shared::{Error, Result};
use futures::future::BoxFuture;
use rand::RngExt;
use sqlx::{SqliteConnection, SqlitePool};

const BACKOFF_MS: [u64; 3] = [20, 100, 500];

/// Runs `op` inside a single transaction; commit on `Ok`, rollback on `Err`.
/// The outbox append and the business write share this boundary.
pub async fn with_tx<T, F>(pool: &SqlitePool, op: F) -> Result<T>
where
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T>>,
{
    let mut tx = pool.begin().await.map_err(Error::from)?;

    match op(&mut *tx).await {
        Ok(value) => {
            tx.commit().await.map_err(Error::from)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(err = %rollback_err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}

/// Bounded retry for serialization conflicts: up to 3 retries with
/// 20/100/500ms backoff and jitter. Anything non-retryable propagates
/// unchanged; an exhausted retry surfaces as `Conflict`.
pub async fn with_retry<T, F, Fut>(op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut result = op().await;

    for backoff_ms in BACKOFF_MS {
        match result {
            Err(err) if is_serialization_conflict(&err) => {
                let jitter = rand::rng().random_range(0..=backoff_ms / 2);
                tokio::time::sleep(Duration::from_millis(backoff_ms + jitter)).await;
                result = op().await;
            }
            other => return other,
        }
    }

    match result {
        Err(err) if is_serialization_conflict(&err) => Err(Error::Conflict(
            "concurrent update, retries exhausted".to_owned(),
        )),
        other => other,
    }
}

/// SQLITE_BUSY and friends are the SQLite shape of a serialization failure.
fn is_serialization_conflict(err: &Error) -> bool {
    let Error::Server(inner) = err else {
        return false;
    };
    let Some(sqlx_err) = inner.downcast_ref::<sqlx::Error>() else {
        return false;
    };

    match sqlx_err {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.code().as_deref(), Some("5") | Some("517") | Some("261"))
                || db_err.message().contains("database is locked")
        }
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}
