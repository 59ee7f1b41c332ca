use std::time::Duration;

use foodcourtio_shared::{Result, now_unix};
use sqlx::SqlitePool;

/// Takes or renews a named singleton lease. Succeeds when the row is free,
/// expired, or already held by `holder`; the winner must keep calling within
/// the TTL to stay the holder.
pub async fn acquire_lease(
    pool: &SqlitePool,
    name: &str,
    holder: &str,
    ttl: Duration,
) -> Result<bool> {
    let now = now_unix();
    let expires_at = now + ttl.as_secs() as i64;

    let result = sqlx::query(
        r#"INSERT INTO lease (name, holder, expires_at) VALUES (?1, ?2, ?3)
           ON CONFLICT (name) DO UPDATE
           SET holder = excluded.holder, expires_at = excluded.expires_at
           WHERE lease.holder = excluded.holder OR lease.expires_at < ?4"#,
    )
    .bind(name)
    .bind(holder)
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await
    .map_err(foodcourtio_shared::Error::from)?;

    Ok(result.rows_affected() == 1)
}
