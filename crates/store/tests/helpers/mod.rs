use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx_migrator::{Migrate, Plan};

/// In-memory database with the full schema applied. A single connection
/// keeps every handle on the same memory database.
pub async fn setup_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::query("PRAGMA foreign_keys = true")
        .execute(&pool)
        .await?;

    let migrator = foodcourtio_db::migrator()?;
    let mut conn = pool.acquire().await?;
    migrator.run(&mut conn, &Plan::apply_all()).await?;

    Ok(pool)
}
