mod server;

use anyhow::Result;
use sqlx_migrator::{Migrate, Plan};

pub use server::serve;

use crate::config::Config;

pub async fn migrate(config: Config) -> Result<()> {
    let pool = crate::db::create_pool(&config.database.url, 1).await?;
    let migrator = foodcourtio_db::migrator()?;

    let mut conn = pool.acquire().await?;
    migrator.run(&mut conn, &Plan::apply_all()).await?;

    tracing::info!("migrations applied");

    Ok(())
}

pub async fn reset(config: Config) -> Result<()> {
    let pool = crate::db::create_pool(&config.database.url, 1).await?;
    let migrator = foodcourtio_db::migrator()?;

    let mut conn = pool.acquire().await?;
    migrator.run(&mut conn, &Plan::revert_all()).await?;
    migrator.run(&mut conn, &Plan::apply_all()).await?;

    tracing::info!("database reset");

    Ok(())
}
