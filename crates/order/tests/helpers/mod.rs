use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use foodcourtio_order::{OrderEngine, RefundPort};
use foodcourtio_shared::{Error, Result, new_id, now_unix};
use sqlx::{SqliteConnection, SqlitePool};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx_migrator::{Migrate, Plan};

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

pub struct Fixture {
    pub pool: SqlitePool,
    pub foodcourt_id: String,
    pub restaurant_id: String,
    pub engine: OrderEngine,
}

/// Published restaurant in an active foodcourt with a no-op refund port.
pub async fn setup_fixture() -> anyhow::Result<Fixture> {
    let pool = setup_pool().await?;
    let (foodcourt_id, restaurant_id) = seed_restaurant(&pool, "UTC", true, true).await?;
    let engine = OrderEngine::new(pool.clone(), Arc::new(RecordingRefundPort::default()));

    Ok(Fixture {
        pool,
        foodcourt_id,
        restaurant_id,
        engine,
    })
}

pub async fn seed_restaurant(
    pool: &SqlitePool,
    timezone: &str,
    published: bool,
    foodcourt_active: bool,
) -> anyhow::Result<(String, String)> {
    let foodcourt_id = new_id();
    let restaurant_id = new_id();
    let owner_id = new_id();
    let now = now_unix();

    sqlx::query(
        "INSERT INTO principal (id, role, external_identity_id, created_at, updated_at)
         VALUES (?1, 'RestaurantOwner', ?2, ?3, ?3)",
    )
    .bind(&owner_id)
    .bind(format!("ext-{owner_id}"))
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO foodcourt (id, name, commission_rate_bp, timezone, active, created_at)
         VALUES (?1, 'Central', 1000, ?2, ?3, ?4)",
    )
    .bind(&foodcourt_id)
    .bind(timezone)
    .bind(foodcourt_active)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO restaurant (id, foodcourt_id, owner_principal_id, name, commission_rate_bp,
                                 timezone, published, location, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'Noodle Bar', 1000, ?4, ?5, NULL, ?6, ?6)",
    )
    .bind(&restaurant_id)
    .bind(&foodcourt_id)
    .bind(&owner_id)
    .bind(timezone)
    .bind(published)
    .bind(now)
    .execute(pool)
    .await?;

    Ok((foodcourt_id, restaurant_id))
}

pub async fn seed_product(
    pool: &SqlitePool,
    restaurant_id: &str,
    base_price_minor: i64,
    available: bool,
    variants: Option<&str>,
) -> anyhow::Result<String> {
    let id = new_id();
    let now = now_unix();

    sqlx::query(
        "INSERT INTO product (id, restaurant_id, name, base_price_minor, available, variants,
                              created_at, updated_at)
         VALUES (?1, ?2, 'Ramen', ?3, ?4, ?5, ?6, ?6)",
    )
    .bind(&id)
    .bind(restaurant_id)
    .bind(base_price_minor)
    .bind(available)
    .bind(variants)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn seed_table(pool: &SqlitePool, foodcourt_id: &str) -> anyhow::Result<String> {
    let id = new_id();

    sqlx::query(
        "INSERT INTO dining_table (id, foodcourt_id, label, created_at) VALUES (?1, ?2, 'T1', ?3)",
    )
    .bind(&id)
    .bind(foodcourt_id)
    .bind(now_unix())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Counts refund requests; optionally fails every one of them.
#[derive(Default)]
pub struct RecordingRefundPort {
    pub calls: AtomicU32,
    pub fail: bool,
}

impl RecordingRefundPort {
    pub fn failing() -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail: true,
        }
    }
}

#[async_trait::async_trait]
impl RefundPort for RecordingRefundPort {
    async fn refund_completed_payment(
        &self,
        _conn: &mut SqliteConnection,
        _order_id: &str,
        _reason: &str,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(Error::RefundFailed("provider returned 503".to_owned()));
        }

        Ok(())
    }
}
