use foodcourtio_shared::principal::{Principal, Role};
use foodcourtio_shared::{new_id, now_unix};
use foodcourtio_workforce::WorkforceLedger;
use sqlx::SqlitePool;
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
    pub restaurant_id: String,
    pub ledger: WorkforceLedger,
}

pub async fn setup_fixture() -> anyhow::Result<Fixture> {
    let pool = setup_pool().await?;
    let restaurant_id = seed_restaurant(&pool, "UTC").await?;
    let ledger = WorkforceLedger::new(pool.clone());

    Ok(Fixture {
        pool,
        restaurant_id,
        ledger,
    })
}

pub async fn seed_restaurant(pool: &SqlitePool, timezone: &str) -> anyhow::Result<String> {
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
         VALUES (?1, 'Central', 1000, ?2, TRUE, ?3)",
    )
    .bind(&foodcourt_id)
    .bind(timezone)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO restaurant (id, foodcourt_id, owner_principal_id, name, commission_rate_bp,
                                 timezone, published, location, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'Noodle Bar', 1000, ?4, TRUE, NULL, ?5, ?5)",
    )
    .bind(&restaurant_id)
    .bind(&foodcourt_id)
    .bind(&owner_id)
    .bind(timezone)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(restaurant_id)
}

pub async fn seed_principal(pool: &SqlitePool, role: Role) -> anyhow::Result<Principal> {
    let id = new_id();
    let external = format!("ext-{id}");
    let now = now_unix();

    sqlx::query(
        "INSERT INTO principal (id, role, external_identity_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
    )
    .bind(&id)
    .bind(role.to_string())
    .bind(&external)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Principal {
        id,
        role,
        external_identity_id: external,
    })
}

/// Active employee bound to a fresh principal; returns
/// `(employee_id, principal_id)`.
pub async fn seed_employee(
    pool: &SqlitePool,
    restaurant_id: &str,
    hourly_wage_minor: Option<i64>,
) -> anyhow::Result<(String, String)> {
    let principal = seed_principal(pool, Role::Employee).await?;
    let id = new_id();
    let now = now_unix();

    sqlx::query(
        "INSERT INTO employee (id, restaurant_id, principal_id, name, phone, email, role,
                               hourly_wage_minor, active, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'Worker', ?4, NULL, 'Cook', ?5, TRUE, ?6, ?6)",
    )
    .bind(&id)
    .bind(restaurant_id)
    .bind(&principal.id)
    .bind(format!("+7900{}", &id[..7]))
    .bind(hourly_wage_minor)
    .bind(now)
    .execute(pool)
    .await?;

    Ok((id, principal.id))
}
