use foodcourtio_shared::principal::{Principal, Role};
use foodcourtio_shared::{new_id, now_unix};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx_migrator::{Migrate, Plan};

pub async fn setup_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(2)
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

pub async fn seed_restaurant(pool: &SqlitePool, owner_principal_id: &str) -> anyhow::Result<String> {
    let foodcourt_id = new_id();
    let restaurant_id = new_id();
    let now = now_unix();

    sqlx::query(
        "INSERT INTO foodcourt (id, name, commission_rate_bp, timezone, active, created_at)
         VALUES (?1, 'Central', 1000, 'UTC', TRUE, ?2)",
    )
    .bind(&foodcourt_id)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO restaurant (id, foodcourt_id, owner_principal_id, name, commission_rate_bp,
                                 timezone, published, location, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'Noodle Bar', 1000, 'UTC', TRUE, NULL, ?4, ?4)",
    )
    .bind(&restaurant_id)
    .bind(&foodcourt_id)
    .bind(owner_principal_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(restaurant_id)
}

pub async fn seed_employee(
    pool: &SqlitePool,
    restaurant_id: &str,
    principal_id: &str,
) -> anyhow::Result<String> {
    let id = new_id();
    let now = now_unix();

    sqlx::query(
        "INSERT INTO employee (id, restaurant_id, principal_id, name, phone, email, role,
                               hourly_wage_minor, active, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'Worker', ?4, NULL, 'Cook', 1200, TRUE, ?5, ?5)",
    )
    .bind(&id)
    .bind(restaurant_id)
    .bind(principal_id)
    .bind(format!("+7900{}", &id[..7]))
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}
