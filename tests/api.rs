use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use foodcourtio::config::{
    AuthConfig, Config, DatabaseConfig, LoggingConfig, ProvidersConfig, PspAConfig, PspBConfig,
    ServerConfig,
};
use foodcourtio::middleware::RateLimiter;
use foodcourtio::routes::{AppState, router};
use foodcourtio_identity::{AccessResolver, issue_access_token, sign_init_data};
use foodcourtio_order::OrderEngine;
use foodcourtio_payment::PaymentBroker;
use foodcourtio_payment::adapter::PspAAdapter;
use foodcourtio_shared::principal::{Principal, Role};
use foodcourtio_shared::{new_id, now_unix};
use foodcourtio_workforce::WorkforceLedger;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx_migrator::{Migrate, Plan};
use tower::ServiceExt;

const SIGNING_SECRET: &str = "test-signing-secret";
const WEBHOOK_SECRET: &str = "whsec_test";

struct TestApp {
    app: Router,
    pool: SqlitePool,
}

async fn setup() -> anyhow::Result<TestApp> {
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
    drop(conn);

    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 0,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_owned(),
            max_read_connections: 1,
        },
        auth: AuthConfig {
            session_signing_secret: SIGNING_SECRET.to_owned(),
            access_token_ttl_seconds: 3600,
        },
        providers: ProvidersConfig {
            psp_a: PspAConfig {
                base_url: "https://psp-a.localhost".to_owned(),
                secret: WEBHOOK_SECRET.to_owned(),
            },
            psp_b: PspBConfig {
                base_url: "https://psp-b.localhost".to_owned(),
                shop_id: "shop-1".to_owned(),
                secret: "b_secret".to_owned(),
            },
            currency: "USD".to_owned(),
        },
        public_base_url: "http://localhost".to_owned(),
        timezone_default: "UTC".to_owned(),
        rate_limit_per_minute: 1000,
        logging: LoggingConfig {
            level: "info".to_owned(),
            json: false,
        },
    };

    let payments = PaymentBroker::new(pool.clone(), "USD").with_adapter(Arc::new(
        PspAAdapter::new("https://psp-a.localhost", WEBHOOK_SECRET.to_owned())?,
    ));
    let state = AppState {
        config: Arc::new(config),
        read_db: pool.clone(),
        write_db: pool.clone(),
        access: AccessResolver::new(pool.clone()),
        orders: OrderEngine::new(pool.clone(), Arc::new(payments.clone())),
        payments,
        workforce: WorkforceLedger::new(pool.clone()),
        rate_limiter: Arc::new(RateLimiter::new(1000)),
    };

    Ok(TestApp {
        app: router(state),
        pool,
    })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, value))
}

async fn seed_restaurant(pool: &SqlitePool) -> anyhow::Result<String> {
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
    .bind(&owner_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(restaurant_id)
}

async fn seed_product(pool: &SqlitePool, restaurant_id: &str) -> anyhow::Result<String> {
    let id = new_id();
    let now = now_unix();

    sqlx::query(
        "INSERT INTO product (id, restaurant_id, name, base_price_minor, available, variants,
                              created_at, updated_at)
         VALUES (?1, ?2, 'Ramen', 500, TRUE, NULL, ?3, ?3)",
    )
    .bind(&id)
    .bind(restaurant_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

async fn seed_superadmin_token(pool: &SqlitePool) -> anyhow::Result<String> {
    let id = new_id();
    let now = now_unix();

    sqlx::query(
        "INSERT INTO principal (id, role, external_identity_id, created_at, updated_at)
         VALUES (?1, 'Superadmin', ?2, ?3, ?3)",
    )
    .bind(&id)
    .bind(format!("ext-{id}"))
    .bind(now)
    .execute(pool)
    .await?;

    let principal = Principal {
        id,
        role: Role::Superadmin,
        external_identity_id: String::new(),
    };

    Ok(issue_access_token(&principal, SIGNING_SECRET, now, 3600)?)
}

fn signed_init_data(external_id: &str) -> String {
    let auth_date = now_unix().to_string();
    sign_init_data(
        &[
            ("user_id", external_id),
            ("display_name", "Jane Doe"),
            ("auth_date", &auth_date),
        ],
        SIGNING_SECRET,
    )
}

#[tokio::test]
async fn health_answers_ok() -> anyhow::Result<()> {
    let test = setup().await?;

    let (status, body) = send(&test.app, "GET", "/api/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    Ok(())
}

#[tokio::test]
async fn bootstrap_creates_a_customer_once() -> anyhow::Result<()> {
    let test = setup().await?;

    let (status, body) = send(
        &test.app,
        "POST",
        "/api/auth/session",
        None,
        Some(json!({ "initData": signed_init_data("tg-1001") })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["principal"]["role"], "Customer");
    assert!(body["access_token"].as_str().is_some());
    let first_id = body["principal"]["id"].as_str().unwrap().to_owned();

    // Second exchange resolves the same principal.
    let (status, body) = send(
        &test.app,
        "POST",
        "/api/auth/session",
        None,
        Some(json!({ "initData": signed_init_data("tg-1001") })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["principal"]["id"], first_id.as_str());

    Ok(())
}

#[tokio::test]
async fn tampered_init_data_is_unauthenticated() -> anyhow::Result<()> {
    let test = setup().await?;

    let tampered = signed_init_data("tg-1001").replace("tg-1001", "tg-9999");
    let (status, body) = send(
        &test.app,
        "POST",
        "/api/auth/session",
        None,
        Some(json!({ "initData": tampered })),
    )
    .await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "Unauthenticated");

    Ok(())
}

#[tokio::test]
async fn missing_bearer_is_unauthenticated() -> anyhow::Result<()> {
    let test = setup().await?;

    let (status, body) = send(&test.app, "GET", "/api/orders/o-1", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "Unauthenticated");

    Ok(())
}

#[tokio::test]
async fn customer_orders_then_staff_transitions() -> anyhow::Result<()> {
    let test = setup().await?;
    let restaurant = seed_restaurant(&test.pool).await?;
    let product = seed_product(&test.pool, &restaurant).await?;
    let staff_token = seed_superadmin_token(&test.pool).await?;

    let (_, session) = send(
        &test.app,
        "POST",
        "/api/auth/session",
        None,
        Some(json!({ "initData": signed_init_data("tg-2002") })),
    )
    .await?;
    let customer_token = session["access_token"].as_str().unwrap().to_owned();

    let (status, order) = send(
        &test.app,
        "POST",
        "/api/orders",
        Some(&customer_token),
        Some(json!({
            "restaurant_id": restaurant,
            "items": [{ "product_id": product, "quantity": 2 }],
            "customer_name": "Jane Doe",
            "customer_phone": "+79001234567",
            "delivery_type": "DineIn",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["total_minor"], 1000);
    assert_eq!(order["status"], "Pending");
    let order_id = order["id"].as_str().unwrap().to_owned();

    // The placing customer reads it back.
    let (status, _) = send(
        &test.app,
        "GET",
        &format!("/api/orders/{order_id}"),
        Some(&customer_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    // Customers cannot transition.
    let (status, body) = send(
        &test.app,
        "PATCH",
        &format!("/api/orders/{order_id}/status"),
        Some(&customer_token),
        Some(json!({ "status": "Preparing" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "Forbidden");

    // Staff can.
    let (status, body) = send(
        &test.app,
        "PATCH",
        &format!("/api/orders/{order_id}/status"),
        Some(&staff_token),
        Some(json!({ "status": "Preparing", "estimated_minutes": 10 })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Preparing");

    // Illegal jumps map to 400 with the taxonomy code.
    let (status, body) = send(
        &test.app,
        "PATCH",
        &format!("/api/orders/{order_id}/status"),
        Some(&staff_token),
        Some(json!({ "status": "Completed" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "IllegalTransition");

    Ok(())
}

#[tokio::test]
async fn webhook_rejects_bad_signature_with_bare_400() -> anyhow::Result<()> {
    let test = setup().await?;

    let body = r#"{"id":"evt_1","type":"charge.succeeded","data":{"object":{"id":"ch_1"}}}"#;
    let request = Request::builder()
        .method("POST")
        .uri("/api/payments/webhooks/psp_a")
        .header("content-type", "application/json")
        .header(
            "x-pspa-signature",
            PspAAdapter::sign_webhook("wrong-secret", now_unix(), body.as_bytes()),
        )
        .body(Body::from(body))?;

    let response = test.app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await?.to_bytes();
    assert!(bytes.is_empty(), "no taxonomy code may leak to the caller");

    Ok(())
}

#[tokio::test]
async fn unknown_webhook_provider_is_404() -> anyhow::Result<()> {
    let test = setup().await?;

    let (status, body) = send(
        &test.app,
        "POST",
        "/api/payments/webhooks/psp_x",
        None,
        Some(json!({})),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NotFound");

    Ok(())
}
