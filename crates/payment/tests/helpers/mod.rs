use std::sync::atomic::{AtomicU32, Ordering};

use foodcourtio_payment::adapter::{
    ChargeCreated, ChargeRequest, ProviderAdapter, RefundCreated, WebhookEvent, WebhookHeaders,
};
use foodcourtio_payment::{Payment, PaymentMethod, PaymentStatus, repository};
use foodcourtio_shared::{Error, Result, new_id, now_unix};
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

/// Published restaurant with the given commission rate in basis points.
pub async fn seed_restaurant(pool: &SqlitePool, commission_rate_bp: i64) -> anyhow::Result<String> {
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
         VALUES (?1, 'Central', ?2, 'UTC', TRUE, ?3)",
    )
    .bind(&foodcourt_id)
    .bind(commission_rate_bp)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO restaurant (id, foodcourt_id, owner_principal_id, name, commission_rate_bp,
                                 timezone, published, location, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'Noodle Bar', ?4, 'UTC', TRUE, NULL, ?5, ?5)",
    )
    .bind(&restaurant_id)
    .bind(&foodcourt_id)
    .bind(&owner_id)
    .bind(commission_rate_bp)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(restaurant_id)
}

pub async fn seed_order(
    pool: &SqlitePool,
    restaurant_id: &str,
    total_minor: i64,
) -> anyhow::Result<String> {
    let id = new_id();
    let now = now_unix();

    sqlx::query(
        "INSERT INTO customer_order (id, restaurant_id, order_number, dining_table_id,
                                     customer_principal_id, customer_name, customer_phone,
                                     delivery_type, status, total_minor, special_instructions,
                                     created_at, updated_at)
         VALUES (?1, ?2, ?3, NULL, NULL, 'Jane Doe', '+79001234567', 'DineIn', 'Pending', ?4,
                 NULL, ?5, ?5)",
    )
    .bind(&id)
    .bind(restaurant_id)
    .bind(format!("20240301-{}", &id[..3]))
    .bind(total_minor)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Inserts a Completed card payment with a provider ref, the state a
/// settled charge leaves behind.
pub async fn seed_completed_card_payment(
    pool: &SqlitePool,
    restaurant_id: &str,
    order_id: &str,
    amount_minor: i64,
    commission_minor: i64,
    provider_ref: &str,
) -> anyhow::Result<Payment> {
    let now = now_unix();
    let payment = Payment {
        id: new_id(),
        order_id: order_id.to_owned(),
        restaurant_id: restaurant_id.to_owned(),
        amount_minor,
        currency: "USD".to_owned(),
        method: PaymentMethod::CardPspA,
        status: PaymentStatus::Completed,
        commission_minor,
        net_minor: amount_minor - commission_minor,
        provider_ref: Some(provider_ref.to_owned()),
        provider_metadata: None,
        details: None,
        created_at: now,
        updated_at: now,
    };

    let mut conn = pool.acquire().await?;
    repository::insert(&mut conn, &payment).await?;

    Ok(payment)
}

/// Scriptable provider double: counts calls, optionally failing either
/// operation with a 5xx-shaped error.
pub struct StubAdapter {
    method: PaymentMethod,
    pub fail_charge: bool,
    pub fail_refund: bool,
    pub charges: AtomicU32,
    pub refunds: AtomicU32,
}

impl StubAdapter {
    pub fn new(method: PaymentMethod) -> Self {
        Self {
            method,
            fail_charge: false,
            fail_refund: false,
            charges: AtomicU32::new(0),
            refunds: AtomicU32::new(0),
        }
    }

    pub fn failing_charge(method: PaymentMethod) -> Self {
        Self {
            fail_charge: true,
            ..Self::new(method)
        }
    }

    pub fn failing_refund(method: PaymentMethod) -> Self {
        Self {
            fail_refund: true,
            ..Self::new(method)
        }
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for StubAdapter {
    fn method(&self) -> PaymentMethod {
        self.method
    }

    async fn create_charge(&self, request: &ChargeRequest) -> Result<ChargeCreated> {
        self.charges.fetch_add(1, Ordering::SeqCst);

        if self.fail_charge {
            return Err(Error::ProviderUnavailable("stub returned 503".to_owned()));
        }

        Ok(ChargeCreated {
            provider_ref: format!("ch_{}", request.payment_id),
            redirect_url: Some(format!("https://pay.example/{}", request.payment_id)),
        })
    }

    async fn refund(
        &self,
        provider_ref: &str,
        _amount_minor: i64,
        _reason: &str,
    ) -> Result<RefundCreated> {
        self.refunds.fetch_add(1, Ordering::SeqCst);

        if self.fail_refund {
            return Err(Error::ProviderUnavailable("stub returned 503".to_owned()));
        }

        Ok(RefundCreated {
            refund_ref: format!("re_{provider_ref}"),
        })
    }

    fn verify_webhook(&self, _raw: &[u8], _headers: &WebhookHeaders) -> Result<WebhookEvent> {
        Err(Error::InvalidWebhookSignature)
    }
}
