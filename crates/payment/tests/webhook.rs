use std::sync::Arc;

use foodcourtio_payment::adapter::{PspAAdapter, WebhookHeaders};
use foodcourtio_payment::repository::{self, FindBy};
use foodcourtio_payment::{Payment, PaymentBroker, PaymentMethod, PaymentStatus};
use foodcourtio_shared::{Error, new_id, now_unix};
use sqlx::SqlitePool;

mod helpers;

const WEBHOOK_SECRET: &str = "whsec_test";

fn broker(pool: &SqlitePool) -> PaymentBroker {
    let adapter =
        PspAAdapter::new("https://psp-a.localhost/", WEBHOOK_SECRET.to_owned()).unwrap();

    PaymentBroker::new(pool.clone(), "USD").with_adapter(Arc::new(adapter))
}

fn signed(body: &str) -> (Vec<u8>, WebhookHeaders) {
    let raw = body.as_bytes().to_vec();
    let mut headers = WebhookHeaders::new();
    headers.insert(
        "x-pspa-signature".to_owned(),
        PspAAdapter::sign_webhook(WEBHOOK_SECRET, now_unix(), &raw),
    );

    (raw, headers)
}

fn charge_succeeded(event_id: &str, provider_ref: &str) -> String {
    format!(
        r#"{{"id":"{event_id}","type":"charge.succeeded","data":{{"object":{{"id":"{provider_ref}","failure_message":null,"amount_refunded":null}}}}}}"#
    )
}

async fn seed_pending_payment(
    pool: &SqlitePool,
    restaurant: &str,
    order: &str,
    provider_ref: &str,
) -> anyhow::Result<Payment> {
    let now = now_unix();
    let payment = Payment {
        id: new_id(),
        order_id: order.to_owned(),
        restaurant_id: restaurant.to_owned(),
        amount_minor: 1500,
        currency: "USD".to_owned(),
        method: PaymentMethod::CardPspA,
        status: PaymentStatus::Pending,
        commission_minor: 150,
        net_minor: 1350,
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

#[tokio::test]
async fn settles_a_pending_payment() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let restaurant = helpers::seed_restaurant(&pool, 1000).await?;
    let order = helpers::seed_order(&pool, &restaurant, 1500).await?;
    let payment = seed_pending_payment(&pool, &restaurant, &order, "ch_1").await?;
    let broker = broker(&pool);

    let (raw, headers) = signed(&charge_succeeded("evt_1", "ch_1"));
    broker.handle_webhook("psp_a", &raw, &headers).await?;

    let settled = repository::find_from_pool(&pool, FindBy::Id(payment.id.clone()))
        .await?
        .unwrap();
    assert_eq!(settled.status, PaymentStatus::Completed);
    assert_eq!(settled.commission_minor, 150);
    assert_eq!(settled.net_minor, 1350);

    let kinds: Vec<&str> = foodcourtio_store::fetch_after(&pool, 0, 10)
        .await?
        .iter()
        .map(|event| event.event.kind())
        .collect();
    assert_eq!(kinds, ["PaymentSettled"]);

    Ok(())
}

#[tokio::test]
async fn triplicate_delivery_settles_once() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let restaurant = helpers::seed_restaurant(&pool, 1000).await?;
    let order = helpers::seed_order(&pool, &restaurant, 1500).await?;
    let payment = seed_pending_payment(&pool, &restaurant, &order, "ch_1").await?;
    let broker = broker(&pool);

    for _ in 0..3 {
        let (raw, headers) = signed(&charge_succeeded("evt_1", "ch_1"));
        broker.handle_webhook("psp_a", &raw, &headers).await?;
    }

    let settled = repository::find_from_pool(&pool, FindBy::Id(payment.id.clone()))
        .await?
        .unwrap();
    assert_eq!(settled.status, PaymentStatus::Completed);

    let (processed,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM processed_webhook WHERE provider = 'psp_a'")
            .fetch_one(&pool)
            .await?;
    assert_eq!(processed, 1);

    let settled_events = foodcourtio_store::fetch_after(&pool, 0, 10)
        .await?
        .iter()
        .filter(|event| event.event.kind() == "PaymentSettled")
        .count();
    assert_eq!(settled_events, 1);

    Ok(())
}

#[tokio::test]
async fn distinct_replays_on_terminal_status_are_noops() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let restaurant = helpers::seed_restaurant(&pool, 1000).await?;
    let order = helpers::seed_order(&pool, &restaurant, 1500).await?;
    let payment = seed_pending_payment(&pool, &restaurant, &order, "ch_1").await?;
    let broker = broker(&pool);

    let (raw, headers) = signed(&charge_succeeded("evt_1", "ch_1"));
    broker.handle_webhook("psp_a", &raw, &headers).await?;

    // A different event id for the same charge arrives after settlement.
    let (raw, headers) = signed(&charge_succeeded("evt_2", "ch_1"));
    broker.handle_webhook("psp_a", &raw, &headers).await?;

    let settled = repository::find_from_pool(&pool, FindBy::Id(payment.id.clone()))
        .await?
        .unwrap();
    assert_eq!(settled.status, PaymentStatus::Completed);

    Ok(())
}

#[tokio::test]
async fn failure_event_fails_the_payment() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let restaurant = helpers::seed_restaurant(&pool, 1000).await?;
    let order = helpers::seed_order(&pool, &restaurant, 1500).await?;
    let payment = seed_pending_payment(&pool, &restaurant, &order, "ch_1").await?;
    let broker = broker(&pool);

    let body = r#"{"id":"evt_1","type":"charge.failed","data":{"object":{"id":"ch_1","failure_message":"card_declined","amount_refunded":null}}}"#;
    let (raw, headers) = signed(body);
    broker.handle_webhook("psp_a", &raw, &headers).await?;

    let failed = repository::find_from_pool(&pool, FindBy::Id(payment.id.clone()))
        .await?
        .unwrap();
    assert_eq!(failed.status, PaymentStatus::Failed);

    let kinds: Vec<&str> = foodcourtio_store::fetch_after(&pool, 0, 10)
        .await?
        .iter()
        .map(|event| event.event.kind())
        .collect();
    assert_eq!(kinds, ["PaymentFailed"]);

    Ok(())
}

#[tokio::test]
async fn provider_refund_event_refunds_a_completed_payment() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let restaurant = helpers::seed_restaurant(&pool, 1000).await?;
    let order = helpers::seed_order(&pool, &restaurant, 1500).await?;
    let payment =
        helpers::seed_completed_card_payment(&pool, &restaurant, &order, 1500, 150, "ch_1")
            .await?;
    let broker = broker(&pool);

    let body = r#"{"id":"evt_9","type":"refund.succeeded","data":{"object":{"id":"ch_1","failure_message":null,"amount_refunded":1500}}}"#;
    let (raw, headers) = signed(body);
    broker.handle_webhook("psp_a", &raw, &headers).await?;

    let refunded = repository::find_from_pool(&pool, FindBy::Id(payment.id.clone()))
        .await?
        .unwrap();
    assert_eq!(refunded.status, PaymentStatus::Refunded);
    assert_eq!(refunded.commission_minor, 0);
    assert_eq!(refunded.net_minor, 0);

    Ok(())
}

#[tokio::test]
async fn bad_signature_is_rejected_before_any_write() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let broker = broker(&pool);

    let raw = charge_succeeded("evt_1", "ch_1");
    let mut headers = WebhookHeaders::new();
    headers.insert(
        "x-pspa-signature".to_owned(),
        PspAAdapter::sign_webhook("wrong-secret", now_unix(), raw.as_bytes()),
    );

    let result = broker.handle_webhook("psp_a", raw.as_bytes(), &headers).await;
    assert!(matches!(result, Err(Error::InvalidWebhookSignature)));

    let (processed,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM processed_webhook")
        .fetch_one(&pool)
        .await?;
    assert_eq!(processed, 0);

    Ok(())
}

#[tokio::test]
async fn unknown_provider_is_not_found() -> anyhow::Result<()> {
    let pool = helpers::setup_pool().await?;
    let broker = broker(&pool);

    let result = broker
        .handle_webhook("psp_x", b"{}", &WebhookHeaders::new())
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    Ok(())
}
