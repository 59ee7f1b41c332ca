use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use foodcourtio_shared::event::DomainEvent;
use foodcourtio_shared::money::commission_minor;
use foodcourtio_shared::{Error, Result, new_id, now_unix, validation};
use serde::Deserialize;
use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};
use validator::Validate;

use crate::adapter::{ChargeRequest, ProviderAdapter, WebhookEvent, WebhookHeaders, WebhookKind};
use crate::repository::{self, FindBy};
use crate::types::{Payment, PaymentMethod, PaymentStatus, RefundRecord};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePaymentInput {
    pub order_id: String,
    pub method: PaymentMethod,
    pub return_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CashPaymentInput {
    pub order_id: String,
    #[validate(range(min = 1))]
    pub amount_received_minor: i64,
    #[serde(skip)]
    pub processed_by_principal_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TerminalPaymentInput {
    pub order_id: String,
    #[validate(length(min = 1))]
    pub terminal_tx_id: String,
    #[validate(length(min = 1))]
    pub terminal_id: String,
    pub card_last4: Option<String>,
    pub card_brand: Option<String>,
    #[serde(skip)]
    pub processed_by_principal_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundInput {
    pub payment_id: String,
    /// Omitted means the full refundable remainder.
    pub amount_minor: Option<i64>,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct CreatedPayment {
    pub payment: Payment,
    pub redirect_url: Option<String>,
}

/// Owns the payment aggregate and dispatches to provider adapters. The
/// amount is always the order total; the commission split is frozen from
/// the restaurant's rate the moment the row is inserted.
#[derive(Clone)]
pub struct PaymentBroker {
    write_db: SqlitePool,
    adapters: HashMap<PaymentMethod, Arc<dyn ProviderAdapter>>,
    currency: String,
}

impl PaymentBroker {
    pub fn new(write_db: SqlitePool, currency: impl Into<String>) -> Self {
        Self {
            write_db,
            adapters: HashMap::new(),
            currency: currency.into(),
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(adapter.method(), adapter);
        self
    }

    fn adapter(&self, method: PaymentMethod) -> Result<&Arc<dyn ProviderAdapter>> {
        self.adapters
            .get(&method)
            .ok_or_else(|| Error::Server(anyhow!("no adapter registered for {method}")))
    }

    /// Opens an asynchronous card payment: one transaction inserts the
    /// Pending row with frozen commission, calls the provider, then stores
    /// the provider ref. A provider failure rolls everything back.
    pub async fn create_payment(&self, input: CreatePaymentInput) -> Result<CreatedPayment> {
        input.validate()?;
        if !input.method.is_async() {
            validation!("cash and terminal payments use their dedicated operations");
        }
        let adapter = self.adapter(input.method)?.clone();

        let input = &input;
        let adapter = &adapter;
        foodcourtio_store::with_retry(|| async move {
            let mut tx = self.write_db.begin().await.map_err(Error::from)?;
            let created =
                create_payment_in_tx(&mut tx, adapter.as_ref(), input, &self.currency).await?;
            tx.commit().await.map_err(Error::from)?;

            Ok(created)
        })
        .await
    }

    /// Cash settles synchronously: the row is inserted Completed with the
    /// received/change breakdown on the aggregate.
    pub async fn process_cash(&self, input: CashPaymentInput) -> Result<Payment> {
        input.validate()?;

        let input = &input;
        foodcourtio_store::with_retry(|| async move {
            let mut tx = self.write_db.begin().await.map_err(Error::from)?;
            let payment = process_cash_in_tx(&mut tx, input, &self.currency).await?;
            tx.commit().await.map_err(Error::from)?;

            Ok(payment)
        })
        .await
    }

    /// Terminal settles synchronously with the acquirer transaction data
    /// recorded on the aggregate.
    pub async fn process_terminal(&self, input: TerminalPaymentInput) -> Result<Payment> {
        input.validate()?;

        let input = &input;
        foodcourtio_store::with_retry(|| async move {
            let mut tx = self.write_db.begin().await.map_err(Error::from)?;
            let payment = process_terminal_in_tx(&mut tx, input, &self.currency).await?;
            tx.commit().await.map_err(Error::from)?;

            Ok(payment)
        })
        .await
    }

    /// Reconciles a provider webhook. The raw body is verified before
    /// anything touches the database; `(provider, event_id)` is claimed
    /// inside the same transaction as the state change, making replays
    /// no-ops.
    pub async fn handle_webhook(
        &self,
        provider: &str,
        raw: &[u8],
        headers: &WebhookHeaders,
    ) -> Result<()> {
        let method = method_for_provider(provider)
            .ok_or_else(|| Error::NotFound(format!("provider {provider}")))?;
        let event = self.adapter(method)?.verify_webhook(raw, headers)?;

        if let WebhookKind::Ignored { event_type } = &event.kind {
            tracing::info!(provider, event_type, "ignoring webhook event kind");
            return Ok(());
        }

        let event = &event;
        foodcourtio_store::with_retry(|| async move {
            let mut tx = self.write_db.begin().await.map_err(Error::from)?;
            apply_webhook(&mut tx, provider, event).await?;
            tx.commit().await.map_err(Error::from)?;

            Ok(())
        })
        .await
    }

    /// Owner-initiated refund, full or partial. The provider call happens
    /// synchronously; commission is only reversed when the payment becomes
    /// fully refunded.
    pub async fn refund(&self, input: RefundInput) -> Result<RefundRecord> {
        if input.reason.trim().is_empty() {
            validation!("refund requires a reason");
        }

        let input = &input;
        foodcourtio_store::with_retry(|| async move {
            let mut tx = self.write_db.begin().await.map_err(Error::from)?;
            let refund = self.refund_in_tx(&mut tx, input).await?;
            tx.commit().await.map_err(Error::from)?;

            Ok(refund)
        })
        .await
    }

    async fn refund_in_tx(
        &self,
        conn: &mut SqliteConnection,
        input: &RefundInput,
    ) -> Result<RefundRecord> {
        let payment = repository::find(&mut *conn, FindBy::Id(input.payment_id.clone()))
            .await?
            .ok_or_else(|| Error::NotFound(format!("payment {}", input.payment_id)))?;

        if payment.status != PaymentStatus::Completed {
            validation!("only a completed payment can be refunded");
        }

        let refunded = repository::refunded_total(&mut *conn, &payment.id).await?;
        let remaining = payment.amount_minor - refunded;
        let amount_minor = input.amount_minor.unwrap_or(remaining);
        if amount_minor <= 0 || amount_minor > remaining {
            validation!(
                "refund amount {amount_minor} exceeds the refundable remainder {remaining}"
            );
        }

        let provider_refund_ref = self
            .provider_refund(&payment, amount_minor, &input.reason)
            .await?;

        apply_refund(conn, &payment, amount_minor, &input.reason, provider_refund_ref).await
    }

    /// Card refunds go through the provider; cash and terminal refunds are
    /// recorded against the aggregate only.
    async fn provider_refund(
        &self,
        payment: &Payment,
        amount_minor: i64,
        reason: &str,
    ) -> Result<Option<String>> {
        if !payment.method.is_async() {
            return Ok(None);
        }

        let adapter = self.adapter(payment.method)?;
        let provider_ref = payment
            .provider_ref
            .as_deref()
            .ok_or_else(|| Error::Server(anyhow!("payment {} has no provider ref", payment.id)))?;

        let refund = adapter
            .refund(provider_ref, amount_minor, reason)
            .await
            .map_err(|err| match err {
                Error::ProviderUnavailable(message) => Error::RefundFailed(message),
                Error::Server(inner) => Error::RefundFailed(inner.to_string()),
                other => other,
            })?;

        Ok(Some(refund.refund_ref))
    }
}

async fn create_payment_in_tx(
    conn: &mut SqliteConnection,
    adapter: &dyn ProviderAdapter,
    input: &CreatePaymentInput,
    currency: &str,
) -> Result<CreatedPayment> {
    let (order, mut payment) = prepare_payment(conn, &input.order_id, input.method, currency).await?;

    repository::insert(&mut *conn, &payment).await?;

    let charge = adapter
        .create_charge(&ChargeRequest {
            payment_id: payment.id.clone(),
            order_id: order.id.clone(),
            amount_minor: payment.amount_minor,
            currency: payment.currency.clone(),
            description: format!("Order {}", order.order_number),
            return_url: input.return_url.clone(),
        })
        .await?;

    let metadata = json!({ "redirect_url": charge.redirect_url });
    repository::set_provider_ref(&mut *conn, &payment.id, &charge.provider_ref, &metadata).await?;

    foodcourtio_store::append(
        &mut *conn,
        &DomainEvent::PaymentCreated {
            payment_id: payment.id.clone(),
            order_id: order.id.clone(),
            restaurant_id: payment.restaurant_id.clone(),
            method: payment.method.to_string(),
            amount_minor: payment.amount_minor,
        },
    )
    .await?;

    payment.provider_ref = Some(charge.provider_ref.clone());
    payment.provider_metadata = Some(metadata);

    Ok(CreatedPayment {
        payment,
        redirect_url: charge.redirect_url,
    })
}

async fn process_cash_in_tx(
    conn: &mut SqliteConnection,
    input: &CashPaymentInput,
    currency: &str,
) -> Result<Payment> {
    let (order, mut payment) =
        prepare_payment(conn, &input.order_id, PaymentMethod::Cash, currency).await?;

    if input.amount_received_minor < payment.amount_minor {
        validation!(
            "received {} is less than the order total {}",
            input.amount_received_minor,
            payment.amount_minor
        );
    }

    payment.status = PaymentStatus::Completed;
    payment.details = Some(json!({
        "amount_received_minor": input.amount_received_minor,
        "change_given_minor": input.amount_received_minor - payment.amount_minor,
        "processed_by_principal_id": input.processed_by_principal_id,
    }));

    repository::insert(&mut *conn, &payment).await?;
    append_settled_pair(conn, &order.id, &payment).await?;

    Ok(payment)
}

async fn process_terminal_in_tx(
    conn: &mut SqliteConnection,
    input: &TerminalPaymentInput,
    currency: &str,
) -> Result<Payment> {
    let (order, mut payment) =
        prepare_payment(conn, &input.order_id, PaymentMethod::Terminal, currency).await?;

    payment.status = PaymentStatus::Completed;
    payment.details = Some(json!({
        "terminal_tx_id": input.terminal_tx_id,
        "terminal_id": input.terminal_id,
        "card_last4": input.card_last4,
        "card_brand": input.card_brand,
        "processed_by_principal_id": input.processed_by_principal_id,
    }));

    repository::insert(&mut *conn, &payment).await?;
    append_settled_pair(conn, &order.id, &payment).await?;

    Ok(payment)
}

/// Order lookup, 1:1 guard and the frozen commission split shared by all
/// payment creation paths.
async fn prepare_payment(
    conn: &mut SqliteConnection,
    order_id: &str,
    method: PaymentMethod,
    currency: &str,
) -> Result<(foodcourtio_order::Order, Payment)> {
    let order = foodcourtio_order::query::find(&mut *conn, order_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("order {order_id}")))?;

    if repository::find(&mut *conn, FindBy::OrderId(order.id.clone()))
        .await?
        .is_some()
    {
        return Err(Error::PaymentAlreadyExists(order.id.clone()));
    }

    let restaurant = foodcourtio_catalog::find_restaurant(&mut *conn, &order.restaurant_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("restaurant {}", order.restaurant_id)))?;

    let amount_minor = order.total_minor;
    let commission = commission_minor(amount_minor, restaurant.commission_rate_bp);
    let now = now_unix();

    let payment = Payment {
        id: new_id(),
        order_id: order.id.clone(),
        restaurant_id: order.restaurant_id.clone(),
        amount_minor,
        currency: currency.to_owned(),
        method,
        status: PaymentStatus::Pending,
        commission_minor: commission,
        net_minor: amount_minor - commission,
        provider_ref: None,
        provider_metadata: None,
        details: None,
        created_at: now,
        updated_at: now,
    };

    Ok((order, payment))
}

async fn append_settled_pair(
    conn: &mut SqliteConnection,
    order_id: &str,
    payment: &Payment,
) -> Result<()> {
    foodcourtio_store::append(
        &mut *conn,
        &DomainEvent::PaymentCreated {
            payment_id: payment.id.clone(),
            order_id: order_id.to_owned(),
            restaurant_id: payment.restaurant_id.clone(),
            method: payment.method.to_string(),
            amount_minor: payment.amount_minor,
        },
    )
    .await?;

    foodcourtio_store::append(
        &mut *conn,
        &DomainEvent::PaymentSettled {
            payment_id: payment.id.clone(),
            order_id: order_id.to_owned(),
            restaurant_id: payment.restaurant_id.clone(),
            amount_minor: payment.amount_minor,
        },
    )
    .await?;

    Ok(())
}

async fn apply_webhook(
    conn: &mut SqliteConnection,
    provider: &str,
    event: &WebhookEvent,
) -> Result<()> {
    if !repository::record_processed_webhook(&mut *conn, provider, &event.provider_event_id)
        .await?
    {
        tracing::info!(
            provider,
            provider_event_id = %event.provider_event_id,
            "duplicate webhook event, skipping"
        );
        return Ok(());
    }

    let Some(payment) =
        repository::find(&mut *conn, FindBy::ProviderRef(event.provider_ref.clone())).await?
    else {
        tracing::warn!(
            provider,
            provider_ref = %event.provider_ref,
            "webhook for unknown provider ref"
        );
        return Ok(());
    };

    match (&event.kind, payment.status) {
        (WebhookKind::ChargeSucceeded, PaymentStatus::Pending) => {
            repository::update_status(&mut *conn, &payment.id, PaymentStatus::Completed).await?;
            foodcourtio_store::append(
                &mut *conn,
                &DomainEvent::PaymentSettled {
                    payment_id: payment.id.clone(),
                    order_id: payment.order_id.clone(),
                    restaurant_id: payment.restaurant_id.clone(),
                    amount_minor: payment.amount_minor,
                },
            )
            .await?;
        }
        (WebhookKind::ChargeFailed { reason }, PaymentStatus::Pending) => {
            repository::update_status(&mut *conn, &payment.id, PaymentStatus::Failed).await?;
            foodcourtio_store::append(
                &mut *conn,
                &DomainEvent::PaymentFailed {
                    payment_id: payment.id.clone(),
                    order_id: payment.order_id.clone(),
                    reason: reason.clone(),
                },
            )
            .await?;
        }
        (WebhookKind::RefundSucceeded { amount_minor }, PaymentStatus::Completed) => {
            let refunded = repository::refunded_total(&mut *conn, &payment.id).await?;
            let remaining = payment.amount_minor - refunded;
            let amount_minor = amount_minor.unwrap_or(remaining).min(remaining);
            if amount_minor > 0 {
                apply_refund(conn, &payment, amount_minor, "provider refund", None).await?;
            }
        }
        _ => {
            // Replay against a terminal status; idempotent no-op.
            tracing::info!(
                payment_id = %payment.id,
                status = %payment.status,
                "webhook event ignored in current status"
            );
        }
    }

    Ok(())
}

/// Records the refund row, emits `PaymentRefunded` and, once the payment
/// is fully refunded, flips it to Refunded with commission and net
/// reversed to zero. Partial refunds never claw back commission.
async fn apply_refund(
    conn: &mut SqliteConnection,
    payment: &Payment,
    amount_minor: i64,
    reason: &str,
    provider_refund_ref: Option<String>,
) -> Result<RefundRecord> {
    let refund = RefundRecord {
        id: new_id(),
        payment_id: payment.id.clone(),
        amount_minor,
        reason: reason.to_owned(),
        provider_refund_ref,
        created_at: now_unix(),
    };
    repository::insert_refund(&mut *conn, &refund).await?;

    let refunded = repository::refunded_total(&mut *conn, &payment.id).await?;
    if refunded >= payment.amount_minor {
        repository::update_status(&mut *conn, &payment.id, PaymentStatus::Refunded).await?;
        repository::zero_commission(&mut *conn, &payment.id).await?;
    }

    foodcourtio_store::append(
        &mut *conn,
        &DomainEvent::PaymentRefunded {
            payment_id: payment.id.clone(),
            order_id: payment.order_id.clone(),
            amount_minor,
        },
    )
    .await?;

    Ok(refund)
}

fn method_for_provider(provider: &str) -> Option<PaymentMethod> {
    match provider {
        "psp_a" => Some(PaymentMethod::CardPspA),
        "psp_b" => Some(PaymentMethod::CardPspB),
        _ => None,
    }
}

/// Cancel-with-refund seam for the order engine: a full refund of the
/// order's Completed payment on the cancellation transaction.
#[async_trait::async_trait]
impl foodcourtio_order::RefundPort for PaymentBroker {
    async fn refund_completed_payment(
        &self,
        conn: &mut SqliteConnection,
        order_id: &str,
        reason: &str,
    ) -> Result<()> {
        let Some(payment) =
            repository::find(&mut *conn, FindBy::OrderId(order_id.to_owned())).await?
        else {
            return Ok(());
        };
        if payment.status != PaymentStatus::Completed {
            return Ok(());
        }

        let refunded = repository::refunded_total(&mut *conn, &payment.id).await?;
        let remaining = payment.amount_minor - refunded;
        if remaining <= 0 {
            return Ok(());
        }

        let provider_refund_ref = self.provider_refund(&payment, remaining, reason).await?;
        apply_refund(conn, &payment, remaining, reason, provider_refund_ref).await?;

        Ok(())
    }
}
