use foodcourtio_db::table::Notification;
use foodcourtio_shared::event::{DomainEvent, PublishedEvent};
use foodcourtio_shared::money::format_minor;
use foodcourtio_shared::{new_id, now_unix};
use foodcourtio_store::Subscriber;
use sea_query::{OnConflict, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::SqlitePool;

/// Outbox subscriber turning domain events into notification rows.
/// Idempotent: the dedupe key is derived from the event id, so redelivery
/// inserts nothing.
pub struct NotificationFanout {
    write_db: SqlitePool,
}

impl NotificationFanout {
    pub fn new(write_db: SqlitePool) -> Self {
        Self { write_db }
    }

    /// Recipient and wording per event kind; `None` means the kind is not
    /// user-facing.
    fn render(event: &DomainEvent) -> Option<(Option<String>, String)> {
        match event {
            DomainEvent::OrderCreated {
                order_number,
                total_minor,
                customer_principal_id,
                ..
            } => Some((
                customer_principal_id.clone(),
                format!(
                    "Order {order_number} received, total {}",
                    format_minor(*total_minor)
                ),
            )),
            DomainEvent::OrderStatusChanged {
                order_id, from, to, ..
            } => Some((None, format!("Order {order_id}: {from} -> {to}"))),
            DomainEvent::OrderCancelled {
                order_id, reason, ..
            } => Some((None, format!("Order {order_id} cancelled: {reason}"))),
            DomainEvent::PaymentSettled {
                order_id,
                amount_minor,
                ..
            } => Some((
                None,
                format!(
                    "Payment of {} settled for order {order_id}",
                    format_minor(*amount_minor)
                ),
            )),
            DomainEvent::PaymentFailed {
                order_id, reason, ..
            } => Some((None, format!("Payment failed for order {order_id}: {reason}"))),
            DomainEvent::PaymentRefunded {
                order_id,
                amount_minor,
                ..
            } => Some((
                None,
                format!(
                    "Refund of {} issued for order {order_id}",
                    format_minor(*amount_minor)
                ),
            )),
            DomainEvent::ShiftMissed { employee_id, .. } => {
                Some((None, format!("Employee {employee_id} missed a shift")))
            }
            DomainEvent::InviteConsumed { principal_id, .. } => Some((
                Some(principal_id.clone()),
                "Welcome aboard! Your employee access is ready.".to_owned(),
            )),
            DomainEvent::PaymentCreated { .. }
            | DomainEvent::ShiftStarted { .. }
            | DomainEvent::ShiftEnded { .. } => None,
        }
    }
}

#[async_trait::async_trait]
impl Subscriber for NotificationFanout {
    fn name(&self) -> &'static str {
        "notification_fanout"
    }

    async fn handle(&self, event: &PublishedEvent) -> anyhow::Result<()> {
        let Some((recipient, body)) = Self::render(&event.event) else {
            return Ok(());
        };

        let statement = Query::insert()
            .into_table(Notification::Table)
            .columns([
                Notification::Id,
                Notification::DedupeKey,
                Notification::RecipientPrincipalId,
                Notification::Kind,
                Notification::Body,
                Notification::CreatedAt,
            ])
            .values_panic([
                new_id().into(),
                format!("event:{}", event.id).into(),
                recipient.into(),
                event.event.kind().into(),
                body.into(),
                now_unix().into(),
            ])
            .on_conflict(
                OnConflict::column(Notification::DedupeKey)
                    .do_nothing()
                    .to_owned(),
            )
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let result = sqlx::query_with(&sql, values)
            .execute(&self.write_db)
            .await?;

        if result.rows_affected() == 1 {
            tracing::info!(
                event_id = %event.id,
                kind = event.event.kind(),
                "notification queued"
            );
        }

        Ok(())
    }
}
