use foodcourtio_shared::event::DomainEvent;
use foodcourtio_shared::{Error, Result, now_unix, validation};
use sqlx::SqliteConnection;

use crate::command::{OrderEngine, RefundPort};
use crate::repository;
use crate::types::{Order, OrderStatus};

impl OrderEngine {
    /// Cancels a non-terminal order. With `refund = true` the payment
    /// broker refunds the order's Completed payment on this same
    /// transaction first; a failed refund aborts the cancellation, leaving
    /// order and payment untouched.
    pub async fn cancel(&self, order_id: &str, reason: &str, refund: bool) -> Result<Order> {
        if reason.trim().is_empty() {
            validation!("cancellation requires a reason");
        }

        foodcourtio_store::with_retry(|| async move {
            let mut tx = self.write_db().begin().await.map_err(Error::from)?;
            let order = cancel_in_tx(
                &mut tx,
                self.refund_port().as_ref(),
                order_id,
                reason,
                refund,
            )
            .await?;
            tx.commit().await.map_err(Error::from)?;

            Ok(order)
        })
        .await
    }
}

async fn cancel_in_tx(
    conn: &mut SqliteConnection,
    refund_port: &dyn RefundPort,
    order_id: &str,
    reason: &str,
    refund: bool,
) -> Result<Order> {
    let mut order = repository::find(&mut *conn, order_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("order {order_id}")))?;

    if order.status.is_terminal() {
        return Err(Error::IllegalTransition {
            from: order.status.to_string(),
            to: OrderStatus::Cancelled.to_string(),
        });
    }

    if refund {
        refund_port
            .refund_completed_payment(&mut *conn, order_id, reason)
            .await?;
    }

    repository::update_status(&mut *conn, order_id, OrderStatus::Cancelled).await?;

    foodcourtio_store::append(
        &mut *conn,
        &DomainEvent::OrderCancelled {
            order_id: order.id.clone(),
            restaurant_id: order.restaurant_id.clone(),
            reason: reason.to_owned(),
        },
    )
    .await?;

    order.status = OrderStatus::Cancelled;
    order.updated_at = now_unix();

    Ok(order)
}
