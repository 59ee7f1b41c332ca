use foodcourtio_shared::event::DomainEvent;
use foodcourtio_shared::{Error, Result, now_unix, validation};
use sqlx::SqliteConnection;

use crate::command::OrderEngine;
use crate::repository;
use crate::types::{Order, OrderStatus};

impl OrderEngine {
    /// Moves an order along the lifecycle. Cancellation goes through
    /// [`OrderEngine::cancel`], which demands a reason and settles any
    /// completed payment.
    pub async fn transition(
        &self,
        order_id: &str,
        to: OrderStatus,
        estimated_minutes: Option<i64>,
    ) -> Result<Order> {
        if let Some(minutes) = estimated_minutes
            && minutes < 0
        {
            validation!("estimated minutes must be non-negative");
        }
        if to == OrderStatus::Cancelled {
            validation!("cancellation requires the cancel operation");
        }

        foodcourtio_store::with_retry(|| async move {
            let mut tx = self.write_db().begin().await.map_err(Error::from)?;
            let order = transition_in_tx(&mut tx, order_id, to, estimated_minutes).await?;
            tx.commit().await.map_err(Error::from)?;

            Ok(order)
        })
        .await
    }
}

async fn transition_in_tx(
    conn: &mut SqliteConnection,
    order_id: &str,
    to: OrderStatus,
    estimated_minutes: Option<i64>,
) -> Result<Order> {
    let mut order = repository::find(&mut *conn, order_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("order {order_id}")))?;

    if !order.status.can_transition(to) {
        return Err(Error::IllegalTransition {
            from: order.status.to_string(),
            to: to.to_string(),
        });
    }

    repository::update_status(&mut *conn, order_id, to).await?;

    foodcourtio_store::append(
        &mut *conn,
        &DomainEvent::OrderStatusChanged {
            order_id: order.id.clone(),
            restaurant_id: order.restaurant_id.clone(),
            from: order.status.to_string(),
            to: to.to_string(),
            estimated_minutes,
        },
    )
    .await?;

    order.status = to;
    order.updated_at = now_unix();

    Ok(order)
}
