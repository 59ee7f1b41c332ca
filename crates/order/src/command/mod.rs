mod cancel;
mod create;
mod transition;

use std::sync::Arc;

pub use create::{CreateOrderInput, CreateOrderItemInput};
use foodcourtio_shared::Result;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

/// Seam to the payment broker for cancel-with-refund. Runs on the cancel
/// transaction so a failed refund rolls the whole cancellation back.
#[async_trait::async_trait]
pub trait RefundPort: Send + Sync {
    /// Refunds the order's Completed payment in full, if there is one.
    /// A payment that is absent or not Completed is a no-op `Ok`.
    async fn refund_completed_payment(
        &self,
        conn: &mut SqliteConnection,
        order_id: &str,
        reason: &str,
    ) -> Result<()>;
}

/// Owns the order aggregate: validation, pricing, numbering and the
/// lifecycle state machine.
#[derive(Clone)]
pub struct OrderEngine {
    write_db: SqlitePool,
    refund_port: Arc<dyn RefundPort>,
}

impl OrderEngine {
    pub fn new(write_db: SqlitePool, refund_port: Arc<dyn RefundPort>) -> Self {
        Self {
            write_db,
            refund_port,
        }
    }

    pub(crate) fn write_db(&self) -> &SqlitePool {
        &self.write_db
    }

    pub(crate) fn refund_port(&self) -> &Arc<dyn RefundPort> {
        &self.refund_port
    }
}

/// Per-order outcome of a bulk transition; failures never affect the
/// other orders in the batch.
#[derive(Debug, Clone, Serialize)]
pub struct BulkItemResult {
    pub order_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BulkItemResult {
    fn ok(order_id: &str) -> Self {
        Self {
            order_id: order_id.to_owned(),
            ok: true,
            code: None,
            message: None,
        }
    }

    fn failed(order_id: &str, err: &foodcourtio_shared::Error) -> Self {
        Self {
            order_id: order_id.to_owned(),
            ok: false,
            code: Some(err.code().to_owned()),
            message: Some(err.to_string()),
        }
    }
}

impl OrderEngine {
    /// Applies one target status to many orders, each in its own
    /// transaction, reporting per-id outcomes.
    pub async fn bulk_transition(
        &self,
        order_ids: &[String],
        to: crate::OrderStatus,
        estimated_minutes: Option<i64>,
    ) -> Vec<BulkItemResult> {
        let mut results = Vec::with_capacity(order_ids.len());

        for order_id in order_ids {
            match self.transition(order_id, to, estimated_minutes).await {
                Ok(_) => results.push(BulkItemResult::ok(order_id)),
                Err(err) => {
                    tracing::warn!(order_id = %order_id, err = %err, "bulk transition item failed");
                    results.push(BulkItemResult::failed(order_id, &err));
                }
            }
        }

        results
    }
}
