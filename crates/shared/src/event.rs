use serde::{Deserialize, Serialize};

/// Domain events appended to the transactional outbox. Payloads carry the
/// identifiers a subscriber needs without loading the aggregate back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum DomainEvent {
    OrderCreated {
        order_id: String,
        restaurant_id: String,
        order_number: String,
        total_minor: i64,
        customer_principal_id: Option<String>,
    },
    OrderStatusChanged {
        order_id: String,
        restaurant_id: String,
        from: String,
        to: String,
        estimated_minutes: Option<i64>,
    },
    OrderCancelled {
        order_id: String,
        restaurant_id: String,
        reason: String,
    },
    PaymentCreated {
        payment_id: String,
        order_id: String,
        restaurant_id: String,
        method: String,
        amount_minor: i64,
    },
    PaymentSettled {
        payment_id: String,
        order_id: String,
        restaurant_id: String,
        amount_minor: i64,
    },
    PaymentFailed {
        payment_id: String,
        order_id: String,
        reason: String,
    },
    PaymentRefunded {
        payment_id: String,
        order_id: String,
        amount_minor: i64,
    },
    ShiftStarted {
        shift_id: String,
        employee_id: String,
        restaurant_id: String,
    },
    ShiftEnded {
        shift_id: String,
        employee_id: String,
        restaurant_id: String,
        minutes_worked: i64,
        pay_minor: Option<i64>,
    },
    ShiftMissed {
        shift_id: String,
        employee_id: String,
        restaurant_id: String,
    },
    InviteConsumed {
        invite_id: String,
        restaurant_id: String,
        employee_id: String,
        principal_id: String,
    },
}

impl DomainEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::OrderCreated { .. } => "OrderCreated",
            DomainEvent::OrderStatusChanged { .. } => "OrderStatusChanged",
            DomainEvent::OrderCancelled { .. } => "OrderCancelled",
            DomainEvent::PaymentCreated { .. } => "PaymentCreated",
            DomainEvent::PaymentSettled { .. } => "PaymentSettled",
            DomainEvent::PaymentFailed { .. } => "PaymentFailed",
            DomainEvent::PaymentRefunded { .. } => "PaymentRefunded",
            DomainEvent::ShiftStarted { .. } => "ShiftStarted",
            DomainEvent::ShiftEnded { .. } => "ShiftEnded",
            DomainEvent::ShiftMissed { .. } => "ShiftMissed",
            DomainEvent::InviteConsumed { .. } => "InviteConsumed",
        }
    }

    /// Aggregate the event belongs to; the outbox preserves per-aggregate
    /// publication order keyed on this pair.
    pub fn aggregate(&self) -> (&'static str, &str) {
        match self {
            DomainEvent::OrderCreated { order_id, .. }
            | DomainEvent::OrderStatusChanged { order_id, .. }
            | DomainEvent::OrderCancelled { order_id, .. } => ("order", order_id),
            DomainEvent::PaymentCreated { payment_id, .. }
            | DomainEvent::PaymentSettled { payment_id, .. }
            | DomainEvent::PaymentFailed { payment_id, .. }
            | DomainEvent::PaymentRefunded { payment_id, .. } => ("payment", payment_id),
            DomainEvent::ShiftStarted { shift_id, .. }
            | DomainEvent::ShiftEnded { shift_id, .. }
            | DomainEvent::ShiftMissed { shift_id, .. } => ("shift", shift_id),
            DomainEvent::InviteConsumed { invite_id, .. } => ("invite", invite_id),
        }
    }
}

/// Outbox row as delivered to subscribers. `id` is the idempotency key,
/// `seq` the commit-ordered position subscribers resume from.
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub id: String,
    pub seq: i64,
    pub created_at: i64,
    pub event: DomainEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let event = DomainEvent::OrderStatusChanged {
            order_id: "o1".into(),
            restaurant_id: "r1".into(),
            from: "Pending".into(),
            to: "Preparing".into(),
            estimated_minutes: Some(15),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.kind(), "OrderStatusChanged");
        assert_eq!(back.aggregate(), ("order", "o1"));
    }
}
