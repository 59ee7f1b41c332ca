use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

#[derive(
    EnumString,
    VariantArray,
    Display,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// The exhaustive transition table. Cancellation is reachable from any
    /// non-terminal state; everything else moves one step forward.
    pub fn can_transition(self, to: OrderStatus) -> bool {
        use OrderStatus::*;

        matches!(
            (self, to),
            (Pending, Preparing)
                | (Pending, Cancelled)
                | (Preparing, Ready)
                | (Preparing, Cancelled)
                | (Ready, Completed)
                | (Ready, Cancelled)
        )
    }
}

#[derive(
    EnumString,
    VariantArray,
    Display,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
pub enum DeliveryType {
    DineIn,
    Takeaway,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub variant_label: Option<String>,
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub line_total_minor: i64,
    pub special_instructions: Option<String>,
}

/// The order aggregate, hydrated with its items.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: String,
    pub restaurant_id: String,
    pub order_number: String,
    pub dining_table_id: Option<String>,
    pub customer_principal_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_type: DeliveryType,
    pub status: OrderStatus,
    pub total_minor: i64,
    pub special_instructions: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: i64,
    pub updated_at: i64,
}
