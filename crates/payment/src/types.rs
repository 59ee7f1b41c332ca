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
    Hash,
    Serialize,
    Deserialize,
)]
pub enum PaymentMethod {
    CardPspA,
    CardPspB,
    Cash,
    Terminal,
}

impl PaymentMethod {
    /// Card methods settle through an asynchronous provider webhook; cash
    /// and terminal complete at insertion.
    pub fn is_async(self) -> bool {
        matches!(self, PaymentMethod::CardPspA | PaymentMethod::CardPspB)
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
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Refund is the single sanctioned exit from `Completed`; everything
    /// else here is final.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::Failed | PaymentStatus::Refunded
        )
    }
}

/// The payment aggregate. `commission_minor` and `net_minor` are frozen at
/// creation from the restaurant's rate; a full refund reverses them to
/// zero as part of the `Completed -> Refunded` transition, after which the
/// aggregate is immutable.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub restaurant_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub commission_minor: i64,
    pub net_minor: i64,
    pub provider_ref: Option<String>,
    pub provider_metadata: Option<serde_json::Value>,
    pub details: Option<serde_json::Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundRecord {
    pub id: String,
    pub payment_id: String,
    pub amount_minor: i64,
    pub reason: String,
    pub provider_refund_ref: Option<String>,
    pub created_at: i64,
}
