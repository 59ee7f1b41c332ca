mod psp_a;
mod psp_b;

use std::collections::HashMap;

use foodcourtio_shared::Result;
pub use psp_a::PspAAdapter;
pub use psp_b::PspBAdapter;

use crate::types::PaymentMethod;

/// Charge to open with a provider. Everything durable lives on the
/// payment aggregate; adapters stay stateless.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub payment_id: String,
    pub order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
    /// Where the provider sends the customer back after the hosted flow.
    pub return_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChargeCreated {
    pub provider_ref: String,
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RefundCreated {
    pub refund_ref: String,
}

/// Provider-specific headers of an incoming webhook, lower-cased names.
pub type WebhookHeaders = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookKind {
    ChargeSucceeded,
    ChargeFailed { reason: String },
    RefundSucceeded { amount_minor: Option<i64> },
    /// Signature-valid event kind the broker does not act on.
    Ignored { event_type: String },
}

/// Signature-verified webhook, normalized across providers.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Provider-side event id; the idempotency key in `processed_webhook`.
    pub provider_event_id: String,
    /// Charge reference the event concerns. Payments are resolved by this
    /// ref, never by our internal id.
    pub provider_ref: String,
    pub kind: WebhookKind,
}

#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn method(&self) -> PaymentMethod;

    async fn create_charge(&self, request: &ChargeRequest) -> Result<ChargeCreated>;

    async fn refund(
        &self,
        provider_ref: &str,
        amount_minor: i64,
        reason: &str,
    ) -> Result<RefundCreated>;

    /// Verifies signature and freshness over the raw body, then decodes
    /// the provider's event shape. Runs before anything is persisted.
    fn verify_webhook(&self, raw: &[u8], headers: &WebhookHeaders) -> Result<WebhookEvent>;
}
