use std::time::Duration;

use anyhow::anyhow;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use foodcourtio_shared::{Error, Result};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use url::Url;

use super::{
    ChargeCreated, ChargeRequest, ProviderAdapter, RefundCreated, WebhookEvent, WebhookHeaders,
    WebhookKind,
};
use crate::types::PaymentMethod;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEADER: &str = "content-hmac";
const EVENT_ID_HEADER: &str = "x-request-id";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Card PSP B: invoice redirect flow authenticated by `shop_id:secret`,
/// webhooks signed with a base64 HMAC-SHA256 over the raw body.
pub struct PspBAdapter {
    http: reqwest::Client,
    base_url: Url,
    shop_id: String,
    secret: String,
}

#[derive(Deserialize)]
struct InvoiceResponse {
    id: String,
    confirmation_url: Option<String>,
}

#[derive(Deserialize)]
struct RefundResponse {
    id: String,
}

#[derive(Deserialize)]
struct EventBody {
    event: String,
    object: EventObject,
}

#[derive(Deserialize)]
struct EventObject {
    id: String,
    #[serde(default)]
    cancellation_reason: Option<String>,
    #[serde(default)]
    amount_minor: Option<i64>,
}

impl PspBAdapter {
    pub fn new(base_url: &str, shop_id: String, secret: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| Error::Server(err.into()))?;
        let base_url = Url::parse(base_url).map_err(|err| Error::Server(err.into()))?;

        Ok(Self {
            http,
            base_url,
            shop_id,
            secret,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| Error::Server(err.into()))
    }

    /// Test-side counterpart of webhook verification.
    pub fn sign_webhook(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("hmac accepts any key length");
        mac.update(body);

        BASE64.encode(mac.finalize().into_bytes())
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for PspBAdapter {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::CardPspB
    }

    async fn create_charge(&self, request: &ChargeRequest) -> Result<ChargeCreated> {
        let body = json!({
            "amount": { "value_minor": request.amount_minor, "currency": request.currency },
            "description": request.description,
            "metadata": {
                "payment_id": request.payment_id,
                "order_id": request.order_id,
            },
            "confirmation": { "type": "redirect", "return_url": request.return_url },
        });

        let response = self
            .http
            .post(self.endpoint("v2/invoices")?)
            .basic_auth(&self.shop_id, Some(&self.secret))
            .json(&body)
            .send()
            .await
            .map_err(|err| Error::ProviderUnavailable(format!("psp_b: {err}")))?;

        let response = check_status(response)?;
        let invoice: InvoiceResponse = response
            .json()
            .await
            .map_err(|err| Error::ProviderUnavailable(format!("psp_b: {err}")))?;

        Ok(ChargeCreated {
            provider_ref: invoice.id,
            redirect_url: invoice.confirmation_url,
        })
    }

    async fn refund(
        &self,
        provider_ref: &str,
        amount_minor: i64,
        reason: &str,
    ) -> Result<RefundCreated> {
        let body = json!({
            "invoice_id": provider_ref,
            "amount": { "value_minor": amount_minor },
            "reason": reason,
        });

        let response = self
            .http
            .post(self.endpoint("v2/refunds")?)
            .basic_auth(&self.shop_id, Some(&self.secret))
            .json(&body)
            .send()
            .await
            .map_err(|err| Error::ProviderUnavailable(format!("psp_b: {err}")))?;

        let response = check_status(response)?;
        let refund: RefundResponse = response
            .json()
            .await
            .map_err(|err| Error::ProviderUnavailable(format!("psp_b: {err}")))?;

        Ok(RefundCreated {
            refund_ref: refund.id,
        })
    }

    fn verify_webhook(&self, raw: &[u8], headers: &WebhookHeaders) -> Result<WebhookEvent> {
        let header = headers
            .get(SIGNATURE_HEADER)
            .ok_or(Error::InvalidWebhookSignature)?;
        let signature = BASE64
            .decode(header)
            .map_err(|_| Error::InvalidWebhookSignature)?;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("hmac accepts any key length");
        mac.update(raw);
        mac.verify_slice(&signature)
            .map_err(|_| Error::InvalidWebhookSignature)?;

        let provider_event_id = headers
            .get(EVENT_ID_HEADER)
            .cloned()
            .ok_or(Error::InvalidWebhookSignature)?;

        let event: EventBody = serde_json::from_slice(raw)
            .map_err(|err| Error::Server(anyhow!("psp_b webhook body: {err}")))?;

        let kind = match event.event.as_str() {
            "invoice.succeeded" => WebhookKind::ChargeSucceeded,
            "invoice.canceled" => WebhookKind::ChargeFailed {
                reason: event
                    .object
                    .cancellation_reason
                    .unwrap_or_else(|| event.event.clone()),
            },
            "refund.succeeded" => WebhookKind::RefundSucceeded {
                amount_minor: event.object.amount_minor,
            },
            _ => WebhookKind::Ignored {
                event_type: event.event.clone(),
            },
        };

        Ok(WebhookEvent {
            provider_event_id,
            provider_ref: event.object.id,
            kind,
        })
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status.is_server_error() {
        Err(Error::ProviderUnavailable(format!(
            "psp_b returned {status}"
        )))
    } else {
        Err(Error::Server(anyhow!("psp_b rejected the request: {status}")))
    }
}
