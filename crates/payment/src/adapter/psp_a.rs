use std::time::Duration;

use anyhow::anyhow;
use foodcourtio_shared::{Error, Result, now_unix};
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

const SIGNATURE_HEADER: &str = "x-pspa-signature";
const SIGNATURE_MAX_AGE_SECONDS: i64 = 300;
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Card PSP A: PaymentIntent-style hosted flow, settlement via webhook
/// signed `t=<unix>,v1=<hex hmac-sha256(secret, "<t>.<body>")>`.
pub struct PspAAdapter {
    http: reqwest::Client,
    base_url: Url,
    secret: String,
}

#[derive(Deserialize)]
struct ChargeResponse {
    id: String,
    redirect_url: Option<String>,
}

#[derive(Deserialize)]
struct RefundResponse {
    id: String,
}

#[derive(Deserialize)]
struct EventBody {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: EventData,
}

#[derive(Deserialize)]
struct EventData {
    object: EventObject,
}

#[derive(Deserialize)]
struct EventObject {
    id: String,
    failure_message: Option<String>,
    amount_refunded: Option<i64>,
}

impl PspAAdapter {
    pub fn new(base_url: &str, secret: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| Error::Server(err.into()))?;
        let base_url = Url::parse(base_url).map_err(|err| Error::Server(err.into()))?;

        Ok(Self {
            http,
            base_url,
            secret,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| Error::Server(err.into()))
    }

    /// Test-side counterpart of webhook verification: the signature header
    /// value the provider would attach to `body` at `timestamp`.
    pub fn sign_webhook(secret: &str, timestamp: i64, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("hmac accepts any key length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);

        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for PspAAdapter {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::CardPspA
    }

    async fn create_charge(&self, request: &ChargeRequest) -> Result<ChargeCreated> {
        let body = json!({
            "amount": request.amount_minor,
            "currency": request.currency,
            "description": request.description,
            "metadata": {
                "payment_id": request.payment_id,
                "order_id": request.order_id,
            },
            "return_url": request.return_url,
        });

        let response = self
            .http
            .post(self.endpoint("v1/charges")?)
            .bearer_auth(&self.secret)
            .json(&body)
            .send()
            .await
            .map_err(|err| Error::ProviderUnavailable(format!("psp_a: {err}")))?;

        let response = check_status(response)?;
        let charge: ChargeResponse = response
            .json()
            .await
            .map_err(|err| Error::ProviderUnavailable(format!("psp_a: {err}")))?;

        Ok(ChargeCreated {
            provider_ref: charge.id,
            redirect_url: charge.redirect_url,
        })
    }

    async fn refund(
        &self,
        provider_ref: &str,
        amount_minor: i64,
        reason: &str,
    ) -> Result<RefundCreated> {
        let response = self
            .http
            .post(self.endpoint(&format!("v1/charges/{provider_ref}/refunds"))?)
            .bearer_auth(&self.secret)
            .json(&json!({ "amount": amount_minor, "reason": reason }))
            .send()
            .await
            .map_err(|err| Error::ProviderUnavailable(format!("psp_a: {err}")))?;

        let response = check_status(response)?;
        let refund: RefundResponse = response
            .json()
            .await
            .map_err(|err| Error::ProviderUnavailable(format!("psp_a: {err}")))?;

        Ok(RefundCreated {
            refund_ref: refund.id,
        })
    }

    fn verify_webhook(&self, raw: &[u8], headers: &WebhookHeaders) -> Result<WebhookEvent> {
        let header = headers
            .get(SIGNATURE_HEADER)
            .ok_or(Error::InvalidWebhookSignature)?;

        let mut timestamp: Option<i64> = None;
        let mut signature: Option<Vec<u8>> = None;
        for part in header.split(',') {
            match part.split_once('=') {
                Some(("t", value)) => timestamp = value.parse().ok(),
                Some(("v1", value)) => signature = hex::decode(value).ok(),
                _ => {}
            }
        }
        let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
            return Err(Error::InvalidWebhookSignature);
        };

        if (now_unix() - timestamp).abs() > SIGNATURE_MAX_AGE_SECONDS {
            return Err(Error::InvalidWebhookSignature);
        }

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("hmac accepts any key length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(raw);
        mac.verify_slice(&signature)
            .map_err(|_| Error::InvalidWebhookSignature)?;

        let event: EventBody = serde_json::from_slice(raw)
            .map_err(|err| Error::Server(anyhow!("psp_a webhook body: {err}")))?;

        let kind = match event.event_type.as_str() {
            "charge.succeeded" => WebhookKind::ChargeSucceeded,
            "charge.failed" | "charge.canceled" => WebhookKind::ChargeFailed {
                reason: event
                    .data
                    .object
                    .failure_message
                    .unwrap_or_else(|| event.event_type.clone()),
            },
            "refund.succeeded" => WebhookKind::RefundSucceeded {
                amount_minor: event.data.object.amount_refunded,
            },
            _ => WebhookKind::Ignored {
                event_type: event.event_type.clone(),
            },
        };

        Ok(WebhookEvent {
            provider_event_id: event.id,
            provider_ref: event.data.object.id,
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
            "psp_a returned {status}"
        )))
    } else {
        Err(Error::Server(anyhow!("psp_a rejected the request: {status}")))
    }
}
