use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use foodcourtio_identity::{Action, ResourceScope};
use foodcourtio_order::query as order_query;
use foodcourtio_payment::repository::FindBy;
use foodcourtio_payment::{
    CashPaymentInput, CreatePaymentInput, Payment, RefundRecord, TerminalPaymentInput, repository,
};
use foodcourtio_shared::Error;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::CurrentPrincipal;
use crate::routes::AppState;

async fn order_scope_for(state: &AppState, order_id: &str) -> Result<ResourceScope, ApiError> {
    let order = order_query::find_from_pool(&state.read_db, order_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("order {order_id}")))?;

    Ok(ResourceScope {
        restaurant_id: Some(order.restaurant_id),
        order_customer_principal_id: order.customer_principal_id,
        order_status: Some(order.status.to_string()),
        employee_principal_id: None,
    })
}

#[derive(Serialize)]
pub struct CreatePaymentResponse {
    pub payment: Payment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(input): Json<CreatePaymentInput>,
) -> Result<(StatusCode, Json<CreatePaymentResponse>), ApiError> {
    let scope = order_scope_for(&state, &input.order_id).await?;
    state
        .access
        .authorize(&principal, Action::CreatePayment, &scope)
        .await?;

    let created = state.payments.create_payment(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePaymentResponse {
            payment: created.payment,
            redirect_url: created.redirect_url,
        }),
    ))
}

pub async fn cash(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(mut input): Json<CashPaymentInput>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let scope = order_scope_for(&state, &input.order_id).await?;
    state
        .access
        .authorize(&principal, Action::ProcessCashOrTerminal, &scope)
        .await?;

    input.processed_by_principal_id = principal.id.clone();
    let payment = state.payments.process_cash(input).await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn terminal(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(mut input): Json<TerminalPaymentInput>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let scope = order_scope_for(&state, &input.order_id).await?;
    state
        .access
        .authorize(&principal, Action::ProcessCashOrTerminal, &scope)
        .await?;

    input.processed_by_principal_id = principal.id.clone();
    let payment = state.payments.process_terminal(input).await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    let payment = repository::find_from_pool(&state.read_db, FindBy::Id(id.clone()))
        .await?
        .ok_or_else(|| Error::NotFound(format!("payment {id}")))?;

    let scope = order_scope_for(&state, &payment.order_id).await?;
    state
        .access
        .authorize(&principal, Action::ReadOrder, &scope)
        .await?;

    Ok(Json(payment))
}

#[derive(Deserialize)]
pub struct RefundRequest {
    pub amount_minor: Option<i64>,
    pub reason: String,
}

pub async fn refund(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
    Json(body): Json<RefundRequest>,
) -> Result<Json<RefundRecord>, ApiError> {
    let payment = repository::find_from_pool(&state.read_db, FindBy::Id(id.clone()))
        .await?
        .ok_or_else(|| Error::NotFound(format!("payment {id}")))?;

    state
        .access
        .authorize(
            &principal,
            Action::RefundPayment,
            &ResourceScope::restaurant(&payment.restaurant_id),
        )
        .await?;

    let refund = state
        .payments
        .refund(foodcourtio_payment::RefundInput {
            payment_id: id,
            amount_minor: body.amount_minor,
            reason: body.reason,
        })
        .await?;

    Ok(Json(refund))
}

/// Unauthenticated but signature-verified. A bad signature is logged and
/// answered with a bare 400; a valid replay is a 200 no-op.
pub async fn webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_lowercase(), value.to_owned()))
        })
        .collect();

    match state.payments.handle_webhook(&provider, &body, &headers).await {
        Ok(()) => Json(json!({ "received": true })).into_response(),
        Err(Error::InvalidWebhookSignature) => {
            tracing::warn!(provider = %provider, "webhook signature verification failed");
            StatusCode::BAD_REQUEST.into_response()
        }
        Err(err) => ApiError(err).into_response(),
    }
}
