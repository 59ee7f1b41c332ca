use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use foodcourtio_identity::{Action, ResourceScope};
use foodcourtio_order::{BulkItemResult, CreateOrderInput, Order, OrderStatus, query};
use foodcourtio_shared::Error;
use foodcourtio_shared::principal::Role;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::middleware::CurrentPrincipal;
use crate::routes::AppState;

fn order_scope(order: &Order) -> ResourceScope {
    ResourceScope {
        restaurant_id: Some(order.restaurant_id.clone()),
        order_customer_principal_id: order.customer_principal_id.clone(),
        order_status: Some(order.status.to_string()),
        employee_principal_id: None,
    }
}

async fn load_order(state: &AppState, id: &str) -> Result<Order, ApiError> {
    Ok(query::find_from_pool(&state.read_db, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("order {id}")))?)
}

pub async fn create(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(mut input): Json<CreateOrderInput>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    state
        .access
        .authorize(
            &principal,
            Action::CreateOrder,
            &ResourceScope::restaurant(&input.restaurant_id),
        )
        .await?;

    if principal.role == Role::Customer {
        input.customer_principal_id = Some(principal.id.clone());
    }

    let order = state.orders.create(input).await?;

    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order = load_order(&state, &id).await?;

    state
        .access
        .authorize(&principal, Action::ReadOrder, &order_scope(&order))
        .await?;

    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub status: OrderStatus,
    pub estimated_minutes: Option<i64>,
}

pub async fn transition(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
    Json(body): Json<TransitionRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = load_order(&state, &id).await?;

    state
        .access
        .authorize(&principal, Action::TransitionOrder, &order_scope(&order))
        .await?;

    let order = state
        .orders
        .transition(&id, body.status, body.estimated_minutes)
        .await?;

    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: String,
    #[serde(default)]
    pub refund: bool,
}

pub async fn cancel(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
    Json(body): Json<CancelRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = load_order(&state, &id).await?;

    state
        .access
        .authorize(&principal, Action::CancelOrder, &order_scope(&order))
        .await?;

    let order = state.orders.cancel(&id, &body.reason, body.refund).await?;

    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct BulkStatusRequest {
    pub order_ids: Vec<String>,
    pub status: OrderStatus,
    pub estimated_minutes: Option<i64>,
}

#[derive(Serialize)]
pub struct BulkStatusResponse {
    pub results: Vec<BulkItemResult>,
}

/// Per-item authorization, then one transaction per authorized order; a
/// failing item never blocks the rest.
pub async fn bulk_status(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(body): Json<BulkStatusRequest>,
) -> Result<Json<BulkStatusResponse>, ApiError> {
    let mut rejected = Vec::new();
    let mut authorized = Vec::new();

    for order_id in &body.order_ids {
        let outcome = match query::find_from_pool(&state.read_db, order_id).await? {
            None => Some(Error::NotFound(format!("order {order_id}"))),
            Some(order) => state
                .access
                .authorize(&principal, Action::TransitionOrder, &order_scope(&order))
                .await
                .err(),
        };

        match outcome {
            None => authorized.push(order_id.clone()),
            Some(err) => rejected.push(BulkItemResult {
                order_id: order_id.clone(),
                ok: false,
                code: Some(err.code().to_owned()),
                message: Some(err.to_string()),
            }),
        }
    }

    let mut results = rejected;
    results.extend(
        state
            .orders
            .bulk_transition(&authorized, body.status, body.estimated_minutes)
            .await,
    );

    Ok(Json(BulkStatusResponse { results }))
}
