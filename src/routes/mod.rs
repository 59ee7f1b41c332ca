mod auth;
mod employees;
mod health;
mod orders;
mod payments;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use foodcourtio_identity::AccessResolver;
use foodcourtio_order::OrderEngine;
use foodcourtio_payment::PaymentBroker;
use foodcourtio_workforce::WorkforceLedger;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::middleware::{RateLimiter, rate_limit_middleware};

/// Everything a handler needs, built once at startup and passed
/// explicitly; no ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub read_db: SqlitePool,
    pub write_db: SqlitePool,
    pub access: AccessResolver,
    pub orders: OrderEngine,
    pub payments: PaymentBroker,
    pub workforce: WorkforceLedger,
    pub rate_limiter: Arc<RateLimiter>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/auth/session", post(auth::create_session))
        .route("/api/orders", post(orders::create))
        .route("/api/orders/{id}", get(orders::get))
        .route("/api/orders/{id}/status", patch(orders::transition))
        .route("/api/orders/{id}/cancel", post(orders::cancel))
        .route("/api/orders/bulk/status", post(orders::bulk_status))
        .route("/api/payments", post(payments::create))
        .route("/api/payments/cash", post(payments::cash))
        .route("/api/payments/terminal", post(payments::terminal))
        .route("/api/payments/{id}", get(payments::get))
        .route("/api/payments/{id}/refund", post(payments::refund))
        .route("/api/payments/webhooks/{provider}", post(payments::webhook))
        .route("/api/employees", post(employees::create))
        .route("/api/employees/{id}", patch(employees::update))
        .route("/api/employees/invites", post(employees::create_invite))
        .route(
            "/api/employees/invites/consume",
            post(employees::consume_invite),
        )
        .route("/api/employees/clock-in", post(employees::clock_in))
        .route("/api/employees/clock-out", post(employees::clock_out))
        .route(
            "/api/employees/shifts",
            get(employees::list_shifts).post(employees::schedule_shift),
        )
        .route("/api/employees/payroll", get(employees::payroll))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}
