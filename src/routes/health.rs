use axum::Json;
use axum::extract::State;
use foodcourtio_shared::Error;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::routes::AppState;

pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    sqlx::query("SELECT 1")
        .execute(&state.read_db)
        .await
        .map_err(Error::from)?;

    Ok(Json(json!({ "status": "ok" })))
}
