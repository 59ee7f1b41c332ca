use axum::Json;
use axum::extract::State;
use foodcourtio_identity::repository::{self, FindType};
use foodcourtio_identity::{issue_access_token, verify_init_data};
use foodcourtio_shared::principal::Principal;
use foodcourtio_shared::now_unix;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::AppState;

#[derive(Deserialize)]
pub struct SessionRequest {
    #[serde(rename = "initData")]
    pub init_data: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub principal: Principal,
}

/// Bootstrap exchange: validates the signed identity envelope and issues
/// an access token, creating a Customer principal on first contact.
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let now = now_unix();
    let data = verify_init_data(
        &body.init_data,
        &state.config.auth.session_signing_secret,
        now,
    )?;

    let existing = repository::find(
        &state.read_db,
        FindType::ExternalIdentityId(data.external_id.clone()),
    )
    .await?;

    let principal = match existing {
        Some(principal) => principal,
        None => {
            let external_id = data.external_id.clone();
            let created = foodcourtio_store::with_tx(&state.write_db, move |conn| {
                Box::pin(async move { repository::create_customer(conn, external_id).await })
            })
            .await;

            match created {
                Ok(principal) => principal,
                // Lost the first-contact race; the winner's row is ours.
                Err(err) => repository::find(
                    &state.read_db,
                    FindType::ExternalIdentityId(data.external_id.clone()),
                )
                .await?
                .ok_or(err)?,
            }
        }
    };

    let ttl = state.config.auth.access_token_ttl_seconds;
    let expires_at = now + ttl as i64;

    let principal_id = principal.id.clone();
    foodcourtio_store::with_tx(&state.write_db, move |conn| {
        Box::pin(async move {
            repository::create_session(conn, &principal_id, expires_at).await?;
            Ok(())
        })
    })
    .await?;

    let access_token = issue_access_token(
        &principal,
        &state.config.auth.session_signing_secret,
        now,
        ttl,
    )?;

    Ok(Json(SessionResponse {
        access_token,
        principal,
    }))
}
