use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use foodcourtio_identity::repository::{self, FindType};
use foodcourtio_identity::verify_access_token;
use foodcourtio_shared::Error;
use foodcourtio_shared::principal::Principal;

use crate::error::ApiError;
use crate::routes::AppState;

/// The authenticated caller. The token authenticates the principal id;
/// role and existence are resolved from the store so revocations and
/// invite upgrades take effect without waiting for a token refresh.
#[derive(Clone, Debug)]
pub struct CurrentPrincipal(pub Principal);

impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError(Error::Unauthenticated))?;

        let identity = verify_access_token(
            bearer.token(),
            &state.config.auth.session_signing_secret,
        )?;

        let principal = repository::find(&state.read_db, FindType::Id(identity.principal_id))
            .await?
            .ok_or(Error::Unauthenticated)?;

        Ok(CurrentPrincipal(principal))
    }
}
