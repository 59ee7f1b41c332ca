use foodcourtio_shared::principal::{Principal, Role};
use foodcourtio_shared::{Error, Result};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Access token claims issued after the bootstrap exchange.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: u64,
}

/// Identity carried by a verified access token. The role is a snapshot
/// from issue time; a consumed invite becomes visible on refresh.
#[derive(Debug, Clone)]
pub struct TokenIdentity {
    pub principal_id: String,
    pub role: Role,
}

pub fn issue_access_token(
    principal: &Principal,
    secret: &str,
    now: i64,
    lifetime_seconds: u64,
) -> Result<String> {
    let claims = Claims {
        sub: principal.id.clone(),
        role: principal.role,
        exp: now as u64 + lifetime_seconds,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| Error::Server(err.into()))?;

    Ok(token)
}

pub fn verify_access_token(token: &str, secret: &str) -> Result<TokenIdentity> {
    let validation = Validation::default();

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| Error::Unauthenticated)?;

    Ok(TokenIdentity {
        principal_id: token_data.claims.sub,
        role: token_data.claims.role,
    })
}
