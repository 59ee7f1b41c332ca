use foodcourtio_shared::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Envelope fields the signature check vouches for.
#[derive(Debug, Clone, PartialEq)]
pub struct InitData {
    pub external_id: String,
    pub display_name: Option<String>,
    pub auth_date: i64,
}

const KEY_DERIVATION_LABEL: &[u8] = b"SessionAuth";
const MAX_AGE_SECONDS: i64 = 24 * 60 * 60;

/// Validates a signed `key=value&…` identity envelope.
///
/// The check string is the percent-decoded fields minus `hash`, sorted by
/// key and joined as `key=value` lines. The signing key is
/// `HMAC-SHA256("SessionAuth", provider_secret)`; the comparison against
/// the `hash` field is constant-time. Envelopes older than 24h are
/// rejected.
pub fn verify_init_data(raw: &str, provider_secret: &str, now: i64) -> Result<InitData> {
    let mut fields: Vec<(String, String)> = Vec::new();
    let mut signature_hex: Option<String> = None;

    for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(Error::Unauthenticated);
        };
        let key = urlencoding::decode(key)
            .map_err(|_| Error::Unauthenticated)?
            .into_owned();
        let value = urlencoding::decode(value)
            .map_err(|_| Error::Unauthenticated)?
            .into_owned();

        if key == "hash" {
            signature_hex = Some(value);
        } else {
            fields.push((key, value));
        }
    }

    let Some(signature_hex) = signature_hex else {
        return Err(Error::Unauthenticated);
    };
    let signature = hex::decode(signature_hex).map_err(|_| Error::Unauthenticated)?;

    fields.sort();
    let check_string = fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut derivation =
        HmacSha256::new_from_slice(KEY_DERIVATION_LABEL).expect("hmac accepts any key length");
    derivation.update(provider_secret.as_bytes());
    let derived_key = derivation.finalize().into_bytes();

    let mut mac =
        HmacSha256::new_from_slice(&derived_key).expect("hmac accepts any key length");
    mac.update(check_string.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| Error::Unauthenticated)?;

    let field = |name: &str| {
        fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };

    let auth_date: i64 = field("auth_date")
        .and_then(|value| value.parse().ok())
        .ok_or(Error::Unauthenticated)?;
    if now - auth_date > MAX_AGE_SECONDS {
        return Err(Error::Unauthenticated);
    }

    let external_id = field("user_id").ok_or(Error::Unauthenticated)?;

    Ok(InitData {
        external_id,
        display_name: field("display_name"),
        auth_date,
    })
}

/// Test-side counterpart of [`verify_init_data`]; signs an envelope the
/// same way the upstream identity provider does.
pub fn sign_init_data(fields: &[(&str, &str)], provider_secret: &str) -> String {
    let mut sorted: Vec<(&str, &str)> = fields.to_vec();
    sorted.sort();
    let check_string = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut derivation =
        HmacSha256::new_from_slice(KEY_DERIVATION_LABEL).expect("hmac accepts any key length");
    derivation.update(provider_secret.as_bytes());
    let derived_key = derivation.finalize().into_bytes();

    let mut mac =
        HmacSha256::new_from_slice(&derived_key).expect("hmac accepts any key length");
    mac.update(check_string.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    let mut encoded: Vec<String> = fields
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect();
    encoded.push(format!("hash={signature}"));
    encoded.join("&")
}
