use hmac::{Hmac, Mac};
use sha1::Sha1;
use thiserror::Error;

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the webhook body signature, formatted `sha1=<hex digest>`.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";

const SIGNATURE_PREFIX: &str = "sha1=";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing X-Hub-Signature header")]
    Missing,
    #[error("malformed signature: {0}")]
    Malformed(String),
    #[error("signature does not match request body")]
    Mismatch,
}

fn keyed(secret: &[u8]) -> Result<HmacSha1, SignatureError> {
    HmacSha1::new_from_slice(secret).map_err(|err| SignatureError::Malformed(err.to_string()))
}

/// Hex HMAC-SHA1 of `body` keyed with the app's client secret.
pub fn sign(secret: &[u8], body: &[u8]) -> Result<String, SignatureError> {
    let mut mac = keyed(secret)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a `sha1=<hex>` header value against the raw request body in constant time.
pub fn verify(secret: &[u8], body: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::Missing)?.trim();
    let encoded = header
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or_else(|| SignatureError::Malformed(format!("expected '{SIGNATURE_PREFIX}' prefix")))?;
    let expected = hex::decode(encoded).map_err(|err| SignatureError::Malformed(err.to_string()))?;

    let mut mac = keyed(secret)?;
    mac.update(body);
    mac.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)
}
