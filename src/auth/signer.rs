//! HMAC-SHA1 URL signing for enterprise (client id) credentials.
//!
//! The signature is computed over the path and query string exactly as sent,
//! with the shared secret decoded from URL-safe base64. The result is URL-safe
//! base64 as well, so it can be appended to the query without further escaping.

use base64::{Engine, engine::general_purpose::URL_SAFE};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

/// Signs `payload` with the URL-safe base64 encoded `secret`.
///
/// Both inputs must be ASCII.
pub fn sign_hmac(secret: &str, payload: &str) -> Result<String> {
    if !payload.is_ascii() {
        return Err(Error::Encoding(format!(
            "cannot sign non-ASCII payload: {}",
            payload
        )));
    }
    if !secret.is_ascii() {
        return Err(Error::Encoding("client secret must be ASCII".to_string()));
    }

    let key = decode_secret(secret)?;
    let mut mac = HmacSha1::new_from_slice(&key)
        .map_err(|e| Error::Encoding(format!("invalid signing key: {}", e)))?;
    mac.update(payload.as_bytes());

    Ok(URL_SAFE.encode(mac.finalize().into_bytes()))
}

/// Decodes a URL-safe base64 client secret.
pub(crate) fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    URL_SAFE
        .decode(secret)
        .map_err(|e| Error::Encoding(format!("client secret is not URL-safe base64: {}", e)))
}
