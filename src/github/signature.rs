//! GitHub webhook signature verification (`X-Hub-Signature`, HMAC-SHA1).

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::{BridgeError, BridgeResult};

pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";
const SIGNATURE_PREFIX: &str = "sha1=";

type HmacSha1 = Hmac<Sha1>;

fn keyed_mac(secret: &str) -> BridgeResult<HmacSha1> {
    HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| BridgeError::SignatureError(format!("Invalid secret: {}", e)))
}

/// Computes the header value GitHub would send for `body`.
pub fn sign(secret: &str, body: &[u8]) -> BridgeResult<String> {
    let mac = keyed_mac(secret)?.chain_update(body).finalize().into_bytes();
    Ok(format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac)))
}

/// Checks `header` against the HMAC of `body`. The digest comparison is
/// constant time.
pub fn verify_signature(secret: &str, body: &[u8], header: Option<&str>) -> BridgeResult<()> {
    let header = header
        .ok_or_else(|| BridgeError::SignatureError("missing signature header".to_string()))?;

    let digest_hex = header
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or_else(|| BridgeError::SignatureError("unsupported signature scheme".to_string()))?;

    // GitHub sends lowercase hex; anything else is a different header value.
    if digest_hex.len() != 40
        || !digest_hex
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return Err(BridgeError::SignatureError(
            "malformed signature: expected 40 lowercase hex digits".to_string(),
        ));
    }

    let expected = hex::decode(digest_hex)
        .map_err(|e| BridgeError::SignatureError(format!("malformed signature: {}", e)))?;

    keyed_mac(secret)?
        .chain_update(body)
        .verify_slice(&expected)
        .map_err(|_| BridgeError::SignatureError("digest mismatch".to_string()))
}
