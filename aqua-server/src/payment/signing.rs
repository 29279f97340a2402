//! HMAC-SHA256 signatures over the gateway's canonical form
//!
//! Canonical form: every field except `signature`, sorted by key, joined as
//! `key=value&key=value`. The signature is the lower-case hex digest.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_FIELD: &str = "signature";

/// Build the canonical string from any iterator of pairs
pub fn canonical_string<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs: Vec<(&str, &str)> = pairs
        .into_iter()
        .filter(|(k, _)| *k != SIGNATURE_FIELD)
        .collect();
    pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn mac_for(secret: &str, canonical: &str) -> Result<HmacSha256, &'static str> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(canonical.as_bytes());
    Ok(mac)
}

/// Sign a set of request fields with the merchant secret
pub fn sign<'a, I>(secret: &str, pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let canonical = canonical_string(pairs);
    match mac_for(secret, &canonical) {
        Ok(mac) => hex::encode(mac.finalize().into_bytes()),
        // HMAC accepts keys of any length
        Err(_) => String::new(),
    }
}

/// Verify a hex signature in constant time
pub fn verify<'a, I>(secret: &str, pairs: I, signature: &str) -> Result<(), &'static str>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    if signature.is_empty() {
        return Err("Missing signature");
    }
    let expected = hex::decode(signature.trim()).map_err(|_| "Invalid signature hex")?;
    let mac = mac_for(secret, &canonical_string(pairs))?;
    mac.verify_slice(&expected).map_err(|_| "Signature mismatch")
}
