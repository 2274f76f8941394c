//! Test user identity
//!
//! Tokens are JWTs; the harness only reads their claims to learn the user
//! name and never verifies signatures.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::checksum::sha1_hex;

/// Claims that carry the user name, in lookup order
const USER_CLAIMS: [&str; 2] = ["https://platform.neuromation.io/user", "identity"];

/// Read the user name from a token's claims
///
/// Returns `None` for opaque tokens, malformed JWTs and tokens without a
/// user claim.
pub fn user_name_from_token(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;

    USER_CLAIMS
        .iter()
        .find_map(|claim| claims.get(claim)?.as_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Name of the `index`-th user provisioned for a cluster
///
/// Stable per cluster so reruns reuse the same accounts.
pub fn default_user_name(cluster_name: &str, index: u32) -> String {
    let digest = sha1_hex(cluster_name.as_bytes());
    format!("neuro-{}-{}", &digest[..16], index)
}
