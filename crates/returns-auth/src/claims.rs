//! Access credential payload inspection
//!
//! The backend issues JWT-shaped access credentials: three dot-separated
//! segments whose middle segment is base64url JSON carrying the expiry as a
//! unix-seconds `exp` claim. Nothing here verifies signatures; only the
//! backend can do that. This module answers two local questions: does a
//! stored string have credential shape at all, and when does it expire.
//!
//! Malformed input is never an error. A credential that doesn't decode is
//! treated exactly like a missing one, and the request path lets the backend
//! reject whatever was (not) sent.

use base64::Engine;
use base64::engine::general_purpose;

/// Whether a stored string is structurally a credential: exactly three
/// non-empty dot-separated segments. Says nothing about validity or expiry.
pub fn is_well_formed(credential: &str) -> bool {
    let mut count = 0;
    for segment in credential.split('.') {
        if segment.is_empty() {
            return false;
        }
        count += 1;
    }
    count == 3
}

/// Decoded expiry (unix seconds) from the credential payload.
///
/// Returns `None` for anything that doesn't decode: wrong segment count,
/// payload that isn't base64url, payload that isn't JSON, missing or
/// non-numeric `exp` claim.
pub fn expiry(credential: &str) -> Option<u64> {
    let segments: Vec<&str> = credential.split('.').collect();
    if segments.len() != 3 {
        return None;
    }
    let payload = general_purpose::URL_SAFE_NO_PAD.decode(segments[1]).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&payload).ok()?;
    claims.get("exp")?.as_u64()
}
