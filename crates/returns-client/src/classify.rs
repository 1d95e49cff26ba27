//! Response classification for the decorated request path
//!
//! Decides whether a response is a credential rejection (drive the renewal
//! path) or anything else (hand it back to the caller unchanged). The backend
//! signals an expired or invalid access credential as 401, and a structurally
//! broken one as 422 with a message naming the token. Every other status,
//! success or failure, belongs to the caller; in particular 403 means the
//! user lacks rights to the resource, which no renewal can fix.

use reqwest::StatusCode;

/// How the request path should treat a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// Hand the response to the caller as-is.
    Pass,
    /// The access credential was rejected; renew and replay.
    CredentialRejected,
}

/// Classify a buffered response by status and body.
pub fn classify(status: StatusCode, body: &[u8]) -> ResponseClass {
    match status.as_u16() {
        401 => ResponseClass::CredentialRejected,
        422 if mentions_token(body) => ResponseClass::CredentialRejected,
        _ => ResponseClass::Pass,
    }
}

/// Whether a 422 body is a credential complaint rather than an ordinary
/// validation failure. The backend reports these under `msg` ("Not enough
/// segments in token") or `message` depending on the handler.
fn mentions_token(body: &[u8]) -> bool {
    let Ok(parsed) = serde_json::from_slice::<serde_json::Value>(body) else {
        return false;
    };
    parsed
        .get("message")
        .or_else(|| parsed.get("msg"))
        .and_then(|m| m.as_str())
        .is_some_and(|m| m.to_lowercase().contains("token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_rejection_regardless_of_body() {
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, b""),
            ResponseClass::CredentialRejected
        );
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, br#"{"msg":"Token has expired"}"#),
            ResponseClass::CredentialRejected
        );
    }

    #[test]
    fn unprocessable_with_token_message_is_rejection() {
        let body = br#"{"message":"Signature verification failed in token"}"#;
        assert_eq!(
            classify(StatusCode::UNPROCESSABLE_ENTITY, body),
            ResponseClass::CredentialRejected
        );
    }

    #[test]
    fn unprocessable_with_msg_key_is_rejection() {
        let body = br#"{"msg":"Not enough segments in token"}"#;
        assert_eq!(
            classify(StatusCode::UNPROCESSABLE_ENTITY, body),
            ResponseClass::CredentialRejected
        );
    }

    #[test]
    fn token_match_is_case_insensitive() {
        let body = br#"{"msg":"Bad TOKEN header"}"#;
        assert_eq!(
            classify(StatusCode::UNPROCESSABLE_ENTITY, body),
            ResponseClass::CredentialRejected
        );
    }

    #[test]
    fn ordinary_validation_failure_passes() {
        let body = br#"{"message":"product_id is required"}"#;
        assert_eq!(
            classify(StatusCode::UNPROCESSABLE_ENTITY, body),
            ResponseClass::Pass
        );
    }

    #[test]
    fn non_json_422_passes() {
        assert_eq!(
            classify(StatusCode::UNPROCESSABLE_ENTITY, b"<html>oops</html>"),
            ResponseClass::Pass
        );
    }

    #[test]
    fn success_statuses_pass() {
        assert_eq!(classify(StatusCode::OK, b"{}"), ResponseClass::Pass);
        assert_eq!(classify(StatusCode::NO_CONTENT, b""), ResponseClass::Pass);
    }

    #[test]
    fn forbidden_passes() {
        // 403 is a rights problem, not an expiry problem
        assert_eq!(
            classify(StatusCode::FORBIDDEN, br#"{"msg":"admin only"}"#),
            ResponseClass::Pass
        );
    }

    #[test]
    fn server_failures_pass() {
        assert_eq!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, b"boom"),
            ResponseClass::Pass
        );
        assert_eq!(
            classify(StatusCode::SERVICE_UNAVAILABLE, b""),
            ResponseClass::Pass
        );
        assert_eq!(classify(StatusCode::NOT_FOUND, b""), ResponseClass::Pass);
    }
}
