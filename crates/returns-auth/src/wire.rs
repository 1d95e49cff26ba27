//! Auth endpoint calls
//!
//! The two direct interactions with the backend's auth surface:
//! 1. Login (username/password → credential pair)
//! 2. Renewal (renewal credential → fresh access credential)
//!
//! Both are issued on a direct path, outside the decorated request flow, so
//! neither can recursively trigger a renewal. A 401 from login means a wrong
//! password; a 401 from renewal means the session is over. The renewal call
//! authenticates with the renewal credential, never the access credential.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Response from the login endpoint.
#[derive(Debug, Deserialize, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub username: String,
}

/// Response from the renewal endpoint.
///
/// Only the access credential rotates; the renewal credential that earned it
/// stays valid until the session ends.
#[derive(Debug, Deserialize, Serialize)]
pub struct RenewalResponse {
    pub access_token: String,
}

/// Identity returned by the current-user endpoint.
#[derive(Debug, Deserialize, Serialize)]
pub struct CurrentUser {
    pub username: String,
}

/// Trade username/password for a credential pair.
pub async fn login(
    client: &reqwest::Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<LoginResponse> {
    let response = client
        .post(endpoint(base_url, "/auth/login"))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .map_err(|e| Error::Http(format!("login request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));

        if status.as_u16() == 401 {
            return Err(Error::Rejected(format!("login rejected ({status}): {body}")));
        }

        return Err(Error::Endpoint(format!("login returned {status}: {body}")));
    }

    response
        .json::<LoginResponse>()
        .await
        .map_err(|e| Error::Endpoint(format!("invalid login response: {e}")))
}

/// Obtain a fresh access credential using the renewal credential.
///
/// Any failure here is terminal for the session: the caller clears the
/// store and tells the host to send the user back through login.
pub async fn renew(
    client: &reqwest::Client,
    base_url: &str,
    renewal: &str,
) -> Result<RenewalResponse> {
    let response = client
        .post(endpoint(base_url, "/auth/refresh"))
        .header(reqwest::header::AUTHORIZATION, format!("Bearer {renewal}"))
        .send()
        .await
        .map_err(|e| Error::Http(format!("renewal request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));

        // 401/403 means the renewal credential is revoked or expired; the
        // backend reports malformed credentials as 422
        if matches!(status.as_u16(), 401 | 403 | 422) {
            return Err(Error::Rejected(format!(
                "renewal credential rejected ({status}): {body}"
            )));
        }

        return Err(Error::Endpoint(format!("renewal returned {status}: {body}")));
    }

    response
        .json::<RenewalResponse>()
        .await
        .map_err(|e| Error::Endpoint(format!("invalid renewal response: {e}")))
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
