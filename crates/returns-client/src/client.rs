//! The decorated API client
//!
//! Wraps a reqwest client with per-request bearer decoration, rejection
//! classification, single-flight renewal, and a single replay. Business
//! endpoints are opaque passthrough: the caller gets the buffered response
//! back with whatever status the backend chose, and only transport failures
//! and terminal auth conditions surface as errors.
//!
//! The caller never sees the intermediate rejection: a request resolves
//! with its (possibly replayed) response or with a single error. Headers are
//! built per request; nothing here mutates client-wide defaults.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use returns_auth::{CurrentUser, LoginResponse, TokenStore, claims, wire};

use crate::classify::{ResponseClass, classify};
use crate::error::{Error, Result};
use crate::metrics;
use crate::renew::Renewer;
use crate::session::SessionEvent;

/// Default per-request timeout, shared by decorated and renewal calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A buffered response: status, headers, body.
///
/// Bodies are buffered so the classifier can read backend failure messages
/// and so a rejected request can be replayed byte-for-byte.
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::Json(format!("decoding response body: {e}")))
    }

    /// The body as text, lossily converted.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// An outbound request captured for decoration and replay.
///
/// The body is serialized once up front, so the replay re-issues exactly the
/// bytes the original carried.
struct OutboundRequest {
    method: Method,
    path: String,
    body: Option<Bytes>,
}

/// Authenticated client for the returns admin backend.
///
/// Cheap to clone; clones share the credential store and the renewal
/// coordinator, so concurrent requests from every clone still produce at
/// most one renewal call.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<TokenStore>,
    renewer: Arc<Renewer>,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, store: Arc<TokenStore>) -> Self {
        Self::with_timeout(base_url, store, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        store: Arc<TokenStore>,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.into();
        let http = reqwest::Client::new();
        let renewer = Arc::new(Renewer::new(
            http.clone(),
            base_url.clone(),
            store.clone(),
            timeout,
        ));
        Self {
            http,
            base_url,
            store,
            renewer,
            timeout,
        }
    }

    /// Subscribe to session lifecycle events. The host decides what a
    /// terminal session failure means (exit, login screen, ...).
    pub fn subscribe_session(&self) -> broadcast::Receiver<SessionEvent> {
        self.renewer.subscribe()
    }

    /// The renewal coordinator, for wiring up scheduled early renewal.
    pub fn renewer(&self) -> Arc<Renewer> {
        self.renewer.clone()
    }

    /// GET a decorated endpoint.
    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.request(Method::GET, path, None).await
    }

    /// POST a JSON body to a decorated endpoint.
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.request(Method::POST, path, Some(encode_body(body)?))
            .await
    }

    /// PUT a JSON body to a decorated endpoint.
    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.request(Method::PUT, path, Some(encode_body(body)?))
            .await
    }

    /// DELETE a decorated endpoint.
    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.request(Method::DELETE, path, None).await
    }

    /// Issue an arbitrary decorated request.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<ApiResponse> {
        let request_id = format!("req_{}", Uuid::new_v4().simple());
        let req = OutboundRequest {
            method,
            path: path.to_string(),
            body,
        };
        self.send_with_renewal(req, request_id).await
    }

    /// Log in and persist the returned credential pair.
    ///
    /// Direct path: a 401 here means a wrong password, which must not
    /// trigger renewal.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let response = tokio::time::timeout(
            self.timeout,
            wire::login(&self.http, &self.base_url, username, password),
        )
        .await
        .map_err(|_| Error::Http(format!("login timed out after {}s", self.timeout.as_secs())))??;

        self.store
            .set(
                response.access_token.clone(),
                response.refresh_token.clone(),
            )
            .await?;
        info!(username = %response.username, "logged in");
        Ok(response)
    }

    /// Clear the stored pair. Local only; the backend keeps no session
    /// state to invalidate.
    pub async fn logout(&self) -> Result<()> {
        self.store.clear().await?;
        info!("logged out");
        Ok(())
    }

    /// Fetch the identity behind the current credential. Decorated and
    /// subject to renewal like any business call.
    pub async fn current_user(&self) -> Result<CurrentUser> {
        let response = self.get("/auth/me").await?;
        if !response.status().is_success() {
            return Err(Error::Http(format!(
                "current-user endpoint returned {}",
                response.status()
            )));
        }
        response.json()
    }

    /// Issue a decorated request, resolving renewal and replay invisibly.
    #[instrument(skip_all, fields(request_id = %request_id, method = %req.method, path = %req.path))]
    async fn send_with_renewal(
        &self,
        req: OutboundRequest,
        request_id: String,
    ) -> Result<ApiResponse> {
        let access = self.valid_access().await;
        let response = self.dispatch(&req, access.as_deref()).await?;

        match classify(response.status(), response.body()) {
            ResponseClass::Pass => Ok(response),
            ResponseClass::CredentialRejected => {
                debug!(status = %response.status(), "credential rejected, renewing");
                let fresh = self.renewer.renew().await?;

                metrics::record_replay();
                let replay = self.dispatch(&req, Some(&fresh)).await?;
                match classify(replay.status(), replay.body()) {
                    ResponseClass::Pass => Ok(replay),
                    // Rejected again with a credential the renewal endpoint
                    // just vouched for: terminal for this request, but the
                    // credential may still be good elsewhere. Don't clear,
                    // don't renew again.
                    ResponseClass::CredentialRejected => {
                        warn!(status = %replay.status(), "replay rejected, giving up on this request");
                        Err(Error::Unauthorized(format!(
                            "request rejected again after renewal ({})",
                            replay.status()
                        )))
                    }
                }
            }
        }
    }

    /// Stored access credential, if it has credential shape at all.
    /// Malformed strings are treated as absent so they flow through the
    /// same unauthorized path as an empty store.
    async fn valid_access(&self) -> Option<String> {
        let access = self.store.access().await?;
        if claims::is_well_formed(&access) {
            Some(access)
        } else {
            debug!("stored access credential is malformed, treating as absent");
            None
        }
    }

    /// One wire round-trip: build headers, attach the credential, send,
    /// buffer the response.
    async fn dispatch(&self, req: &OutboundRequest, access: Option<&str>) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), req.path);

        let mut headers = HeaderMap::new();
        if let Some(access) = access {
            match HeaderValue::from_str(&format!("Bearer {access}")) {
                Ok(value) => {
                    if let Some(expires_at) = claims::expiry(access) {
                        debug!(expires_at, "attaching access credential");
                    }
                    headers.insert(AUTHORIZATION, value);
                }
                Err(e) => {
                    warn!(error = %e, "stored credential not header-safe, sending unauthenticated");
                }
            }
        }

        let mut builder = self
            .http
            .request(req.method.clone(), &url)
            .headers(headers)
            .timeout(self.timeout);
        if let Some(body) = &req.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Http(format!("request failed: {e}")))?;

        let status = response.status();
        let resp_headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Http(format!("reading response body: {e}")))?;

        Ok(ApiResponse {
            status,
            headers: resp_headers,
            body,
        })
    }
}

fn encode_body<T: Serialize + ?Sized>(body: &T) -> Result<Bytes> {
    let bytes =
        serde_json::to_vec(body).map_err(|e| Error::Json(format!("encoding request body: {e}")))?;
    Ok(Bytes::from(bytes))
}
