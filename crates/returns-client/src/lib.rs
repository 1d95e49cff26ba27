//! Authenticated client for the returns admin backend
//!
//! Wraps every business request with bearer decoration, rejection
//! classification, single-flight credential renewal, and a single invisible
//! replay. Credentials live in `TokenStore` (single source of truth); the
//! renewal coordinator updates it and broadcasts session lifecycle events.
//!
//! Request lifecycle:
//! 1. Caller issues a request → stored access credential attached as `Bearer`
//! 2. Backend accepts → response returned untouched, success or not
//! 3. Backend rejects the credential (401, or 422 complaining about the
//!    token) → renewal coordinator runs at most one renewal call
//! 4. Renewal succeeds → fresh pair persisted, request replayed byte-for-byte
//!    exactly once
//! 5. Renewal fails → store cleared, every queued caller rejected,
//!    `SessionEvent::Ended` broadcast once
//! 6. Optional background task renews early, before expiry, through the same
//!    coordinator

pub mod classify;
pub mod client;
pub mod early;
pub mod error;
pub mod metrics;
pub mod renew;
pub mod session;

pub use classify::{ResponseClass, classify};
pub use client::{ApiClient, ApiResponse};
pub use early::spawn_early_renewal;
pub use error::{Error, Result};
pub use renew::Renewer;
pub use session::{SessionEvent, SessionEvents};
