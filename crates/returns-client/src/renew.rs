//! Single-flight credential renewal
//!
//! Any number of requests can hit a credential rejection at the same moment;
//! exactly one renewal call may go to the network. The first caller to find
//! the state `Idle` flips it to `Renewing` and becomes the leader; everyone
//! else enqueues a waiter and suspends. When the leader's call finishes it
//! flips back to `Idle` and completes every waiter in enqueue order with the
//! shared outcome.
//!
//! A failed renewal (rejected credential, transport error, timeout, or an
//! empty store) is terminal for the session: the store is cleared, every
//! waiter is rejected, and `SessionEvent::Ended` is broadcast exactly once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast, oneshot};
use tracing::{debug, info, warn};

use returns_auth::{TokenStore, wire};

use crate::error::{Error, Result};
use crate::metrics;
use crate::session::{SessionEvent, SessionEvents};

/// Queued caller. Completed exactly once with the fresh access credential or
/// the failure message.
type Waiter = oneshot::Sender<std::result::Result<String, String>>;

/// Renewal coordination state. `Renewing` owns the queue of waiters to
/// complete when the in-flight call finishes.
enum RenewState {
    Idle,
    Renewing { waiters: Vec<Waiter> },
}

/// Owns the single-flight renewal for one backend.
///
/// One instance per backend, shared by handle with every call site. The
/// state transitions happen while the lock is held, and the lock is never
/// held across an await, so no two tasks can both see `Idle` and start
/// competing renewals.
pub struct Renewer {
    http: reqwest::Client,
    base_url: String,
    store: Arc<TokenStore>,
    timeout: Duration,
    state: Mutex<RenewState>,
    events: SessionEvents,
}

impl Renewer {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        store: Arc<TokenStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            store,
            timeout,
            state: Mutex::new(RenewState::Idle),
            events: SessionEvents::new(),
        }
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// The credential store this renewer reads and updates.
    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Obtain a fresh access credential, renewing at most once concurrently.
    ///
    /// Exactly one caller performs the network call; every caller that
    /// arrives while it is in flight shares its outcome. On success the
    /// fresh credential is persisted (paired with the renewal credential
    /// that earned it) and returned. On failure the store is cleared,
    /// `SessionEvent::Ended` is broadcast once, and every caller gets
    /// `Error::ReauthRequired`.
    pub async fn renew(&self) -> Result<String> {
        // Check-and-set in one step under the lock; the guard drops before
        // any suspension point below.
        let rx = {
            let mut state = self.state.lock().await;
            match &mut *state {
                RenewState::Renewing { waiters } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    debug!(queued = waiters.len(), "renewal already in flight, waiting");
                    Some(rx)
                }
                RenewState::Idle => {
                    *state = RenewState::Renewing { waiters: Vec::new() };
                    None
                }
            }
        };

        if let Some(rx) = rx {
            return match rx.await {
                Ok(Ok(access)) => Ok(access),
                Ok(Err(msg)) => Err(Error::ReauthRequired(msg)),
                // Leader dropped without completing us; only happens if it
                // panicked mid-renewal
                Err(_) => Err(Error::ReauthRequired("renewal abandoned".into())),
            };
        }

        let outcome = self.execute().await;

        // Flip back to Idle and take the queue in the same step, so a caller
        // arriving after this point starts a fresh renewal instead of
        // waiting on one that already finished.
        let waiters = {
            let mut state = self.state.lock().await;
            match std::mem::replace(&mut *state, RenewState::Idle) {
                RenewState::Renewing { waiters } => waiters,
                RenewState::Idle => Vec::new(),
            }
        };

        match outcome {
            Ok(access) => {
                info!(waiters = waiters.len(), "credential renewal succeeded");
                metrics::record_renewal("renewed");
                for waiter in waiters {
                    // A dropped receiver means that caller gave up; fine
                    let _ = waiter.send(Ok(access.clone()));
                }
                Ok(access)
            }
            Err(msg) => {
                warn!(waiters = waiters.len(), error = %msg, "credential renewal failed, session over");
                metrics::record_renewal("failed");
                for waiter in waiters {
                    let _ = waiter.send(Err(msg.clone()));
                }
                metrics::record_session_ended();
                self.events.publish(SessionEvent::Ended);
                Err(Error::ReauthRequired(msg))
            }
        }
    }

    /// Perform the renewal network call. Failure reasons collapse into a
    /// message because every kind (missing renewal credential, rejection,
    /// transport error, timeout) ends the session the same way.
    async fn execute(&self) -> std::result::Result<String, String> {
        let Some(renewal) = self.store.renewal().await else {
            // Nothing to renew with; don't go to the network at all
            return self.fail("no renewal credential in store".into()).await;
        };

        let call = wire::renew(&self.http, &self.base_url, &renewal);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => {
                // Keep serving the fresh credential even if the disk write
                // fails; the next restart costs a re-login at worst
                if let Err(e) = self
                    .store
                    .set(response.access_token.clone(), renewal)
                    .await
                {
                    warn!(error = %e, "failed to persist renewed credential");
                }
                Ok(response.access_token)
            }
            Ok(Err(e)) => self.fail(format!("renewal call failed: {e}")).await,
            Err(_) => {
                self.fail(format!(
                    "renewal timed out after {}s",
                    self.timeout.as_secs()
                ))
                .await
            }
        }
    }

    /// Terminal-failure bookkeeping shared by every failure reason.
    async fn fail(&self, msg: String) -> std::result::Result<String, String> {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to clear credential store");
        }
        Err(msg)
    }
}
