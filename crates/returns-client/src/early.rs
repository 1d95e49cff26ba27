//! Scheduled early renewal
//!
//! Spawns a periodic task that renews the access credential shortly before
//! its decoded expiry, so most requests never see a rejection round-trip.
//! This is not a second renewal mechanism: every cycle goes through the same
//! [`Renewer::renew`], which keeps the single-flight guarantee and the
//! terminal failure semantics identical on both triggers.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use returns_auth::claims;

use crate::renew::Renewer;

/// Spawn a background task that renews the credential once its expiry falls
/// within `threshold`.
///
/// Runs every `interval`. An empty store, a credential without a readable
/// expiry, or a still-fresh credential all skip the cycle quietly; the
/// request path covers those cases when traffic arrives. A cycle that
/// overruns its interval delays the next tick instead of bursting.
///
/// Returns a `JoinHandle` so the host can abort the task on shutdown.
pub fn spawn_early_renewal(
    renewer: Arc<Renewer>,
    interval: Duration,
    threshold: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the immediate first tick, credentials were just loaded
        ticker.tick().await;

        loop {
            ticker.tick().await;
            renewal_cycle(&renewer, threshold).await;
        }
    })
}

/// Run one cycle: renew if the stored credential expires within `threshold`.
async fn renewal_cycle(renewer: &Renewer, threshold: Duration) {
    let Some(access) = renewer.store().access().await else {
        debug!("no stored credential, skipping early renewal cycle");
        return;
    };
    let Some(expires_at) = claims::expiry(&access) else {
        debug!("stored credential has no readable expiry, skipping early renewal cycle");
        return;
    };

    let now_secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    if expires_at > now_secs + threshold.as_secs() {
        return;
    }

    debug!(expires_at, "credential expiring within threshold, renewing early");
    match renewer.renew().await {
        Ok(_) => info!("early renewal succeeded"),
        // renew() already cleared the store and ended the session
        Err(e) => warn!(error = %e, "early renewal failed"),
    }
}
