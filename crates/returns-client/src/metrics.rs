//! Client-side metrics
//!
//! Counters for the renewal machinery, emitted through the `metrics` facade:
//!
//! - `returns_client_renewals_total` (counter): label `outcome`
//!   (`renewed` / `failed`)
//! - `returns_client_replays_total` (counter)
//! - `returns_client_sessions_ended_total` (counter)
//!
//! The library installs no recorder. Embedding applications that want these
//! series install their own exporter; without one the calls are no-ops.

/// Record a completed renewal attempt with an outcome label.
pub fn record_renewal(outcome: &str) {
    metrics::counter!("returns_client_renewals_total", "outcome" => outcome.to_string())
        .increment(1);
}

/// Record a replayed request.
pub fn record_replay() {
    metrics::counter!("returns_client_replays_total").increment(1);
}

/// Record a terminal session end.
pub fn record_session_ended() {
    metrics::counter!("returns_client_sessions_ended_total").increment(1);
}

#[cfg(test)]
mod tests {
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

    use super::*;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        // With no recorder installed, facade calls are no-ops
        record_renewal("renewed");
        record_replay();
        record_session_ended();
    }

    /// Create an isolated recorder/handle pair. build_recorder() avoids the
    /// global-recorder singleton constraint, which only allows one
    /// install_recorder() per process.
    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn renewal_counter_carries_outcome_label() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_renewal("renewed");
        record_renewal("failed");

        let output = handle.render();
        assert!(
            output.contains("returns_client_renewals_total"),
            "rendered output must contain the renewal counter"
        );
        assert!(
            output.contains("outcome=\"renewed\""),
            "success outcome label must be recorded"
        );
        assert!(
            output.contains("outcome=\"failed\""),
            "failure outcome label must be recorded"
        );
    }

    #[test]
    fn replay_and_session_counters_render() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_replay();
        record_session_ended();

        let output = handle.render();
        assert!(output.contains("returns_client_replays_total"));
        assert!(output.contains("returns_client_sessions_ended_total"));
    }
}
