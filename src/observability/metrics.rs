//! Metrics collection and exposition.
//!
//! # Metrics
//! - `signatory_sign_requests_total` (counter): by outcome
//! - `signatory_sign_duration_seconds` (histogram): authorization latency
//! - `signatory_nonce_lookups_total` (counter): remote lookups by network, result
//! - `signatory_unlock_attempts_total` (counter): by outcome
//! - `signatory_key_unlocked` (gauge): 1 once the key is unlocked

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

use crate::policy::Network;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_sign_outcome(outcome: &'static str, started: Instant) {
    counter!("signatory_sign_requests_total", "outcome" => outcome).increment(1);
    histogram!("signatory_sign_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_nonce_lookup(network: Network, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    counter!(
        "signatory_nonce_lookups_total",
        "network" => network.as_str(),
        "result" => result
    )
    .increment(1);
}

pub fn record_unlock_attempt(outcome: &'static str) {
    counter!("signatory_unlock_attempts_total", "outcome" => outcome).increment(1);
}

pub fn set_key_unlocked(unlocked: bool) {
    gauge!("signatory_key_unlocked").set(if unlocked { 1.0 } else { 0.0 });
}
