//! Metrics collection and exposition.
//!
//! # Metrics
//! - `admission_decisions_total` (counter): decisions by reason, role
//! - `admission_rule_duration_seconds` (histogram): per-rule latency
//! - `admission_rule_faults_total` (counter): rule faults by rule, mode
//! - `admission_window_entries` (gauge): tracked window keys after a sweep
//! - `admission_window_evictions_total` (counter): idle keys swept
//!
//! Recording without an installed exporter is a no-op, so library users and
//! tests pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::RuleMode;
use crate::security::decision::ReasonKind;
use crate::security::identity::Role;

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(reason: ReasonKind, role: Role) {
    counter!(
        "admission_decisions_total",
        "reason" => reason.as_str(),
        "role" => role.as_str()
    )
    .increment(1);
}

pub fn record_rule_duration(rule: &'static str, started: Instant) {
    histogram!("admission_rule_duration_seconds", "rule" => rule)
        .record(started.elapsed().as_secs_f64());
}

/// Count a rule fault. Dry-run faults let the request through, so this is
/// where a broken provider shows up.
pub fn record_rule_fault(rule: &'static str, mode: RuleMode) {
    let mode = match mode {
        RuleMode::Live => "live",
        RuleMode::DryRun => "dry_run",
    };
    counter!("admission_rule_faults_total", "rule" => rule, "mode" => mode).increment(1);
}

pub fn record_window_entries(entries: usize) {
    gauge!("admission_window_entries").set(entries as f64);
}

pub fn record_window_evictions(evicted: usize) {
    counter!("admission_window_evictions_total").increment(evicted as u64);
}
