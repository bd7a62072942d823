//! Metrics collection and Prometheus export.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder. Later calls are no-ops, so tests that
/// build several applications can call it freely.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if METRICS_HANDLE.set(handle).is_ok() {
                describe_metrics();
            }
        }
        Err(e) => tracing::warn!(error = %e, "Failed to install Prometheus recorder"),
    }
}

fn describe_metrics() {
    describe_counter!("kpi_reports_total", "Report runs by outcome");
    describe_histogram!(
        "sheet_fetch_duration_seconds",
        "Time spent reading one spreadsheet tab"
    );
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// `outcome` is `success` or a `ReportError::kind` label.
pub fn record_report(outcome: &'static str) {
    counter!("kpi_reports_total", "outcome" => outcome).increment(1);
}

pub fn record_fetch_duration(tab: &str, duration_secs: f64) {
    histogram!("sheet_fetch_duration_seconds", "tab" => tab.to_string()).record(duration_secs);
}
