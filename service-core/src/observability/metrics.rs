//! Process-wide Prometheus recorder for the `metrics` facade.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder on first use and returns its handle.
///
/// Later calls hand back the same handle, so several applications built in
/// one process (as in integration tests) share a single registry.
pub fn install_recorder() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if let Err(e) = metrics::set_global_recorder(recorder) {
                tracing::warn!(error = %e, "A global metrics recorder was already installed");
            }
            handle
        })
        .clone()
}

/// Prometheus text exposition of everything recorded so far.
pub fn render() -> String {
    METRICS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_install_shares_registry() {
        let first = install_recorder();
        metrics::counter!("recorder_test_total").increment(2);

        let second = install_recorder();
        assert!(second.render().contains("recorder_test_total 2"));
        assert!(first.render().contains("recorder_test_total"));
        assert!(render().contains("recorder_test_total"));
    }
}
