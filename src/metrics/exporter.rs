//! Prometheus scrape endpoint for harness runs

use crate::metrics::error::{MetricsError, MetricsResult};
use crate::metrics::recorder::init_metrics;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;

static EXPORTER: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder and serve it on `addr` for the rest of the
/// process. Needs a tokio runtime. A second call returns the first handle and
/// ignores `addr`.
pub fn serve_metrics(addr: SocketAddr) -> MetricsResult<&'static PrometheusHandle> {
    if let Some(handle) = EXPORTER.get() {
        return Ok(handle);
    }
    let (recorder, serve) = PrometheusBuilder::new().with_http_listener(addr).build()?;
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder).map_err(|_| MetricsError::RecorderInstalled)?;
    init_metrics();

    tokio::spawn(async move {
        if let Err(e) = serve.await {
            tracing::warn!(%addr, "Metrics endpoint stopped: {:?}", e);
        }
    });

    Ok(EXPORTER.get_or_init(|| handle))
}

/// Current exposition text, if the exporter is running
pub fn render_metrics() -> Option<String> {
    EXPORTER.get().map(PrometheusHandle::render)
}
