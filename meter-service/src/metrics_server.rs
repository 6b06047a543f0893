use std::net::SocketAddr;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static RECORDER: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder and serve `/metrics` on a dedicated
/// listener. Called at most once, when the `[metrics]` config section is
/// present; a bad address or a recorder that is already installed disables
/// the exporter rather than taking the service down.
pub fn init(bind_addr: &str) {
    let addr: SocketAddr = match bind_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, "invalid metrics bind address, exporter disabled");
            return;
        }
    };

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = RECORDER.set(handle);
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to install metrics recorder, exporter disabled");
            return;
        }
    }

    tokio::spawn(async move {
        let app = Router::new().route("/metrics", get(render));

        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    tracing::error!(error = %e, "meter metrics exporter error");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to bind meter metrics listener");
            }
        }
    });
}

async fn render() -> String {
    RECORDER.get().map(PrometheusHandle::render).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unparseable_bind_address_is_not_fatal() {
        init("not-an-address");
    }
}
