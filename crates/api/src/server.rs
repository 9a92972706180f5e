//! API server configuration and serve loop

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tower_http::timeout::TimeoutLayer;
use weir_control::{BackendConfig, PipelineManager};

use crate::routes::build_router;
use crate::state::AppState;

/// Per-request timeout (both directions)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Server configuration, parsed from a JSON file
#[derive(Debug, Clone, Deserialize)]
pub struct ApiServerConfig {
    /// Listen address; `:8000` by default
    #[serde(rename = "listenAddress", default = "default_listen_address")]
    pub listen_address: String,

    #[serde(rename = "backendConfig")]
    pub backend: BackendConfig,
}

fn default_listen_address() -> String {
    ":8000".to_string()
}

impl ApiServerConfig {
    pub fn from_slice(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    /// Bindable form of the listen address (`:8000` means all interfaces)
    pub fn bind_address(&self) -> String {
        if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        }
    }
}

/// Run the control API until interrupted, then close every pipeline this
/// server started.
pub async fn serve(config: ApiServerConfig, manager: Arc<PipelineManager>) -> std::io::Result<()> {
    let state = AppState::new(manager);
    let app = build_router(state.clone()).layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "control API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down API server");
    state.close_all().await;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(terminate) => terminate,
            Err(e) => {
                tracing::warn!(error = %e, "unable to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let config = ApiServerConfig::from_slice(
            br#"{"backendConfig":{"type":"sled","sledConfig":{"databaseName":"weir.db","bucketName":"weir"}}}"#,
        )
        .unwrap();
        assert_eq!(config.listen_address, ":8000");
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn test_explicit_address_kept() {
        let config = ApiServerConfig::from_slice(
            br#"{"listenAddress":"127.0.0.1:9000","backendConfig":{"type":"sled","sledConfig":{"databaseName":"weir.db","bucketName":"weir"}}}"#,
        )
        .unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }
}
