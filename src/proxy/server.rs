use crate::error::{AppError, AppResult};
use crate::modules::ResourceStore;
use crate::proxy::config::ProxyConfig;
use crate::proxy::upstream::UpstreamClient;
use axum::{
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Axum application state. Everything here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub store: Arc<dyn ResourceStore>,
    pub upstream: Arc<UpstreamClient>,
}

impl AppState {
    pub fn new(config: ProxyConfig, store: Arc<dyn ResourceStore>) -> AppResult<Self> {
        config.validate().map_err(AppError::Config)?;
        let upstream = Arc::new(UpstreamClient::new(&config)?);
        Ok(Self {
            config: Arc::new(config),
            store,
            upstream,
        })
    }
}

/// Build the relay routes
pub fn build_router(state: AppState) -> Router {
    use crate::proxy::handlers;

    Router::new()
        .route(
            "/dataset/:id/resource/:resource_id/proxy",
            get(handlers::resource::handle_proxy_resource),
        )
        .route(
            "/dataset/:id/resource/:resource_id/proxified_url",
            get(handlers::resource::handle_proxified_url),
        )
        .route("/healthz", get(health_check_handler))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(
            crate::proxy::middleware::logging_middleware,
        ))
        .layer(crate::proxy::middleware::cors_layer())
        .with_state(state)
}

/// Axum server instance
pub struct AxumServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: SocketAddr,
}

impl AxumServer {
    /// Start Axum server
    pub async fn start(
        host: &str,
        port: u16,
        state: AppState,
    ) -> AppResult<(Self, tokio::task::JoinHandle<()>)> {
        let app = build_router(state);

        // Bind address
        let addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Server(format!("Failed to bind address {}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Resource proxy started at http://{}", local_addr);

        // Create shutdown channel
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let server_instance = Self {
            shutdown_tx: Some(shutdown_tx),
            local_addr,
        };

        // Start server in new task
        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let service = TowerToHyperService::new(app.clone());

                                tokio::task::spawn(async move {
                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("Connection handling finished or errored: {:?}", err);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {:?}", e);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("Resource proxy stopped listening");
                        break;
                    }
                }
            }
        });

        Ok((server_instance, handle))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop server
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Health check handler
async fn health_check_handler() -> Response {
    Json(serde_json::json!({
        "status": "ok"
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::MemoryResourceStore;

    #[tokio::test]
    async fn test_start_and_stop() {
        let state = AppState::new(
            ProxyConfig::default(),
            Arc::new(MemoryResourceStore::new()),
        )
        .unwrap();
        let (server, handle) = AxumServer::start("127.0.0.1", 0, state).await.unwrap();
        let addr = server.local_addr();
        assert_ne!(addr.port(), 0);

        let body: serde_json::Value = reqwest::get(format!("http://{}/healthz", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");

        server.stop();
        handle.await.unwrap();
    }

    #[test]
    fn test_state_rejects_zero_timeout() {
        let config = ProxyConfig {
            request_timeout: 0,
            ..ProxyConfig::default()
        };
        let result = AppState::new(config, Arc::new(MemoryResourceStore::new()));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
