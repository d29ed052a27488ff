use crate::error::AppResult;
use crate::proxy::config::ProxyConfig;
use crate::proxy::upstream::client::UpstreamClient;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, MethodRouter},
    Router,
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Axum application state
///
/// Immutable after startup; cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub upstream: Arc<UpstreamClient>,
    /// Serialized origin of the upstream, sent as `Origin` on credentialed requests
    pub upstream_origin: Arc<str>,
    pub mount_path: Arc<str>,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> AppResult<Self> {
        config.validate()?;
        let upstream_origin = config.upstream_origin()?.origin().ascii_serialization();
        let upstream = UpstreamClient::new(&config)?;
        let mount_path = config.normalized_mount_path();

        Ok(Self {
            config: Arc::new(config),
            upstream: Arc::new(upstream),
            upstream_origin: upstream_origin.into(),
            mount_path: mount_path.into(),
        })
    }
}

/// Build the full router: relay routes under the mount path plus diagnostics
pub fn build_router(state: AppState) -> Router {
    use crate::proxy::handlers;

    let mount = state.mount_path.to_string();
    let relay_methods = || -> MethodRouter<AppState> {
        get(handlers::relay::handle_relay)
            .post(handlers::relay::handle_relay)
            .put(handlers::relay::handle_relay)
            .delete(handlers::relay::handle_relay)
            .patch(handlers::relay::handle_relay)
            .options(handlers::relay::handle_preflight)
    };

    let relay_routes = Router::new()
        .route(&mount, relay_methods())
        .route(&format!("{}/", mount), relay_methods())
        .route(&format!("{}/*path", mount), relay_methods())
        .layer(axum::middleware::from_fn(
            crate::proxy::middleware::cors_middleware,
        ));

    Router::new()
        .route("/healthz", get(handlers::status::health_check_handler))
        .route("/status", get(handlers::status::handle_upstream_status))
        .merge(relay_routes)
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(
            crate::proxy::middleware::logging_middleware,
        ))
        .with_state(state)
}

/// Axum server instance
pub struct AxumServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: std::net::SocketAddr,
}

impl AxumServer {
    /// Start Axum server
    pub async fn start(config: ProxyConfig) -> AppResult<(Self, tokio::task::JoinHandle<()>)> {
        let addr = format!("{}:{}", config.get_bind_address(), config.port);
        let upstream_url = config.upstream_url.clone();
        let mount = config.normalized_mount_path();

        let state = AppState::new(config)?;
        let app = build_router(state);

        // Bind address
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!(
            "Relay started at http://{}{} -> {}",
            local_addr,
            mount,
            upstream_url
        );

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
                        tracing::info!("Relay stopped listening");
                        break;
                    }
                }
            }
        });

        Ok((server_instance, handle))
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.local_addr
    }

    /// Stop server
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
