//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the forwarding handler
//! - Wire up middleware (tracing, request ID)
//! - Apply configuration reloads to the forwarding policy
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::forward::upstream::{build_client, Upstream};
use crate::forward::{ForwardPolicy, Forwarder};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
}

/// HTTP server for the download proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    policy: Arc<ArcSwap<ForwardPolicy>>,
}

impl HttpServer {
    /// Create a server that forwards with a `reqwest` client built from `config`.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let client = build_client(&config.upstream, &config.timeouts)?;
        Ok(Self::with_upstream(config, Arc::new(client)))
    }

    /// Create a server that forwards through `upstream`.
    pub fn with_upstream(config: ProxyConfig, upstream: Arc<dyn Upstream>) -> Self {
        let policy = Arc::new(ArcSwap::from_pointee(ForwardPolicy::from_config(&config)));
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        let state = AppState {
            forwarder: Arc::new(Forwarder::new(upstream, policy.clone(), request_timeout)),
        };

        let router = Self::build_router(state);
        Self {
            router,
            config,
            policy,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(propagate_request_id_layer())
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request.request_id(),
                    )
                }),
            )
            .layer(set_request_id_layer())
    }

    /// Router with all middleware, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configurations received on `config_updates` replace the forwarding
    /// policy; the server stops once `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let policy = self.policy.clone();
        let startup = self.config.clone();
        tokio::spawn(async move {
            while let Some(next) = config_updates.recv().await {
                apply_update(&policy, &startup, &next);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

fn apply_update(policy: &ArcSwap<ForwardPolicy>, startup: &ProxyConfig, next: &ProxyConfig) {
    if next.listener != startup.listener || next.timeouts != startup.timeouts {
        tracing::warn!("Listener and timeout changes take effect after restart");
    }
    if next.upstream != startup.upstream {
        tracing::warn!("Upstream client changes take effect after restart");
    }

    let next_policy = ForwardPolicy::from_config(next);
    tracing::info!(
        rewrite_enabled = next_policy.rewrite_enabled,
        stripped_headers = next_policy.stripped_request_headers.len(),
        "Forwarding policy updated"
    );
    policy.store(Arc::new(next_policy));
}

/// Forward the request to the host named in its path.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request.request_id().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Proxying request"
    );

    match state.forwarder.forward(request).await {
        Ok(response) => response,
        Err(e) if e.is_client_error() => {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "Rejected request");
            e.into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, path = %path, error = %e, "Upstream error");
            e.into_response()
        }
    }
}
