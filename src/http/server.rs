//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the intercepting handler
//! - Wire up middleware (tracing, timeout)
//! - Snapshot each request, run hooks, forward original or rebuilt request
//! - Stream the upstream response back to the client

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header::HOST, uri::Authority, uri::Scheme, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::hooks::{HookChain, RewriteHook};
use crate::http::MutableRequest;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub hooks: HookChain,
    pub client: Client<HttpConnector, Body>,
    pub body_limit: usize,
}

/// HTTP server for the intercepting proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server running `hooks` on every request.
    pub fn new(config: ProxyConfig, hooks: HookChain) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState {
            hooks,
            client,
            body_limit: config.limits.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Create a server whose hooks are the config's rewrite rules.
    pub fn from_config(config: ProxyConfig) -> Self {
        let mut hooks = HookChain::new();
        for rule in &config.rewrites {
            hooks.push(RewriteHook::new(rule.clone()));
        }
        Self::new(config, hooks)
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rewrites = self.config.rewrites.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
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

/// Snapshot, run hooks, and forward.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let mut snapshot = MutableRequest::new(peer, request).with_body_limit(state.body_limit);
    state.hooks.run(&mut snapshot).await;

    let modified = snapshot.was_modified();
    let method = snapshot.method.clone();
    let path = snapshot.path.clone();

    let outbound = match snapshot.into_outbound() {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!(client = %peer.ip(), path = %path, error = %e, "Rewritten request is invalid");
            return (StatusCode::BAD_REQUEST, "Rewritten request is invalid").into_response();
        }
    };
    let Some(mut outbound) = absolute_form(outbound) else {
        tracing::warn!(client = %peer.ip(), path = %path, "No target host");
        return (StatusCode::BAD_REQUEST, "Missing target host").into_response();
    };
    // Upstream connections are HTTP/1.1.
    *outbound.version_mut() = Version::HTTP_11;

    tracing::debug!(
        client = %peer.ip(),
        method = %method,
        uri = %outbound.uri(),
        modified,
        "Forwarding request"
    );

    match state.client.request(outbound).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(client = %peer.ip(), method = %method, path = %path, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// Give an origin-form request a scheme and authority from its Host header.
fn absolute_form(mut request: Request<Body>) -> Option<Request<Body>> {
    if request.uri().authority().is_some() {
        return Some(request);
    }

    let authority = request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| Authority::from_str(h).ok())?;

    let mut uri_parts = request.uri().clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(authority);
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some("/".parse().ok()?);
    }
    *request.uri_mut() = Uri::from_parts(uri_parts).ok()?;
    Some(request)
}
