//! Router assembly, shared state, and the serve loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use btcgw_gw::Gateway;

use crate::auth::KeyStore;
use crate::rest;

/// How long in-flight requests may drain after a shutdown signal.
pub const SHUTDOWN_DRAIN: Duration = Duration::from_secs(10);

/// Shared state behind every handler.
pub struct AppState {
    /// The gateway the handlers drive.
    pub gateway: Arc<dyn Gateway>,
    /// API-key verification and management.
    pub keys: Arc<dyn KeyStore>,
    /// Pretty-print JSON responses (development mode).
    pub pretty: bool,
}

impl AppState {
    /// Create state for the router.
    pub fn new(gateway: Arc<dyn Gateway>, keys: Arc<dyn KeyStore>, pretty: bool) -> Self {
        Self {
            gateway,
            keys,
            pretty,
        }
    }

    /// Serialize `value` as the response body, pretty-printed in
    /// development mode.
    pub fn json<T: Serialize>(&self, status: StatusCode, value: &T) -> Response {
        let body = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        match body {
            Ok(body) => (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response(),
            Err(e) => {
                error!(error = %e, "response serialization failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Require a valid `X-API-Key` scoped to the `{dom}` path parameter.
async fn require_api_key(
    State(state): State<Arc<AppState>>,
    Path((dom, _tx)): Path<(String, String)>,
    request: Request,
    next: Next,
) -> Response {
    let key = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    match state.keys.authorize(key, &dom).await {
        Ok(true) => next.run(request).await,
        Ok(false) => StatusCode::UNAUTHORIZED.into_response(),
        Err(e) => {
            error!(error = %e, "key verification failed");
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}

/// Build the full router.
pub fn router(state: Arc<AppState>) -> Router {
    let anchors = Router::new()
        .route(
            "/anchors/domains/{dom}/transactions/{tx}",
            get(rest::get_anchor)
                .post(rest::post_anchor)
                .patch(rest::patch_anchor),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    let apikeys = Router::new()
        .route("/apikeys/create", post(rest::create_apikey))
        .route("/apikeys/delete", post(rest::delete_apikey));

    // Browsers read records and trigger refreshes; they should not POST.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PATCH, Method::HEAD, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(300));

    Router::new()
        .merge(anchors)
        .merge(apikeys)
        .route("/healthz", get(rest::healthz))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

/// Serve until SIGINT/SIGTERM, then stop accepting connections and give
/// in-flight requests [`SHUTDOWN_DRAIN`] to finish.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    let drained = Arc::new(tokio::sync::Notify::new());
    let signal_seen = drained.clone();
    let graceful = axum::serve(listener, router(state)).with_graceful_shutdown(async move {
        shutdown_signal().await;
        signal_seen.notify_one();
    });

    tokio::select! {
        result = graceful => result,
        _ = async {
            drained.notified().await;
            tokio::time::sleep(SHUTDOWN_DRAIN).await;
        } => {
            warn!("drain window elapsed, abandoning open connections");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("signal received, shutting down");
}
