//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the API handlers
//! - Wire up middleware (tracing, request ID, timeout, CORS, panics, metrics)
//! - Bind server to listener and drain on shutdown
//!
//! Timeouts and panics answer in the same `{"error": ...}` shape as handler
//! errors.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::HttpSettings;
use crate::http::error::ApiError;
use crate::http::handlers::{get_config, get_status, not_found, post_config};
use crate::observability::metrics;
use crate::store::{ConfigStore, Validator};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ConfigStore>,
    pub validator: Arc<Validator>,
}

impl AppState {
    /// State whose validator accepts the same modes the store projects.
    pub fn new(store: Arc<ConfigStore>) -> Self {
        let validator = Arc::new(Validator::new(store.allowed_modes().to_vec()));
        Self { store, validator }
    }
}

/// HTTP server for the configuration API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(settings: &HttpSettings, state: AppState) -> Self {
        Self {
            router: build_router(settings, state),
        }
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(settings: &HttpSettings, state: AppState) -> Router {
    let timeout = Duration::from_secs(settings.request_timeout_secs);
    let router = Router::new()
        .route(
            "/api/config",
            get(get_config).post(post_config).fallback(not_found),
        )
        .route("/api/status", get(get_status).fallback(not_found))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(track_metrics))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(move |request: Request<Body>, next: Next| {
            request_timeout(timeout, request, next)
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    if settings.cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &path, response.status().as_u16());
    response
}

async fn request_timeout(limit: Duration, request: Request<Body>, next: Next) -> Response {
    let uri = request.uri().clone();
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(%uri, limit_ms = limit.as_millis() as u64, "Request timed out");
            ApiError::Timeout.into_response()
        }
    }
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic"
    };
    tracing::error!(detail, "Unhandled error while serving request");
    ApiError::Internal.into_response()
}
