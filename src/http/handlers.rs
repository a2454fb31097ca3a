//! API endpoint handlers.

use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::store::model::format_timestamp;
use crate::store::ConfigProjection;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub status: &'static str,
    pub timestamp: String,
    pub config_file_path: String,
    pub config_loaded: bool,
    pub polling_active: bool,
}

/// `GET /api/config`
pub async fn get_config(State(state): State<AppState>) -> Result<Json<ConfigProjection>, ApiError> {
    Ok(Json(state.store.get()?))
}

/// `POST /api/config`
///
/// An empty body is treated like `{}` so it gets the same "mode must be one
/// of" answer as a body without a mode. Omitted mode fields fall back to the
/// values retained from the last time that mode was configured.
pub async fn post_config(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ConfigProjection>, ApiError> {
    let candidate: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|_| ApiError::MalformedBody)?
    };

    let retained = state.store.snapshot();
    let settings = match state
        .validator
        .validate_with_retained(&candidate, Some(retained.as_ref()))
    {
        Ok(settings) => settings,
        Err(e) => {
            tracing::debug!(reason = %e, "Rejected configuration update");
            return Err(e.into());
        }
    };

    let projection = state.store.apply(settings).await?;

    tracing::info!(
        mode = %projection.settings.mode(),
        last_updated = %projection.last_updated,
        "Updated configuration"
    );
    Ok(Json(projection))
}

/// `GET /api/status`
pub async fn get_status(State(state): State<AppState>) -> Json<StatusReport> {
    let store = &state.store;
    Json(StatusReport {
        status: "running",
        timestamp: format_timestamp(&store.snapshot().last_updated),
        config_file_path: store.path().display().to_string(),
        config_loaded: store.is_loaded(),
        polling_active: store.is_polling(),
    })
}

/// Any route or method not handled above.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
