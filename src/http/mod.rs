//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request ID, trace, timeout, CORS)
//!     → handlers.rs (decode body, call validator and store)
//!     → error.rs (map failures to status + {"error": ...})
//!     → Send to client
//! ```
//!
//! # Routes
//! - `GET  /api/config`  current configuration projected onto the active mode
//! - `POST /api/config`  validate, apply and persist a new mode
//! - `GET  /api/status`  service and polling status
//! - anything else      404 `{"error":"Endpoint not found"}`

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, AppState, HttpServer};
