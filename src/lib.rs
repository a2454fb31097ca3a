//! Device mode control service library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::ServerSettings;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::ConfigStore;
