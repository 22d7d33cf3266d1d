#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod config;
pub mod error;
pub mod errors;
pub mod health;
pub mod live;
pub mod middleware;
pub mod routes;
pub mod scoring;
pub mod state;
pub mod trace_ctx;

// Re-exports for public API
pub use config::GameConfig;
pub use error::AppError;
pub use errors::domain::GameError;
pub use live::{ClientEvent, ServerEvent, SessionOrchestrator};
pub use middleware::cors::cors_middleware;
pub use middleware::request_trace::RequestTrace;
pub use middleware::structured_logger::StructuredLogger;
pub use scoring::calculate_score;
pub use state::app_state::AppState;
