//! Axum HTTP API server.
//!
//! This crate provides:
//! - The clip job endpoints over the worker's orchestrator
//! - Static serving of produced clips under `/downloads`
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
