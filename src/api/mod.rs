//! HTTP API for article generation.
//!
//! ## Endpoints
//!
//! - `POST /generate-article` - Generate an article for a topic
//! - `GET /health` - Health check
//! - `GET /providers` - Registered completion providers

mod routes;
pub mod types;

pub use routes::{router, serve, AppState};
