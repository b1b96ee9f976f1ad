//! # gradeflow HTTP Server Module
//!
//! HTTP API for administrators, served by `gradeflow serve`.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /promotion/preview?max_ordinal=N` - What a cycle would do
//! - `POST /promotion/cycle` - Run a cycle
//! - `POST /promotion/cycle/rerun` - Re-run the last cycle's plan
//! - `GET /promotion/metrics` - Cycle counters

pub mod config;
pub mod health_routes;
pub mod promotion_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use promotion_routes::PromotionState;
pub use server::HttpServer;
