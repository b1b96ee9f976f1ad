//! gradeflow - academic promotion and graduation lifecycle engine
//!
//! Moves every student up one grade per academic year, funnels the final
//! grade into a terminal pool, and graduates (deletes) the pool's previous
//! members once an administrator confirms.
//!
//! - `school`: class and student records, the store contract, stores
//! - `lifecycle`: snapshot, plan, execution, graduation, orchestration
//! - `observability`: structured logging, audit log, metrics
//! - `cli` / `http_server`: administrator surfaces

pub mod cli;
pub mod http_server;
pub mod lifecycle;
pub mod observability;
pub mod school;
