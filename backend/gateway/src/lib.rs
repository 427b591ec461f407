//! HTTP gateway for Parley.
//!
//! Routes, per-address rate limiting, CORS, and static frontend serving.
//! Everything conversational happens in `parley-engine`; this crate only
//! translates between HTTP and the engine.

pub mod rate_limit;
pub mod routes;
pub mod server;

pub use rate_limit::RateLimiter;
pub use server::{serve, AppState};
