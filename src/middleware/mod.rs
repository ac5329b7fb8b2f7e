//! Middleware layer.
//!
//! Cross-cutting checks that run in the server before a request reaches the
//! router. Each is handed to the [`Server`](crate::Server) at construction;
//! none is a process-wide global.
//!
//! - [`rate_limit`]: token-bucket admission control, rejects with `429`.

pub mod rate_limit;

pub use rate_limit::RateLimiter;
