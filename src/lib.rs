//! # partsbin
//!
//! A small HTTP catalog of PC hardware components.
//!
//! ## Endpoints
//!
//! | Path | Response |
//! |---|---|
//! | `GET /` | landing page |
//! | `GET /components` | the whole catalog |
//! | `GET /filtered-components?type=&brand=&sort=&page=` | one page of the filtered, sorted catalog |
//!
//! `/filtered-components` runs the [`pipeline`]: filter by exact type and
//! brand, sort ascending by `name` or `price`, then cut a page of
//! [`PER_PAGE`](pipeline::PER_PAGE) records. A filter that matches nothing
//! answers `404` with `{"error":"No data available"}`. A bad `page` is
//! read as page 1.
//!
//! ## Pieces
//!
//! - Catalog: a read-only [`ComponentSource`], shared by every request.
//! - Views: `minijinja` templates parsed once at startup.
//! - HTTP: radix-tree routing via [`matchit`], hyper connections on tokio,
//!   token-bucket admission, graceful shutdown on SIGTERM / Ctrl-C.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use partsbin::{App, RateLimiter, Server, StaticCatalog, Views, routes};
//!
//! #[tokio::main]
//! async fn main() -> partsbin::Result<()> {
//!     let views = Views::load(Path::new("templates"))?;
//!     let app = Arc::new(App::new(Arc::new(StaticCatalog::reference()), views));
//!
//!     Server::bind(([0, 0, 0, 0], 8080).into())
//!         .rate_limit(RateLimiter::default())
//!         .serve(routes::router(app))
//!         .await
//! }
//! ```

mod app;
mod catalog;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;
mod views;

pub mod config;
pub mod logging;
pub mod middleware;
pub mod pipeline;
pub mod routes;

pub use app::App;
pub use catalog::{Component, ComponentSource, StaticCatalog};
pub use config::Config;
pub use error::{Error, Result};
pub use handler::Handler;
pub use method::Method;
pub use middleware::RateLimiter;
pub use request::Request;
pub use response::{ContentType, ErrorBody, IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::{DEFAULT_GRACE_PERIOD, Server};
pub use status::Status;
pub use views::Views;
