//! The service's route table.

use std::sync::Arc;

use crate::app::App;
use crate::request::Request;
use crate::router::Router;

/// Binds every endpoint to its [`App`] handler.
///
/// | Path | View |
/// |---|---|
/// | `GET /` | landing page |
/// | `GET /components` | full catalog |
/// | `GET /filtered-components` | filter → sort → paginate |
pub fn router(app: Arc<App>) -> Router {
    let index = Arc::clone(&app);
    let components = Arc::clone(&app);
    let filtered = app;

    Router::new()
        .get("/", move |req: Request| {
            let app = Arc::clone(&index);
            async move { app.index(&req) }
        })
        .get("/components", move |req: Request| {
            let app = Arc::clone(&components);
            async move { app.components(&req) }
        })
        .get("/filtered-components", move |req: Request| {
            let app = Arc::clone(&filtered);
            async move { app.filtered_components(&req) }
        })
}
