//! Request handlers for the catalog pages.
//!
//! [`App`] owns every dependency a handler touches: the component source
//! and the parsed views. It is built once, wrapped in an `Arc`, and captured
//! by the route closures in [`routes`](crate::routes).

use std::sync::Arc;

use minijinja::context;
use tracing::{error, info};

use crate::catalog::ComponentSource;
use crate::pipeline::{self, ComponentQuery, NoData, PER_PAGE};
use crate::request::Request;
use crate::response::{ErrorBody, Response};
use crate::status::Status;
use crate::views::{self, Views};

pub struct App {
    catalog: Arc<dyn ComponentSource>,
    views: Views,
}

impl App {
    pub fn new(catalog: Arc<dyn ComponentSource>, views: Views) -> Self {
        Self { catalog, views }
    }

    /// `GET /`
    pub fn index(&self, _req: &Request) -> Response {
        self.render(views::INDEX, context! {})
    }

    /// `GET /components`: the whole catalog, unfiltered and unpaginated.
    pub fn components(&self, _req: &Request) -> Response {
        self.render(views::COMPONENTS, context! { components => self.catalog.components() })
    }

    /// `GET /filtered-components?type=&brand=&sort=&page=`
    pub fn filtered_components(&self, req: &Request) -> Response {
        let query = ComponentQuery {
            kind: req.query_or_empty("type").to_owned(),
            brand: req.query_or_empty("brand").to_owned(),
            sort: req.query_or_empty("sort").to_owned(),
            page: req.query_or_empty("page").to_owned(),
        };

        let page = match pipeline::run(self.catalog.components(), &query, PER_PAGE) {
            Ok(page) => page,
            Err(NoData) => {
                info!(type_filter = %query.kind, brand_filter = %query.brand, "no components matched");
                return ErrorBody::respond(&NoData.to_string(), Status::NotFound);
            }
        };

        info!(
            type_filter = %query.kind,
            brand_filter = %query.brand,
            sort = %query.sort,
            page = %query.page,
            per_page = page.per_page,
            matched = page.matched,
            returned = page.items.len(),
            "filtered and paginated components"
        );

        self.render(
            views::COMPONENTS,
            context! {
                components => &page.items,
                page => context! {
                    number => page.number,
                    matched => page.matched,
                    per_page => page.per_page,
                },
            },
        )
    }

    fn render(&self, view: &str, ctx: minijinja::Value) -> Response {
        match self.views.render(view, ctx) {
            Ok(html) => Response::html(html),
            Err(e) => {
                error!(view, "render failed: {e}");
                Response::status(Status::InternalServerError)
            }
        }
    }
}
