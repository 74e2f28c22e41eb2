//! Router assembly: table CRUD, DDL and common routes behind body-limit and trace layers.
//!
//! The body limit is axum's `DefaultBodyLimit`, enforced when a handler reads the body, so an
//! oversized request is rejected through [`JsonObject`](crate::extractors::JsonObject) with the
//! standard error body.

pub mod common;
pub mod ddl;
pub mod table;

pub use common::common_routes;
pub use ddl::ddl_routes;
pub use table::{table_router, table_routes};

use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;

/// Default request body limit in bytes.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// The full application router for `state`.
pub fn app(state: AppState, body_limit: usize) -> Router {
    let tables = table_routes(&state.registry);
    Router::new()
        .merge(common_routes())
        .merge(ddl_routes())
        .merge(tables)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
