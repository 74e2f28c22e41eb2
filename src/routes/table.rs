//! Per-table CRUD routes. Each table gets its own sub-router carrying its metadata as an extension.

use crate::config::{TableInfo, TableRegistry};
use crate::handlers::crud::{create, delete, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Extension, Router};
use std::sync::Arc;

/// `GET|POST /{table}` and `GET|PUT|DELETE /{table}/:id` for one table.
pub fn table_router(table: Arc<TableInfo>) -> Router<AppState> {
    let collection = format!("/{}", table.name);
    let item = format!("/{}/:id", table.name);
    Router::new()
        .route(&collection, get(list).post(create))
        .route(&item, get(read).put(update).delete(delete))
        .layer(Extension(table))
}

/// CRUD routes for every table in the registry.
pub fn table_routes(registry: &TableRegistry) -> Router<AppState> {
    registry
        .tables()
        .fold(Router::new(), |router, table| router.merge(table_router(Arc::clone(table))))
}
