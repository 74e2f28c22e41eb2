use crate::handlers::{ddl_all, ddl_table};
use crate::state::AppState;
use axum::{routing::get, Router};

/// `GET /ddl` and `GET /ddl/:table`.
pub fn ddl_routes() -> Router<AppState> {
    Router::new()
        .route("/ddl", get(ddl_all))
        .route("/ddl/:table", get(ddl_table))
}
