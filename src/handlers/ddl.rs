//! Column metadata for the compiled-in tables.

use crate::config::{TableInfo, TableRegistry};
use crate::error::AppError;
use crate::extractors::PathParam;
use crate::hooks::RequestContext;
use crate::service::CrudService;
use crate::state::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

pub async fn ddl_all(State(state): State<AppState>, ctx: RequestContext) -> Result<Json<TableRegistry>, AppError> {
    let registry = CrudService::new(&state).ddl_all(&ctx).await?;
    Ok(Json(registry.clone()))
}

pub async fn ddl_table(
    State(state): State<AppState>,
    ctx: RequestContext,
    PathParam(table): PathParam,
) -> Result<Json<Arc<TableInfo>>, AppError> {
    let info = CrudService::new(&state).ddl_one(&ctx, &table).await?;
    Ok(Json(Arc::clone(info)))
}
