//! Table CRUD handlers. One set serves every table; the table comes from the route's extension.

use crate::config::TableInfo;
use crate::error::AppError;
use crate::extractors::{JsonObject, ListParams, PathParam};
use crate::hooks::RequestContext;
use crate::response::PagedResults;
use crate::service::CrudService;
use crate::state::AppState;
use axum::{extract::State, Extension, Json};
use serde_json::Value;
use std::sync::Arc;

pub async fn list(
    State(state): State<AppState>,
    Extension(table): Extension<Arc<TableInfo>>,
    ctx: RequestContext,
    params: ListParams,
) -> Result<Json<PagedResults>, AppError> {
    let page = CrudService::new(&state).list(&ctx, &table, &params).await?;
    Ok(Json(page))
}

pub async fn read(
    State(state): State<AppState>,
    Extension(table): Extension<Arc<TableInfo>>,
    ctx: RequestContext,
    PathParam(id): PathParam,
) -> Result<Json<Value>, AppError> {
    let row = CrudService::new(&state).get(&ctx, &table, &id).await?;
    Ok(Json(row))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(table): Extension<Arc<TableInfo>>,
    ctx: RequestContext,
    JsonObject(body): JsonObject,
) -> Result<Json<Value>, AppError> {
    let row = CrudService::new(&state).create(&ctx, &table, body).await?;
    Ok(Json(row))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(table): Extension<Arc<TableInfo>>,
    ctx: RequestContext,
    PathParam(id): PathParam,
    JsonObject(body): JsonObject,
) -> Result<Json<Value>, AppError> {
    let row = CrudService::new(&state).update(&ctx, &table, &id, body).await?;
    Ok(Json(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(table): Extension<Arc<TableInfo>>,
    ctx: RequestContext,
    PathParam(id): PathParam,
) -> Result<Json<u64>, AppError> {
    let affected = CrudService::new(&state).delete(&ctx, &table, &id).await?;
    Ok(Json(affected))
}
