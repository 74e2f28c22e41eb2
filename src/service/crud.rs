//! CrudService: the uniform per-table operation template.
//!
//! Every operation runs the same steps: model hooks (`before_save`, `prepare`, `validate`) for
//! writes, then the request validator hook, then one dao call.

use crate::config::{RecordId, TableInfo, TableRegistry};
use crate::dao::{Dao, ListQuery, OrderBy};
use crate::error::AppError;
use crate::extractors::ListParams;
use crate::hooks::{Action, RequestContext, RequestValidator};
use crate::response::PagedResults;
use crate::service::{Model, Record};
use crate::state::AppState;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Table name passed to the request validator for the DDL listing.
pub const DDL_TABLE: &str = "ddl";

pub struct CrudService<'a> {
    dao: &'a dyn Dao,
    validator: &'a dyn RequestValidator,
    registry: &'a TableRegistry,
}

impl<'a> CrudService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        CrudService {
            dao: state.dao.as_ref(),
            validator: state.hooks.request_validator.as_ref(),
            registry: state.registry.as_ref(),
        }
    }

    async fn authorize(&self, ctx: &RequestContext, table: &str, action: Action) -> Result<(), AppError> {
        self.validator.validate(ctx, table, action).await.map_err(|e| {
            tracing::warn!(
                request_id = %ctx.request_id,
                table = %table,
                action = %action,
                error = %e,
                "request validator rejected"
            );
            e
        })
    }

    pub async fn list(
        &self,
        ctx: &RequestContext,
        table: &TableInfo,
        params: &ListParams,
    ) -> Result<PagedResults, AppError> {
        let query = build_list_query(table, params)?;
        self.authorize(ctx, &table.name, Action::RetrieveMany).await?;
        let page = self.dao.list(table, &query).await?;
        Ok(PagedResults {
            page: u64::from(params.page),
            page_size: u64::from(params.page_size),
            data: page.rows,
            total_records: page.total,
        })
    }

    pub async fn get(&self, ctx: &RequestContext, table: &TableInfo, id: &str) -> Result<Value, AppError> {
        let id = RecordId::parse(id, table.pk_type)?;
        self.authorize(ctx, &table.name, Action::RetrieveOne).await?;
        self.dao.get(table, &id).await
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        table: &Arc<TableInfo>,
        body: Map<String, Value>,
    ) -> Result<Value, AppError> {
        let mut record = Record::new(Arc::clone(table), Action::Create, body);
        record.before_save()?;
        record.prepare();
        record.validate(Action::Create)?;
        self.authorize(ctx, &table.name, Action::Create).await?;
        self.dao.insert(&record).await
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        table: &Arc<TableInfo>,
        id: &str,
        body: Map<String, Value>,
    ) -> Result<Value, AppError> {
        let id = RecordId::parse(id, table.pk_type)?;
        let mut record = Record::new(Arc::clone(table), Action::Update, body);
        record.set_primary_key(&id);
        record.before_save()?;
        record.prepare();
        record.validate(Action::Update)?;
        self.authorize(ctx, &table.name, Action::Update).await?;
        self.dao.update(&id, &record).await
    }

    pub async fn delete(&self, ctx: &RequestContext, table: &TableInfo, id: &str) -> Result<u64, AppError> {
        let id = RecordId::parse(id, table.pk_type)?;
        self.authorize(ctx, &table.name, Action::Delete).await?;
        self.dao.delete(table, &id).await
    }

    /// Metadata of every table.
    pub async fn ddl_all(&self, ctx: &RequestContext) -> Result<&'a TableRegistry, AppError> {
        self.authorize(ctx, DDL_TABLE, Action::FetchDdl).await?;
        Ok(self.registry)
    }

    /// Metadata of one table; unknown names are not found.
    pub async fn ddl_one(&self, ctx: &RequestContext, name: &str) -> Result<&'a Arc<TableInfo>, AppError> {
        self.authorize(ctx, name, Action::FetchDdl).await?;
        self.registry.get(name).ok_or(AppError::NotFound)
    }
}

/// Parse `order`: comma-separated `column`, `column asc|desc` or `-column`. Columns must exist.
pub fn parse_order(table: &TableInfo, order: &str) -> Result<Vec<OrderBy>, AppError> {
    let mut out = Vec::new();
    for part in order.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let mut words = part.split_whitespace();
        let first = words.next().unwrap_or_default();
        let (column, mut descending) = match first.strip_prefix('-') {
            Some(c) => (c, true),
            None => (first, false),
        };
        match words.next().map(str::to_ascii_lowercase).as_deref() {
            None => {}
            Some("asc") => descending = false,
            Some("desc") => descending = true,
            Some(other) => {
                return Err(AppError::BadParams(format!("invalid order direction: {}", other)));
            }
        }
        if words.next().is_some() || !table.has_column(column) {
            return Err(AppError::BadParams(format!("invalid order: {}", part)));
        }
        out.push(OrderBy {
            column: column.to_string(),
            descending,
        });
    }
    Ok(out)
}

/// Resolve list params against the table: order columns checked, filters on known columns only.
/// A filter value the column cannot hold is a bad param.
pub fn build_list_query(table: &TableInfo, params: &ListParams) -> Result<ListQuery, AppError> {
    let order = match &params.order {
        Some(o) => parse_order(table, o)?,
        None => Vec::new(),
    };
    let mut filters = Vec::new();
    for (k, v) in &params.filters {
        let Some(c) = table.column(k) else { continue };
        let value = if v.eq_ignore_ascii_case("null") && c.nullable {
            Value::Null
        } else {
            c.kind
                .parse_filter(v)
                .ok_or_else(|| AppError::BadParams(format!("invalid value for {}: {}", c.name, v)))?
        };
        filters.push((c.name.clone(), value));
    }
    Ok(ListQuery {
        offset: u64::from(params.page) * u64::from(params.page_size),
        limit: params.page_size,
        order,
        filters,
    })
}
