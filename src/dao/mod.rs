//! Data access: one trait, a PostgreSQL implementation and an in-memory one.

mod memory;
mod postgres;

pub use memory::MemoryDao;
pub use postgres::PgDao;

use crate::config::{RecordId, TableInfo};
use crate::error::AppError;
use crate::service::Record;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

/// A resolved list request: every column named here exists in the table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListQuery {
    pub offset: u64,
    pub limit: u32,
    pub order: Vec<OrderBy>,
    /// Exact-match filters; a null value matches NULL.
    pub filters: Vec<(String, Value)>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub rows: Vec<Value>,
    /// Rows matching the filters, ignoring paging.
    pub total: u64,
}

#[async_trait]
pub trait Dao: Send + Sync {
    /// Short name for logs ("postgres", "memory").
    fn kind(&self) -> &'static str;

    async fn list(&self, table: &TableInfo, query: &ListQuery) -> Result<Page, AppError>;

    /// `AppError::NotFound` when no row has this key.
    async fn get(&self, table: &TableInfo, id: &RecordId) -> Result<Value, AppError>;

    /// Returns the stored row, including generated keys and defaults.
    async fn insert(&self, record: &Record) -> Result<Value, AppError>;

    /// Full replace of the row with key `id`. `AppError::NotFound` when missing.
    async fn update(&self, id: &RecordId, record: &Record) -> Result<Value, AppError>;

    /// Returns rows affected. `AppError::NotFound` when missing.
    async fn delete(&self, table: &TableInfo, id: &RecordId) -> Result<u64, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

/// Ordering used for sorting JSON cells: null first, then numbers, strings, booleans.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Number(_) => 1,
            Value::String(_) => 2,
            Value::Bool(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i.cmp(&j),
            _ => x
                .as_f64()
                .unwrap_or(0.0)
                .partial_cmp(&y.as_f64().unwrap_or(0.0))
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ if rank(a) == rank(b) => a.to_string().cmp(&b.to_string()),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Equality used by filters: numbers compare by value.
pub(crate) fn values_match(cell: &Value, wanted: &Value) -> bool {
    match (cell, wanted) {
        (Value::Number(_), Value::Number(_)) => compare_values(cell, wanted) == Ordering::Equal,
        _ => cell == wanted,
    }
}
