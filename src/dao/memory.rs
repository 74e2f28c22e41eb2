//! In-memory dao: per-table ordered maps. Used by tests and when no database is configured.

use super::{compare_values, values_match, Dao, ListQuery, Page};
use crate::config::{ColumnDefaultConfig, ColumnInfo, ColumnKind, PkType, RecordId, TableInfo, TIMESTAMP_FORMAT};
use crate::error::AppError;
use crate::service::Record;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

#[derive(Default)]
struct TableRows {
    rows: BTreeMap<RecordId, Map<String, Value>>,
    last_id: u64,
}

#[derive(Default)]
pub struct MemoryDao {
    tables: RwLock<HashMap<String, TableRows>>,
}

impl MemoryDao {
    pub fn new() -> Self {
        MemoryDao::default()
    }

    fn poisoned() -> AppError {
        AppError::Internal("memory store lock poisoned".into())
    }
}

fn default_value(column: &ColumnInfo) -> Value {
    match &column.default {
        Some(ColumnDefaultConfig::Literal(s)) => column.kind.literal_value(s),
        Some(ColumnDefaultConfig::Expression { expression }) => {
            let e = expression.to_lowercase();
            if column.kind == ColumnKind::Timestamp && (e.starts_with("current_timestamp") || e.starts_with("now(")) {
                Value::String(chrono::Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string())
            } else {
                Value::Null
            }
        }
        None => Value::Null,
    }
}

fn next_key(table: &TableInfo, rows: &mut TableRows) -> Result<RecordId, AppError> {
    let pk = table.primary_key();
    if !pk.is_auto_increment {
        return Err(AppError::Validation(format!("{} is required", pk.name)));
    }
    rows.last_id += 1;
    Ok(match table.pk_type {
        PkType::U32 | PkType::U64 => RecordId::Unsigned(rows.last_id),
        PkType::I32 | PkType::I64 => RecordId::Signed(rows.last_id as i64),
        PkType::Text => RecordId::Text(rows.last_id.to_string()),
    })
}

#[async_trait]
impl Dao for MemoryDao {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, table: &TableInfo, query: &ListQuery) -> Result<Page, AppError> {
        let guard = self.tables.read().map_err(|_| Self::poisoned())?;
        let Some(rows) = guard.get(&table.name) else {
            return Ok(Page::default());
        };
        let mut matched: Vec<&Map<String, Value>> = rows
            .rows
            .values()
            .filter(|row| {
                query
                    .filters
                    .iter()
                    .all(|(col, wanted)| values_match(row.get(col).unwrap_or(&Value::Null), wanted))
            })
            .collect();
        if !query.order.is_empty() {
            // Stable sort: rows come out of the map in key order, which breaks ties.
            matched.sort_by(|a, b| {
                for o in &query.order {
                    let x = a.get(&o.column).unwrap_or(&Value::Null);
                    let y = b.get(&o.column).unwrap_or(&Value::Null);
                    let ord = compare_values(x, y);
                    let ord = if o.descending { ord.reverse() } else { ord };
                    if ord.is_ne() {
                        return ord;
                    }
                }
                std::cmp::Ordering::Equal
            });
        }
        let total = matched.len() as u64;
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let data = matched
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .map(|row| Value::Object(row.clone()))
            .collect();
        Ok(Page { rows: data, total })
    }

    async fn get(&self, table: &TableInfo, id: &RecordId) -> Result<Value, AppError> {
        let guard = self.tables.read().map_err(|_| Self::poisoned())?;
        guard
            .get(&table.name)
            .and_then(|t| t.rows.get(id))
            .map(|row| Value::Object(row.clone()))
            .ok_or(AppError::NotFound)
    }

    async fn insert(&self, record: &Record) -> Result<Value, AppError> {
        let table = record.table();
        let pk = table.primary_key();
        let mut guard = self.tables.write().map_err(|_| Self::poisoned())?;
        let rows = guard.entry(table.name.clone()).or_default();

        let given = record
            .get(&pk.name)
            .filter(|v| !v.is_null())
            .map(|v| {
                RecordId::from_value(v, table.pk_type)
                    .ok_or_else(|| AppError::Validation(format!("{} must be a valid {}", pk.name, pk.kind.logical_name())))
            })
            .transpose()?;
        let key = match given {
            Some(key) => {
                if rows.rows.contains_key(&key) {
                    return Err(AppError::Validation(format!("duplicate entry '{}' for key {}", key, pk.name)));
                }
                if let RecordId::Unsigned(n) = key {
                    rows.last_id = rows.last_id.max(n);
                } else if let RecordId::Signed(n) = key {
                    rows.last_id = rows.last_id.max(u64::try_from(n).unwrap_or(0));
                }
                key
            }
            None => next_key(table, rows)?,
        };

        let mut row = Map::new();
        for c in &table.columns {
            let v = match record.get(&c.name) {
                _ if c.is_primary_key => key.to_json(),
                Some(v) if !v.is_null() || c.nullable => c.kind.normalize(v),
                _ => default_value(c),
            };
            row.insert(c.name.clone(), v);
        }
        tracing::debug!(table = %table.name, id = %key, "memory insert");
        rows.rows.insert(key, row.clone());
        Ok(Value::Object(row))
    }

    async fn update(&self, id: &RecordId, record: &Record) -> Result<Value, AppError> {
        let table = record.table();
        let mut guard = self.tables.write().map_err(|_| Self::poisoned())?;
        let existing = guard
            .get_mut(&table.name)
            .and_then(|t| t.rows.get_mut(id))
            .ok_or(AppError::NotFound)?;
        let mut row = Map::new();
        for c in &table.columns {
            let v = if c.is_primary_key {
                id.to_json()
            } else {
                record.get(&c.name).map(|v| c.kind.normalize(v)).unwrap_or(Value::Null)
            };
            row.insert(c.name.clone(), v);
        }
        *existing = row.clone();
        Ok(Value::Object(row))
    }

    async fn delete(&self, table: &TableInfo, id: &RecordId) -> Result<u64, AppError> {
        let mut guard = self.tables.write().map_err(|_| Self::poisoned())?;
        guard
            .get_mut(&table.name)
            .and_then(|t| t.rows.remove(id))
            .map(|_| 1)
            .ok_or(AppError::NotFound)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
