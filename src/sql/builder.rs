//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from table metadata.

use crate::config::{ColumnKind, RecordId, TableInfo};
use crate::dao::{ListQuery, OrderBy};
use crate::error::AppError;
use crate::sql::PgBindValue;
use serde_json::{Map, Value};

/// Quote identifier for PostgreSQL (safe: only from the registry).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(table: &TableInfo) -> String {
    format!("{}.{}", quoted(&table.schema_name), quoted(&table.name))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    fn push_param(&mut self, v: PgBindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }

    /// Bind `value` for `column` and return its cast placeholder (e.g. `$2::bigint`).
    fn placeholder(&mut self, table: &TableInfo, column: &str, value: &Value) -> Result<String, AppError> {
        let col = table
            .column(column)
            .ok_or_else(|| AppError::BadParams(format!("unknown column: {}", column)))?;
        let n = self.push_param(PgBindValue::for_column(&col.name, col.kind, value)?);
        Ok(format!("${}::{}", n, col.kind.pg_type()))
    }
}

/// SELECT list: numeric and time columns as text so they decode without extra sqlx features.
fn select_column_list(table: &TableInfo) -> String {
    table
        .columns
        .iter()
        .map(|c| {
            let q = quoted(&c.name);
            match c.kind {
                ColumnKind::Decimal | ColumnKind::Time => format!("{}::text AS {}", q, q),
                _ => q,
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn where_clause(q: &mut QueryBuf, table: &TableInfo, filters: &[(String, Value)]) -> Result<String, AppError> {
    let mut parts = Vec::with_capacity(filters.len());
    for (col, val) in filters {
        if val.is_null() {
            parts.push(format!("{} IS NULL", quoted(col)));
        } else {
            let ph = q.placeholder(table, col, val)?;
            parts.push(format!("{} = {}", quoted(col), ph));
        }
    }
    Ok(if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    })
}

fn order_clause(table: &TableInfo, order: &[OrderBy]) -> String {
    let pk = quoted(&table.primary_key().name);
    if order.is_empty() {
        return format!(" ORDER BY {}", pk);
    }
    let mut parts: Vec<String> = order
        .iter()
        .map(|o| format!("{} {}", quoted(&o.column), if o.descending { "DESC" } else { "ASC" }))
        .collect();
    if !order.iter().any(|o| o.column == table.primary_key().name) {
        parts.push(pk);
    }
    format!(" ORDER BY {}", parts.join(", "))
}

/// One page of rows: filters, ORDER BY (primary key as tiebreaker), LIMIT/OFFSET.
pub fn select_page(table: &TableInfo, query: &ListQuery) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, table, &query.filters)?;
    q.sql = format!(
        "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
        select_column_list(table),
        qualified_table(table),
        where_sql,
        order_clause(table, &query.order),
        query.limit,
        query.offset
    );
    Ok(q)
}

/// COUNT(*) with the same filters as [`select_page`].
pub fn count(table: &TableInfo, filters: &[(String, Value)]) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, table, filters)?;
    q.sql = format!("SELECT COUNT(*) FROM {}{}", qualified_table(table), where_sql);
    Ok(q)
}

/// SELECT by primary key.
pub fn select_by_id(table: &TableInfo, id: &RecordId) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let pk = &table.primary_key().name;
    let ph = q.placeholder(table, pk, &id.to_json())?;
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(table),
        qualified_table(table),
        quoted(pk),
        ph
    );
    Ok(q)
}

/// INSERT the columns present in `fields`; absent columns fall back to the database default.
pub fn insert(table: &TableInfo, fields: &Map<String, Value>) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &table.columns {
        let Some(val) = fields.get(&c.name) else { continue };
        if val.is_null() && (c.is_auto_increment || (!c.nullable && c.has_default())) {
            continue;
        }
        placeholders.push(q.placeholder(table, &c.name, val)?);
        cols.push(quoted(&c.name));
    }
    let returning = select_column_list(table);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", qualified_table(table), returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            qualified_table(table),
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    Ok(q)
}

/// UPDATE by id, replacing every non-key column: absent fields are written as NULL.
pub fn update(table: &TableInfo, id: &RecordId, fields: &Map<String, Value>) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let pk = &table.primary_key().name;
    let mut sets = Vec::new();
    for c in table.columns.iter().filter(|c| !c.is_primary_key) {
        let val = fields.get(&c.name).unwrap_or(&Value::Null);
        let ph = q.placeholder(table, &c.name, val)?;
        sets.push(format!("{} = {}", quoted(&c.name), ph));
    }
    let id_ph = q.placeholder(table, pk, &id.to_json())?;
    let returning = select_column_list(table);
    q.sql = if sets.is_empty() {
        format!(
            "SELECT {} FROM {} WHERE {} = {}",
            returning,
            qualified_table(table),
            quoted(pk),
            id_ph
        )
    } else {
        format!(
            "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
            qualified_table(table),
            sets.join(", "),
            quoted(pk),
            id_ph,
            returning
        )
    };
    Ok(q)
}

/// DELETE by id.
pub fn delete(table: &TableInfo, id: &RecordId) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let pk = &table.primary_key().name;
    let ph = q.placeholder(table, pk, &id.to_json())?;
    q.sql = format!("DELETE FROM {} WHERE {} = {}", qualified_table(table), quoted(pk), ph);
    Ok(q)
}
