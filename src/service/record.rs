//! The per-table model contract and the dynamic record every table shares.

use crate::config::{ColumnInfo, RecordId, TableInfo, TIMESTAMP_FORMAT};
use crate::error::AppError;
use crate::hooks::Action;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Contract every table model satisfies. `before_save` and `validate` default to no-ops.
pub trait Model {
    fn table_name(&self) -> &str;

    fn before_save(&mut self) -> Result<(), AppError> {
        Ok(())
    }

    fn prepare(&mut self) {}

    fn validate(&self, _action: Action) -> Result<(), AppError> {
        Ok(())
    }
}

/// Laravel-managed timestamp columns.
const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";

/// One row of any table, keyed by column name.
#[derive(Clone, Debug)]
pub struct Record {
    table: Arc<TableInfo>,
    action: Action,
    fields: Map<String, Value>,
}

impl Record {
    /// Record decoded from a request body for `action` (Create or Update).
    pub fn new(table: Arc<TableInfo>, action: Action, fields: Map<String, Value>) -> Self {
        Record { table, action, fields }
    }

    pub fn table(&self) -> &TableInfo {
        &self.table
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// The path id wins over any key in the body.
    pub fn set_primary_key(&mut self, id: &RecordId) {
        let pk = self.table.primary_key().name.clone();
        self.fields.insert(pk, id.to_json());
    }

    fn is_timestamp_column(&self, name: &str) -> bool {
        self.table
            .column(name)
            .map(|c| c.kind == crate::config::ColumnKind::Timestamp)
            .unwrap_or(false)
    }

    fn check_column(&self, column: &ColumnInfo, value: Option<&Value>, action: Action) -> Result<(), AppError> {
        match value {
            Some(Value::Null) if !column.nullable => Err(AppError::Validation(format!(
                "{} must not be null",
                column.name
            ))),
            Some(Value::Null) => Ok(()),
            Some(v) if !column.kind.accepts(v) => Err(AppError::Validation(format!(
                "{} must be a valid {}",
                column.name,
                column.kind.logical_name()
            ))),
            Some(_) => Ok(()),
            None if column.nullable => Ok(()),
            None => {
                let optional = match action {
                    Action::Create => column.has_default() || column.is_auto_increment,
                    _ => column.is_primary_key,
                };
                if optional {
                    Ok(())
                } else {
                    Err(AppError::Validation(format!("{} is required", column.name)))
                }
            }
        }
    }
}

impl Model for Record {
    fn table_name(&self) -> &str {
        &self.table.name
    }

    /// Drop keys that are not columns and maintain `created_at` / `updated_at`.
    fn prepare(&mut self) {
        let table = Arc::clone(&self.table);
        self.fields.retain(|k, _| {
            let known = table.has_column(k);
            if !known {
                tracing::debug!(table = %table.name, field = %k, "ignoring unknown field");
            }
            known
        });

        let now = Value::String(chrono::Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string());
        if self.action == Action::Create
            && self.is_timestamp_column(CREATED_AT)
            && self.fields.get(CREATED_AT).map_or(true, Value::is_null)
        {
            self.fields.insert(CREATED_AT.to_string(), now.clone());
        }
        if self.is_timestamp_column(UPDATED_AT) {
            self.fields.insert(UPDATED_AT.to_string(), now);
        }
    }

    fn validate(&self, action: Action) -> Result<(), AppError> {
        for column in &self.table.columns {
            self.check_column(column, self.fields.get(&column.name), action)?;
        }
        Ok(())
    }
}
