//! Load the schema document (compiled-in or from a file) and resolve it into a registry.

use crate::config::resolved::{ColumnInfo, ColumnKind, PkType, TableInfo, TableRegistry};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use std::path::Path;

/// Schema of the laravel database, compiled into the binary.
pub const BUILTIN_SCHEMA: &str = include_str!("../../schema/laravel.json");

pub fn parse_document(json: &str) -> Result<SchemaDocument, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

pub fn builtin_document() -> Result<SchemaDocument, ConfigError> {
    parse_document(BUILTIN_SCHEMA)
}

pub async fn load_document(path: &Path) -> Result<SchemaDocument, ConfigError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_document(&text)
}

/// Build the table registry from a schema document (validates first).
pub fn resolve(doc: &SchemaDocument) -> Result<TableRegistry, ConfigError> {
    validate(doc)?;

    let mut tables = Vec::with_capacity(doc.tables.len());
    for t in &doc.tables {
        let mut columns = Vec::with_capacity(t.columns.len());
        let mut pk_index = 0;
        for (index, c) in t.columns.iter().enumerate() {
            let kind = ColumnKind::parse(&c.type_).ok_or_else(|| ConfigError::UnknownColumnType {
                table: t.name.clone(),
                column: c.name.clone(),
                type_name: c.type_.clone(),
            })?;
            let is_primary_key = c.name == t.primary_key;
            if is_primary_key {
                pk_index = index;
            }
            let type_name = c.type_.trim().to_uppercase();
            let pretty = match c.length {
                Some(len) => match type_name.split_once(' ') {
                    Some((base, rest)) => format!("{}({}) {}", base, len, rest),
                    None => format!("{}({})", type_name, len),
                },
                None => type_name.clone(),
            };
            columns.push(ColumnInfo {
                index,
                name: c.name.clone(),
                comment: c.comment.clone(),
                nullable: c.nullable,
                database_type_name: type_name,
                database_type_pretty: pretty,
                kind,
                column_length: c.length,
                is_primary_key,
                is_auto_increment: c.auto_increment,
                default_value: c.default.as_ref().map(ColumnDefaultConfig::display),
                default: c.default.clone(),
                json_field_name: c.name.clone(),
            });
        }
        let pk_type = PkType::for_kind(columns[pk_index].kind).ok_or_else(|| ConfigError::InvalidPrimaryKey {
            table: t.name.clone(),
            column: t.primary_key.clone(),
        })?;
        tables.push(TableInfo {
            name: t.name.clone(),
            comment: t.comment.clone(),
            schema_name: doc.schema.clone(),
            columns,
            pk_index,
            pk_type,
        });
    }

    Ok(TableRegistry::new(tables))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_schema_resolves() {
        let registry = resolve(&builtin_document().unwrap()).unwrap();
        assert!(registry.len() >= 40);
        let blocks = registry.get("blocks").unwrap();
        assert_eq!(blocks.primary_key().name, "id");
        assert_eq!(blocks.pk_type, PkType::U64);
        assert!(blocks.has_column("page_id"));
        let sessions = registry.get("sessions").unwrap();
        assert_eq!(sessions.pk_type, PkType::Text);
    }

    #[test]
    fn pretty_type_carries_length() {
        let doc = parse_document(
            r#"{"tables":[{"name":"t","primary_key":"id","columns":[
                {"name":"id","type":"int unsigned","nullable":false,"length":10},
                {"name":"title","type":"varchar","length":191}
            ]}]}"#,
        )
        .unwrap();
        let registry = resolve(&doc).unwrap();
        let t = registry.get("t").unwrap();
        assert_eq!(t.columns[0].database_type_pretty, "INT(10) UNSIGNED");
        assert_eq!(t.columns[1].database_type_pretty, "VARCHAR(191)");
        assert_eq!(t.schema_name, "public");
        assert_eq!(t.pk_type, PkType::U32);
    }

    #[test]
    fn malformed_document_is_a_load_error() {
        assert!(matches!(parse_document("{"), Err(ConfigError::Load(_))));
    }
}
