//! Schema document validation: identifiers, uniqueness, primary keys, column types.

use crate::config::{ColumnKind, PkType, SchemaDocument};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("valid regex"));

/// Paths mounted next to the table routes; a table may not shadow them.
pub const RESERVED_TABLE_NAMES: &[&str] = &["ddl", "health", "ready", "version"];

pub fn is_identifier(s: &str) -> bool {
    IDENTIFIER_RE.is_match(s)
}

fn check_identifier(kind: &'static str, name: &str) -> Result<(), ConfigError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            kind,
            name: name.to_string(),
        })
    }
}

pub fn validate(doc: &SchemaDocument) -> Result<(), ConfigError> {
    check_identifier("schema", &doc.schema)?;
    if doc.tables.is_empty() {
        return Err(ConfigError::Validation("at least one table required".into()));
    }

    let mut table_names = HashSet::new();
    for t in &doc.tables {
        check_identifier("table", &t.name)?;
        if RESERVED_TABLE_NAMES.contains(&t.name.as_str()) {
            return Err(ConfigError::ReservedName(t.name.clone()));
        }
        if !table_names.insert(t.name.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "table",
                name: t.name.clone(),
            });
        }

        let mut column_names = HashSet::new();
        for c in &t.columns {
            check_identifier("column", &c.name)?;
            if !column_names.insert(c.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "column",
                    name: format!("{}.{}", t.name, c.name),
                });
            }
            let kind = ColumnKind::parse(&c.type_).ok_or_else(|| ConfigError::UnknownColumnType {
                table: t.name.clone(),
                column: c.name.clone(),
                type_name: c.type_.clone(),
            })?;
            if c.auto_increment && !matches!(kind, ColumnKind::Int { .. }) {
                return Err(ConfigError::Validation(format!(
                    "{}.{}: auto_increment requires an integer column",
                    t.name, c.name
                )));
            }
        }

        let pk = t
            .columns
            .iter()
            .find(|c| c.name == t.primary_key)
            .ok_or_else(|| ConfigError::InvalidPrimaryKey {
                table: t.name.clone(),
                column: t.primary_key.clone(),
            })?;
        let pk_ok = !pk.nullable
            && ColumnKind::parse(&pk.type_)
                .and_then(PkType::for_kind)
                .is_some();
        if !pk_ok {
            return Err(ConfigError::InvalidPrimaryKey {
                table: t.name.clone(),
                column: pk.name.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> SchemaDocument {
        serde_json::from_value(v).unwrap()
    }

    fn apps() -> serde_json::Value {
        json!({
            "tables": [{
                "name": "apps",
                "primary_key": "id",
                "columns": [
                    { "name": "id", "type": "bigint unsigned", "nullable": false, "auto_increment": true },
                    { "name": "name", "type": "varchar", "length": 255, "nullable": false }
                ]
            }]
        })
    }

    #[test]
    fn accepts_minimal_document() {
        validate(&doc(apps())).unwrap();
    }

    #[test]
    fn rejects_missing_primary_key_column() {
        let mut v = apps();
        v["tables"][0]["primary_key"] = json!("uuid");
        let err = validate(&doc(v)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrimaryKey { .. }));
    }

    #[test]
    fn rejects_nullable_or_non_scalar_primary_key() {
        let mut v = apps();
        v["tables"][0]["columns"][0]["nullable"] = json!(true);
        assert!(matches!(
            validate(&doc(v)).unwrap_err(),
            ConfigError::InvalidPrimaryKey { .. }
        ));

        let mut v = apps();
        v["tables"][0]["primary_key"] = json!("name");
        v["tables"][0]["columns"][1]["type"] = json!("json");
        assert!(matches!(
            validate(&doc(v)).unwrap_err(),
            ConfigError::InvalidPrimaryKey { .. }
        ));
    }

    #[test]
    fn rejects_reserved_and_duplicate_tables() {
        let mut v = apps();
        v["tables"][0]["name"] = json!("ddl");
        assert!(matches!(validate(&doc(v)).unwrap_err(), ConfigError::ReservedName(_)));

        let mut v = apps();
        let t = v["tables"][0].clone();
        v["tables"].as_array_mut().unwrap().push(t);
        assert!(matches!(validate(&doc(v)).unwrap_err(), ConfigError::Duplicate { kind: "table", .. }));
    }

    #[test]
    fn rejects_bad_identifiers_and_types() {
        let mut v = apps();
        v["tables"][0]["columns"][1]["name"] = json!("name; drop table apps");
        assert!(matches!(
            validate(&doc(v)).unwrap_err(),
            ConfigError::InvalidIdentifier { kind: "column", .. }
        ));

        let mut v = apps();
        v["tables"][0]["columns"][1]["type"] = json!("geometry");
        assert!(matches!(validate(&doc(v)).unwrap_err(), ConfigError::UnknownColumnType { .. }));
    }

    #[test]
    fn auto_increment_needs_integer() {
        let mut v = apps();
        v["tables"][0]["columns"][1]["auto_increment"] = json!(true);
        assert!(matches!(validate(&doc(v)).unwrap_err(), ConfigError::Validation(_)));
    }
}
