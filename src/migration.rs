//! Create the registry's tables in PostgreSQL: schema first, then one `CREATE TABLE IF NOT EXISTS`
//! per table. Existing tables are left untouched.

use crate::config::{ColumnDefaultConfig, ColumnInfo, ColumnKind, TableInfo, TableRegistry};
use crate::error::AppError;
use crate::sql::builder::{qualified_table, quoted};
use sqlx::PgPool;
use std::collections::BTreeSet;

fn literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn default_sql(column: &ColumnInfo) -> Option<String> {
    let sql = match column.default.as_ref()? {
        ColumnDefaultConfig::Expression { expression } => expression.clone(),
        ColumnDefaultConfig::Literal(s) => match column.kind {
            ColumnKind::Int { .. } | ColumnKind::Float | ColumnKind::Decimal if s.parse::<f64>().is_ok() => s.clone(),
            ColumnKind::Bool => match s.to_ascii_lowercase().as_str() {
                "1" | "true" => "true".into(),
                "0" | "false" => "false".into(),
                _ => literal(s),
            },
            _ => literal(s),
        },
    };
    Some(sql)
}

fn column_def(column: &ColumnInfo) -> String {
    let mut def = format!("{} {}", quoted(&column.name), column.kind.pg_type());
    if column.is_auto_increment {
        def.push_str(" GENERATED BY DEFAULT AS IDENTITY");
    } else if let Some(d) = default_sql(column) {
        def.push_str(" DEFAULT ");
        def.push_str(&d);
    }
    if !column.nullable || column.is_primary_key {
        def.push_str(" NOT NULL");
    }
    def
}

/// `CREATE TABLE IF NOT EXISTS` statement for one table.
pub fn create_table_sql(table: &TableInfo) -> String {
    let mut defs: Vec<String> = table.columns.iter().map(column_def).collect();
    defs.push(format!("PRIMARY KEY ({})", quoted(&table.primary_key().name)));
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        qualified_table(table),
        defs.join(",\n    ")
    )
}

/// Create schemas and tables for every registry entry. Comments are applied best effort.
pub async fn apply_migrations(pool: &PgPool, registry: &TableRegistry) -> Result<(), AppError> {
    let schemas: BTreeSet<&str> = registry.tables().map(|t| t.schema_name.as_str()).collect();
    for schema in schemas {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
            .execute(pool)
            .await?;
    }

    for table in registry.tables() {
        let ddl = create_table_sql(table);
        tracing::debug!(table = %table.name, sql = %ddl, "migrate");
        sqlx::query(&ddl).execute(pool).await?;

        if let Some(c) = &table.comment {
            let sql = format!("COMMENT ON TABLE {} IS {}", qualified_table(table), literal(c));
            if let Err(e) = sqlx::query(&sql).execute(pool).await {
                tracing::warn!(table = %table.name, error = %e, "table comment not applied");
            }
        }
        for column in table.columns.iter().filter(|c| c.comment.is_some()) {
            let sql = format!(
                "COMMENT ON COLUMN {}.{} IS {}",
                qualified_table(table),
                quoted(&column.name),
                literal(column.comment.as_deref().unwrap_or_default())
            );
            if let Err(e) = sqlx::query(&sql).execute(pool).await {
                tracing::warn!(table = %table.name, column = %column.name, error = %e, "column comment not applied");
            }
        }
    }
    tracing::info!(tables = registry.len(), "migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_document, resolve};

    #[test]
    fn create_table_maps_types_defaults_and_identity() {
        let doc = parse_document(
            r#"{"schema":"app","tables":[{"name":"apps","primary_key":"id","columns":[
                {"name":"id","type":"bigint unsigned","nullable":false,"auto_increment":true},
                {"name":"name","type":"varchar","length":255,"nullable":false},
                {"name":"is_active","type":"boolean","nullable":false,"default":true},
                {"name":"status","type":"varchar","default":"it's"},
                {"name":"created_at","type":"timestamp","default":{"expression":"CURRENT_TIMESTAMP"}}
            ]}]}"#,
        )
        .unwrap();
        let reg = resolve(&doc).unwrap();
        let sql = create_table_sql(reg.get("apps").unwrap());
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"app\".\"apps\" (\n    \
             \"id\" bigint GENERATED BY DEFAULT AS IDENTITY NOT NULL,\n    \
             \"name\" text NOT NULL,\n    \
             \"is_active\" boolean DEFAULT true NOT NULL,\n    \
             \"status\" text DEFAULT 'it''s',\n    \
             \"created_at\" timestamp DEFAULT CURRENT_TIMESTAMP,\n    \
             PRIMARY KEY (\"id\")\n)"
        );
    }
}
