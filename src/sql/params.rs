//! Convert serde_json::Value to types that sqlx can bind, guided by the target column.

use crate::config::ColumnKind;
use crate::error::AppError;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

/// A value that can be bound to a PostgreSQL query. Each variant reports its own wire type,
/// and the SQL casts the placeholder to the column type (`$1::bigint`).
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
    Json(Value),
}

impl PgBindValue {
    pub fn for_column(column: &str, kind: ColumnKind, v: &Value) -> Result<Self, AppError> {
        let mismatch = || AppError::BadParams(format!("invalid value for {}: {}", column, v));
        let normalized = kind.normalize(v);
        Ok(match (kind, &normalized) {
            (_, Value::Null) => PgBindValue::Null,
            (ColumnKind::Json, _) => PgBindValue::Json(v.clone()),
            (ColumnKind::Int { .. }, Value::Number(n)) => {
                PgBindValue::I64(n.as_i64().ok_or_else(|| {
                    AppError::BadParams(format!("{} is out of range", column))
                })?)
            }
            (ColumnKind::Int { .. }, _) => return Err(mismatch()),
            (ColumnKind::Bool, Value::Bool(b)) => PgBindValue::Bool(*b),
            (ColumnKind::Bool, _) => return Err(mismatch()),
            (ColumnKind::Float, Value::Number(n)) => PgBindValue::F64(n.as_f64().ok_or_else(mismatch)?),
            (ColumnKind::Float, _) => return Err(mismatch()),
            (_, Value::String(s)) => PgBindValue::Text(s.clone()),
            (_, other) => PgBindValue::Text(other.to_string()),
        })
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null => <Option<String> as Encode<Postgres>>::encode_by_ref(&None, buf)?,
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::Text(s) => <String as Encode<Postgres>>::encode_by_ref(s, buf)?,
            PgBindValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            PgBindValue::Null | PgBindValue::Text(_) => <String as sqlx::Type<Postgres>>::type_info(),
            PgBindValue::Bool(_) => <bool as sqlx::Type<Postgres>>::type_info(),
            PgBindValue::I64(_) => <i64 as sqlx::Type<Postgres>>::type_info(),
            PgBindValue::F64(_) => <f64 as sqlx::Type<Postgres>>::type_info(),
            PgBindValue::Json(_) => <Value as sqlx::Type<Postgres>>::type_info(),
        })
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn binds_follow_column_kind() {
        let int = ColumnKind::Int { bits: 64, unsigned: true };
        assert_eq!(PgBindValue::for_column("id", int, &json!(5)).unwrap(), PgBindValue::I64(5));
        assert!(PgBindValue::for_column("id", int, &json!(u64::MAX)).is_err());
        assert!(PgBindValue::for_column("id", int, &json!("five")).is_err());
        assert_eq!(
            PgBindValue::for_column("price", ColumnKind::Decimal, &json!(9.5)).unwrap(),
            PgBindValue::Text("9.5".into())
        );
        assert_eq!(
            PgBindValue::for_column("is_active", ColumnKind::Bool, &json!(1)).unwrap(),
            PgBindValue::Bool(true)
        );
        assert!(PgBindValue::for_column("is_active", ColumnKind::Bool, &json!(2)).is_err());
        assert_eq!(
            PgBindValue::for_column("published_at", ColumnKind::Timestamp, &json!("2024-05-01T10:00:00Z")).unwrap(),
            PgBindValue::Text("2024-05-01 10:00:00".into())
        );
        assert_eq!(
            PgBindValue::for_column("content", ColumnKind::Json, &json!("text")).unwrap(),
            PgBindValue::Json(json!("text"))
        );
        assert_eq!(
            PgBindValue::for_column("title", ColumnKind::Text, &Value::Null).unwrap(),
            PgBindValue::Null
        );
    }
}
