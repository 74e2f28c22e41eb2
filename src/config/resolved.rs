//! Resolved table registry: schema document validated and flattened for runtime use.

use crate::config::ColumnDefaultConfig;
use crate::error::AppError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Text form of timestamp values, as stored and as returned to clients.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Logical column type derived from the declared database type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Int { bits: u8, unsigned: bool },
    Bool,
    Decimal,
    Float,
    Text,
    Json,
    Date,
    Timestamp,
    Time,
    Uuid,
}

impl ColumnKind {
    /// Parse a declared type such as "int unsigned", "varchar" or "timestamp".
    pub fn parse(type_name: &str) -> Option<ColumnKind> {
        let lower = type_name.trim().to_lowercase();
        let (base, unsigned) = match lower.strip_suffix(" unsigned") {
            Some(b) => (b.trim(), true),
            None => (lower.as_str(), false),
        };
        let kind = match base {
            "tinyint" => ColumnKind::Int { bits: 8, unsigned },
            "smallint" => ColumnKind::Int { bits: 16, unsigned },
            "mediumint" | "int" | "integer" => ColumnKind::Int { bits: 32, unsigned },
            "bigint" => ColumnKind::Int { bits: 64, unsigned },
            _ if unsigned => return None,
            "boolean" | "bool" => ColumnKind::Bool,
            "decimal" | "numeric" => ColumnKind::Decimal,
            "float" | "double" | "real" => ColumnKind::Float,
            "char" | "varchar" | "string" | "tinytext" | "text" | "mediumtext" | "longtext" | "enum" => {
                ColumnKind::Text
            }
            "json" | "jsonb" => ColumnKind::Json,
            "date" => ColumnKind::Date,
            "datetime" | "timestamp" => ColumnKind::Timestamp,
            "time" => ColumnKind::Time,
            "uuid" => ColumnKind::Uuid,
            _ => return None,
        };
        Some(kind)
    }

    /// PostgreSQL type used for casts and table creation. Unsigned integers widen one step.
    pub fn pg_type(&self) -> &'static str {
        match self {
            ColumnKind::Int { bits: 8, .. } | ColumnKind::Int { bits: 16, unsigned: false } => "smallint",
            ColumnKind::Int { bits: 16, .. } | ColumnKind::Int { bits: 32, unsigned: false } => "integer",
            ColumnKind::Int { .. } => "bigint",
            ColumnKind::Bool => "boolean",
            ColumnKind::Decimal => "numeric",
            ColumnKind::Float => "double precision",
            ColumnKind::Text => "text",
            ColumnKind::Json => "jsonb",
            ColumnKind::Date => "date",
            ColumnKind::Timestamp => "timestamp",
            ColumnKind::Time => "time",
            ColumnKind::Uuid => "uuid",
        }
    }

    /// Name reported as `column_type` by the DDL endpoint.
    pub fn logical_name(&self) -> &'static str {
        match self {
            ColumnKind::Int { bits: 8, unsigned: true } => "uint8",
            ColumnKind::Int { bits: 8, unsigned: false } => "int8",
            ColumnKind::Int { bits: 16, unsigned: true } => "uint16",
            ColumnKind::Int { bits: 16, unsigned: false } => "int16",
            ColumnKind::Int { bits: 32, unsigned: true } => "uint32",
            ColumnKind::Int { bits: 32, unsigned: false } => "int32",
            ColumnKind::Int { unsigned: true, .. } => "uint64",
            ColumnKind::Int { unsigned: false, .. } => "int64",
            ColumnKind::Bool => "bool",
            ColumnKind::Decimal => "decimal",
            ColumnKind::Float => "float64",
            ColumnKind::Text => "string",
            ColumnKind::Json => "json",
            ColumnKind::Date => "date",
            ColumnKind::Timestamp => "timestamp",
            ColumnKind::Time => "time",
            ColumnKind::Uuid => "uuid",
        }
    }

    fn int_range(bits: u8, unsigned: bool) -> (i128, i128) {
        let bits = u32::from(bits);
        if unsigned {
            (0, (1i128 << bits) - 1)
        } else {
            (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
        }
    }

    /// Whether a non-null JSON value fits this column.
    pub fn accepts(&self, v: &Value) -> bool {
        match self {
            ColumnKind::Int { bits, unsigned } => {
                let n = match (v.as_i64(), v.as_u64()) {
                    (Some(i), _) => i128::from(i),
                    (None, Some(u)) => i128::from(u),
                    _ => return false,
                };
                let (min, max) = Self::int_range(*bits, *unsigned);
                n >= min && n <= max
            }
            ColumnKind::Bool => v.is_boolean() || matches!(v.as_u64(), Some(0) | Some(1)),
            ColumnKind::Decimal => {
                v.is_number() || v.as_str().map(|s| s.trim().parse::<f64>().is_ok()).unwrap_or(false)
            }
            ColumnKind::Float => v.is_number(),
            ColumnKind::Text => v.is_string(),
            ColumnKind::Json => true,
            ColumnKind::Date => v.as_str().map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()).unwrap_or(false),
            ColumnKind::Timestamp => v.as_str().map(|s| parse_timestamp(s).is_some()).unwrap_or(false),
            ColumnKind::Time => v
                .as_str()
                .map(|s| NaiveTime::parse_from_str(s, "%H:%M:%S%.f").is_ok())
                .unwrap_or(false),
            ColumnKind::Uuid => v.as_str().map(|s| uuid::Uuid::parse_str(s).is_ok()).unwrap_or(false),
        }
    }

    /// Convert a query-string value to JSON for comparison against this column.
    pub fn coerce_query(&self, s: &str) -> Value {
        match self {
            ColumnKind::Int { .. } => {
                if let Ok(n) = s.parse::<i64>() {
                    return Value::Number(n.into());
                }
                if let Ok(n) = s.parse::<u64>() {
                    return Value::Number(n.into());
                }
            }
            ColumnKind::Float => {
                if let Some(n) = s.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                    return Value::Number(n);
                }
            }
            ColumnKind::Bool => {
                if s.eq_ignore_ascii_case("true") || s == "1" {
                    return Value::Bool(true);
                }
                if s.eq_ignore_ascii_case("false") || s == "0" {
                    return Value::Bool(false);
                }
            }
            ColumnKind::Json => {
                if let Ok(v) = serde_json::from_str(s) {
                    return v;
                }
            }
            _ => {}
        }
        Value::String(s.to_string())
    }

    /// Canonical form of a value this column accepts: the form PostgreSQL hands back.
    /// Bool numbers become booleans, decimals strings, timestamps `Y-m-d H:i:s` (UTC).
    pub fn normalize(&self, v: &Value) -> Value {
        match (self, v) {
            (_, Value::Null) => Value::Null,
            (ColumnKind::Bool, Value::Number(n)) => match n.as_u64() {
                Some(0) => Value::Bool(false),
                Some(1) => Value::Bool(true),
                _ => v.clone(),
            },
            (ColumnKind::Decimal, Value::Number(n)) => Value::String(n.to_string()),
            (ColumnKind::Decimal, Value::String(s)) => Value::String(s.trim().to_string()),
            (ColumnKind::Float, Value::Number(n)) => n
                .as_f64()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| v.clone()),
            (ColumnKind::Timestamp, Value::String(s)) => parse_timestamp(s)
                .map(|t| Value::String(t.format(TIMESTAMP_FORMAT).to_string()))
                .unwrap_or_else(|| v.clone()),
            (ColumnKind::Time, Value::String(s)) => NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                .map(|t| Value::String(t.format("%H:%M:%S%.f").to_string()))
                .unwrap_or_else(|_| v.clone()),
            (ColumnKind::Uuid, Value::String(s)) => uuid::Uuid::parse_str(s)
                .map(|u| Value::String(u.to_string()))
                .unwrap_or_else(|_| v.clone()),
            _ => v.clone(),
        }
    }

    /// Typed filter value from a query string; `None` when the column cannot hold it.
    pub fn parse_filter(&self, s: &str) -> Option<Value> {
        let v = self.coerce_query(s);
        self.accepts(&v).then(|| self.normalize(&v))
    }

    /// Convert a literal column default to a typed JSON value.
    pub fn literal_value(&self, literal: &str) -> Value {
        match self {
            ColumnKind::Text | ColumnKind::Decimal => Value::String(literal.to_string()),
            _ => self.coerce_query(literal),
        }
    }
}

/// Accepts RFC 3339 and the `Y-m-d H:i:s` form Laravel writes.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}

/// Primary key type for parsing path ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkType {
    U32,
    U64,
    I32,
    I64,
    Text,
}

impl PkType {
    pub fn for_kind(kind: ColumnKind) -> Option<PkType> {
        match kind {
            ColumnKind::Int { bits: 64, unsigned: true } => Some(PkType::U64),
            ColumnKind::Int { bits: 64, unsigned: false } => Some(PkType::I64),
            ColumnKind::Int { unsigned: true, .. } => Some(PkType::U32),
            ColumnKind::Int { unsigned: false, .. } => Some(PkType::I32),
            ColumnKind::Text | ColumnKind::Uuid => Some(PkType::Text),
            _ => None,
        }
    }
}

/// Parsed primary key value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordId {
    Unsigned(u64),
    Signed(i64),
    Text(String),
}

impl RecordId {
    /// Parse a path segment to the key's native width.
    pub fn parse(s: &str, pk_type: PkType) -> Result<RecordId, AppError> {
        let bad = || AppError::BadParams(format!("invalid id '{}'", s));
        Ok(match pk_type {
            PkType::U32 => RecordId::Unsigned(u64::from(s.parse::<u32>().map_err(|_| bad())?)),
            PkType::U64 => RecordId::Unsigned(s.parse::<u64>().map_err(|_| bad())?),
            PkType::I32 => RecordId::Signed(i64::from(s.parse::<i32>().map_err(|_| bad())?)),
            PkType::I64 => RecordId::Signed(s.parse::<i64>().map_err(|_| bad())?),
            PkType::Text => {
                if s.is_empty() {
                    return Err(bad());
                }
                RecordId::Text(s.to_string())
            }
        })
    }

    /// Read a key of type `pk_type` out of a JSON value.
    pub fn from_value(v: &Value, pk_type: PkType) -> Option<RecordId> {
        match pk_type {
            PkType::U32 | PkType::U64 => v.as_u64().map(RecordId::Unsigned),
            PkType::I32 | PkType::I64 => v.as_i64().map(RecordId::Signed),
            PkType::Text => v.as_str().map(|s| RecordId::Text(s.to_string())),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            RecordId::Unsigned(n) => Value::Number((*n).into()),
            RecordId::Signed(n) => Value::Number((*n).into()),
            RecordId::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Unsigned(n) => write!(f, "{}", n),
            RecordId::Signed(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

fn serialize_kind<S: Serializer>(kind: &ColumnKind, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(kind.logical_name())
}

#[derive(Clone, Debug, Serialize)]
pub struct ColumnInfo {
    pub index: usize,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub nullable: bool,
    /// Declared type, upper-cased (e.g. "BIGINT UNSIGNED").
    pub database_type_name: String,
    /// Declared type with length (e.g. "VARCHAR(255)").
    pub database_type_pretty: String,
    #[serde(rename = "column_type", serialize_with = "serialize_kind")]
    pub kind: ColumnKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_length: Option<u32>,
    pub is_primary_key: bool,
    pub is_auto_increment: bool,
    #[serde(skip)]
    pub default: Option<ColumnDefaultConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub json_field_name: String,
}

impl ColumnInfo {
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TableInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip)]
    pub schema_name: String,
    pub columns: Vec<ColumnInfo>,
    /// Index into `columns` of the primary key.
    #[serde(skip)]
    pub pk_index: usize,
    #[serde(skip)]
    pub pk_type: PkType,
}

impl TableInfo {
    pub fn primary_key(&self) -> &ColumnInfo {
        &self.columns[self.pk_index]
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Table name -> metadata. Built once at startup; read-only afterwards.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct TableRegistry {
    tables: BTreeMap<String, Arc<TableInfo>>,
}

impl TableRegistry {
    pub fn new(tables: impl IntoIterator<Item = TableInfo>) -> Self {
        TableRegistry {
            tables: tables
                .into_iter()
                .map(|t| (t.name.clone(), Arc::new(t)))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TableInfo>> {
        self.tables.get(name)
    }

    /// Tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = &Arc<TableInfo>> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
