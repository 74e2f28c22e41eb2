//! PostgreSQL dao: parameterized statements from `sql::builder`, rows decoded to JSON.

use super::{Dao, ListQuery, Page};
use crate::config::{RecordId, TableInfo, TIMESTAMP_FORMAT};
use crate::error::AppError;
use crate::service::Record;
use crate::sql::builder::{self, QueryBuf};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row, TypeInfo};

#[derive(Clone)]
pub struct PgDao {
    pool: PgPool,
}

impl PgDao {
    pub fn new(pool: PgPool) -> Self {
        PgDao { pool }
    }

    async fn query_many(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(q).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_json).collect()
    }

    async fn query_optional(&self, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(q).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_json).transpose()
    }
}

fn bind_all(q: &QueryBuf) -> Query<'_, Postgres, PgArguments> {
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    query
}

#[async_trait]
impl Dao for PgDao {
    fn kind(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self, table: &TableInfo, query: &ListQuery) -> Result<Page, AppError> {
        let page_q = builder::select_page(table, query)?;
        let rows = self.query_many(&page_q).await?;
        let count_q = builder::count(table, &query.filters)?;
        tracing::debug!(sql = %count_q.sql, params = ?count_q.params, "query");
        let total: i64 = bind_all(&count_q).fetch_one(&self.pool).await?.try_get(0)?;
        Ok(Page {
            rows,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn get(&self, table: &TableInfo, id: &RecordId) -> Result<Value, AppError> {
        let q = builder::select_by_id(table, id)?;
        self.query_optional(&q).await?.ok_or(AppError::NotFound)
    }

    async fn insert(&self, record: &Record) -> Result<Value, AppError> {
        let q = builder::insert(record.table(), record.fields())?;
        self.query_optional(&q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(&self, id: &RecordId, record: &Record) -> Result<Value, AppError> {
        let q = builder::update(record.table(), id, record.fields())?;
        self.query_optional(&q).await?.ok_or(AppError::NotFound)
    }

    async fn delete(&self, table: &TableInfo, id: &RecordId) -> Result<u64, AppError> {
        let q = builder::delete(table, id)?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let affected = bind_all(&q).execute(&self.pool).await?.rows_affected();
        if affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(affected)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn row_to_json(row: &PgRow) -> Result<Value, AppError> {
    let mut map = Map::new();
    for col in row.columns() {
        map.insert(col.name().to_string(), cell_to_value(row, col.ordinal(), col.type_info().name())?);
    }
    Ok(Value::Object(map))
}

fn cell_to_value(row: &PgRow, i: usize, type_name: &str) -> Result<Value, AppError> {
    fn opt<T: Into<Value>>(v: Option<T>) -> Value {
        v.map(Into::into).unwrap_or(Value::Null)
    }
    Ok(match type_name {
        "INT2" => opt(row.try_get::<Option<i16>, _>(i)?),
        "INT4" => opt(row.try_get::<Option<i32>, _>(i)?),
        "INT8" => opt(row.try_get::<Option<i64>, _>(i)?),
        "FLOAT4" => opt(row.try_get::<Option<f32>, _>(i)?.map(f64::from)),
        "FLOAT8" => opt(row.try_get::<Option<f64>, _>(i)?),
        "BOOL" => opt(row.try_get::<Option<bool>, _>(i)?),
        "UUID" => opt(row.try_get::<Option<uuid::Uuid>, _>(i)?.map(|u| u.to_string())),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(i)?.unwrap_or(Value::Null),
        "TIMESTAMPTZ" => opt(
            row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(i)?
                .map(|d| d.to_rfc3339()),
        ),
        "TIMESTAMP" => opt(
            row.try_get::<Option<chrono::NaiveDateTime>, _>(i)?
                .map(|d| d.format(TIMESTAMP_FORMAT).to_string()),
        ),
        "DATE" => opt(
            row.try_get::<Option<chrono::NaiveDate>, _>(i)?
                .map(|d| d.format("%Y-%m-%d").to_string()),
        ),
        _ => opt(row.try_get::<Option<String>, _>(i)?),
    })
}
