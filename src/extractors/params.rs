//! List query parameters: `page`, `pagesize`, `order`, plus column filters.

use crate::error::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use std::collections::HashMap;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub page_size: u32,
    pub order: Option<String>,
    /// Remaining query pairs; the service keeps those naming a column as filters.
    pub filters: Vec<(String, String)>,
}

impl ListParams {
    /// Validate raw query pairs. `page` must be >= 0, `pagesize` > 0; `pagesize` is clamped to `max_page_size`.
    pub fn parse(query: HashMap<String, String>, max_page_size: u32) -> Result<Self, AppError> {
        let mut page = 0u32;
        let mut page_size = DEFAULT_PAGE_SIZE;
        let mut order = None;
        let mut filters = Vec::new();
        for (k, v) in query {
            match k.as_str() {
                "page" => page = read_int("page", &v)?,
                "pagesize" => {
                    page_size = read_int("pagesize", &v)?;
                    if page_size == 0 {
                        return Err(AppError::BadParams("pagesize must be greater than 0".into()));
                    }
                }
                "order" => {
                    let v = v.trim();
                    if !v.is_empty() {
                        order = Some(v.to_string());
                    }
                }
                _ => filters.push((k, v)),
            }
        }
        filters.sort();
        Ok(ListParams {
            page,
            page_size: page_size.min(max_page_size.max(1)),
            order,
            filters,
        })
    }
}

fn read_int(name: &str, v: &str) -> Result<u32, AppError> {
    let n: i64 = v
        .trim()
        .parse()
        .map_err(|_| AppError::BadParams(format!("{} must be an integer", name)))?;
    if n < 0 {
        return Err(AppError::BadParams(format!("{} must not be negative", name)));
    }
    u32::try_from(n).map_err(|_| AppError::BadParams(format!("{} is too large", name)))
}

#[async_trait]
impl FromRequestParts<AppState> for ListParams {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::BadParams(e.body_text()))?;
        ListParams::parse(query, state.limits.max_page_size)
    }
}
