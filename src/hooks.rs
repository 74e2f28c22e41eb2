//! Extension points for an embedding application: per-request context and request validation.
//!
//! Both hooks are held by [`AppState`](crate::state::AppState) as trait objects. The defaults
//! derive the context from the incoming request and accept every request, so an application
//! adds authentication or authorization by swapping in its own implementations.

use crate::error::AppError;
use async_trait::async_trait;
use axum::http::{request::Parts, HeaderMap, Method};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Operation a handler is about to perform, passed to the request validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    RetrieveOne,
    RetrieveMany,
    Update,
    Delete,
    #[serde(rename = "fetch_ddl")]
    FetchDdl,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Create => "create",
            Action::RetrieveOne => "retrieve_one",
            Action::RetrieveMany => "retrieve_many",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::FetchDdl => "fetch_ddl",
        };
        f.write_str(s)
    }
}

/// Header carrying a caller-supplied request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request context handed to the request validator.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    /// Free-form values a custom initializer may attach (e.g. an authenticated user id).
    pub attributes: Vec<(String, String)>,
}

impl RequestContext {
    pub fn from_parts(parts: &Parts) -> Self {
        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .unwrap_or_else(Uuid::new_v4);
        RequestContext {
            request_id,
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            headers: parts.headers.clone(),
            attributes: Vec::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }
}

/// Builds the [`RequestContext`] for every request before any handler runs.
pub trait ContextInitializer: Send + Sync {
    fn initialize(&self, parts: &Parts) -> RequestContext;
}

/// Default initializer: context straight from the request.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestContextInitializer;

impl ContextInitializer for RequestContextInitializer {
    fn initialize(&self, parts: &Parts) -> RequestContext {
        RequestContext::from_parts(parts)
    }
}

/// Called with `(context, table, action)` before each data operation. An error aborts the
/// request with HTTP 400 and the error's message.
#[async_trait]
pub trait RequestValidator: Send + Sync {
    async fn validate(&self, ctx: &RequestContext, table: &str, action: Action) -> Result<(), AppError>;
}

/// Default validator: accepts everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

#[async_trait]
impl RequestValidator for AllowAll {
    async fn validate(&self, _ctx: &RequestContext, _table: &str, _action: Action) -> Result<(), AppError> {
        Ok(())
    }
}

/// The two hooks, shared by all handlers.
#[derive(Clone)]
pub struct Hooks {
    pub context_initializer: Arc<dyn ContextInitializer>,
    pub request_validator: Arc<dyn RequestValidator>,
}

impl Default for Hooks {
    fn default() -> Self {
        Hooks {
            context_initializer: Arc::new(RequestContextInitializer),
            request_validator: Arc::new(AllowAll),
        }
    }
}

impl Hooks {
    pub fn with_context_initializer(mut self, initializer: impl ContextInitializer + 'static) -> Self {
        self.context_initializer = Arc::new(initializer);
        self
    }

    pub fn with_request_validator(mut self, validator: impl RequestValidator + 'static) -> Self {
        self.request_validator = Arc::new(validator);
        self
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(req: Request<()>) -> Parts {
        req.into_parts().0
    }

    #[test]
    fn context_reuses_valid_request_id() {
        let id = Uuid::new_v4();
        let p = parts(
            Request::get("/apps?page=1")
                .header(REQUEST_ID_HEADER, id.to_string())
                .body(())
                .unwrap(),
        );
        let ctx = RequestContextInitializer.initialize(&p);
        assert_eq!(ctx.request_id, id);
        assert_eq!(ctx.path, "/apps");
        assert_eq!(ctx.method, Method::GET);
    }

    #[test]
    fn context_generates_request_id_when_missing_or_invalid() {
        let p = parts(
            Request::get("/apps")
                .header(REQUEST_ID_HEADER, "not-a-uuid")
                .body(())
                .unwrap(),
        );
        let ctx = RequestContext::from_parts(&p);
        assert!(!ctx.request_id.is_nil());
    }

    #[tokio::test]
    async fn default_validator_accepts() {
        let p = parts(Request::delete("/apps/1").body(()).unwrap());
        let ctx = RequestContext::from_parts(&p);
        let hooks = Hooks::default();
        hooks
            .request_validator
            .validate(&ctx, "apps", Action::Delete)
            .await
            .unwrap();
    }

    #[test]
    fn action_names() {
        assert_eq!(Action::FetchDdl.to_string(), "fetch_ddl");
        assert_eq!(serde_json::to_value(Action::RetrieveMany).unwrap(), "retrieve_many");
    }
}
