//! Example consumer: embeds laravel-crud and replaces both hooks.
//!
//! Writes require the `x-api-key` header to match `API_KEY`; reads are open. Each request's
//! context carries the caller's key so the validator sees who is asking.
//!
//! Run from repo root: `cargo run -p example-consumer`

use async_trait::async_trait;
use axum::http::request::Parts;
use laravel_crud::{
    app, builtin_document, resolve, Action, AppError, AppState, ContextInitializer, Hooks, MemoryDao, RequestContext,
    RequestValidator, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;

const API_KEY_HEADER: &str = "x-api-key";

struct ApiKeyContext;

impl ContextInitializer for ApiKeyContext {
    fn initialize(&self, parts: &Parts) -> RequestContext {
        let ctx = RequestContext::from_parts(parts);
        match ctx.header(API_KEY_HEADER).map(str::to_string) {
            Some(key) => ctx.with_attribute("api_key", key),
            None => ctx,
        }
    }
}

struct WriteRequiresKey {
    api_key: String,
}

#[async_trait]
impl RequestValidator for WriteRequiresKey {
    async fn validate(&self, ctx: &RequestContext, table: &str, action: Action) -> Result<(), AppError> {
        if matches!(action, Action::RetrieveOne | Action::RetrieveMany | Action::FetchDdl) {
            return Ok(());
        }
        match ctx.attribute("api_key") {
            Some(k) if k == self.api_key => Ok(()),
            _ => Err(AppError::Rejected(format!("{} on {} requires a valid api key", action, table))),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("laravel_crud=info,example_consumer=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let api_key = std::env::var("API_KEY").unwrap_or_else(|_| "secret".into());
    let registry = Arc::new(resolve(&builtin_document()?)?);
    let hooks = Hooks::default()
        .with_context_initializer(ApiKeyContext)
        .with_request_validator(WriteRequiresKey { api_key });
    let state = AppState::new(Arc::new(MemoryDao::new()), registry)
        .with_hooks(hooks)
        .with_limits(settings.page_limits());

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app(state, settings.body_limit_bytes)).await?;
    Ok(())
}
