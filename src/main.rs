//! laravel-crud server: loads settings and the table schema, picks a dao, serves the API.

use laravel_crud::{
    app, apply_migrations, builtin_document, connect, ensure_database_exists, load_document, resolve, AppState, Dao,
    MemoryDao, PgDao, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("laravel_crud=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;

    let mut document = match &settings.schema_path {
        Some(path) => load_document(path).await?,
        None => builtin_document()?,
    };
    if let Some(schema) = &settings.database_schema {
        document.schema = schema.clone();
    }
    let registry = Arc::new(resolve(&document)?);

    let dao: Arc<dyn Dao> = match &settings.database_url {
        Some(url) => {
            ensure_database_exists(url).await?;
            let pool = connect(url, settings.database_max_connections).await?;
            if settings.auto_migrate {
                apply_migrations(&pool, &registry).await?;
            }
            Arc::new(PgDao::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store");
            Arc::new(MemoryDao::new())
        }
    };

    tracing::info!(tables = registry.len(), dao = dao.kind(), schema = %document.schema, "schema loaded");
    let state = AppState::new(dao, registry).with_limits(settings.page_limits());
    let router = app(state, settings.body_limit_bytes);

    let addr = settings.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
