//! Laravel CRUD: schema-driven REST API over the laravel database tables.

pub mod config;
pub mod dao;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod hooks;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{builtin_document, load_document, resolve, TableInfo, TableRegistry};
pub use dao::{Dao, MemoryDao, PgDao};
pub use error::{AppError, ConfigError};
pub use hooks::{Action, ContextInitializer, Hooks, RequestContext, RequestValidator};
pub use migration::apply_migrations;
pub use response::PagedResults;
pub use routes::app;
pub use service::CrudService;
pub use settings::Settings;
pub use state::{AppState, PageLimits};
pub use store::{connect, ensure_database_exists};
