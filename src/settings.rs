//! Process settings read from the environment (after `.env` is loaded).

use crate::error::ConfigError;
use crate::routes::DEFAULT_BODY_LIMIT;
use crate::state::{PageLimits, DEFAULT_MAX_PAGE_SIZE};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    /// Overrides the schema named in the schema document.
    pub database_schema: Option<String>,
    pub database_max_connections: u32,
    pub schema_path: Option<PathBuf>,
    pub auto_migrate: bool,
    pub max_page_size: u32,
    pub body_limit_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "0.0.0.0".into(),
            port: 8080,
            database_url: None,
            database_schema: None,
            database_max_connections: 5,
            schema_path: None,
            auto_migrate: false,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            body_limit_bytes: DEFAULT_BODY_LIMIT,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let d = Settings::default();
        Ok(Settings {
            host: get("HOST").unwrap_or(d.host),
            port: parse_or("PORT", get("PORT"), d.port)?,
            database_url: get("DATABASE_URL"),
            database_schema: get("DATABASE_SCHEMA"),
            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                get("DATABASE_MAX_CONNECTIONS"),
                d.database_max_connections,
            )?,
            schema_path: get("SCHEMA_PATH").map(PathBuf::from),
            auto_migrate: parse_bool("AUTO_MIGRATE", get("AUTO_MIGRATE"), d.auto_migrate)?,
            max_page_size: positive("MAX_PAGE_SIZE", parse_or("MAX_PAGE_SIZE", get("MAX_PAGE_SIZE"), d.max_page_size)?)?,
            body_limit_bytes: positive(
                "BODY_LIMIT_BYTES",
                parse_or("BODY_LIMIT_BYTES", get("BODY_LIMIT_BYTES"), d.body_limit_bytes)?,
            )?,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Setting {
                name: "HOST",
                message: format!("{}", e),
            })
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            max_page_size: self.max_page_size,
        }
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(s) => s.parse().map_err(|e: T::Err| ConfigError::Setting {
            name,
            message: format!("'{}': {}", s, e),
        }),
    }
}

fn parse_bool(name: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::Setting {
            name,
            message: format!("'{}' is not a boolean", other),
        }),
    }
}

fn positive<T: Default + PartialEq>(name: &'static str, v: T) -> Result<T, ConfigError> {
    if v == T::default() {
        return Err(ConfigError::Setting {
            name,
            message: "must be greater than 0".into(),
        });
    }
    Ok(v)
}
