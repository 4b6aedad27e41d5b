use anyhow::{bail, Context, Result};

/// Which [`DocumentStore`](crate::store::DocumentStore) backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Memory => "memory",
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    /// Required when `store_backend` is `Postgres`.
    pub database_url: Option<String>,
    /// Enables the Redis stream analytics sink when set.
    pub redis_url: Option<String>,
    /// Prefix for public share links, without a trailing slash.
    pub public_base_url: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let store_backend =
            StoreBackend::parse(&std::env::var("STORE_BACKEND").unwrap_or_else(|_| "postgres".into()))?;
        let database_url = match store_backend {
            StoreBackend::Postgres => Some(require_env("DATABASE_URL")?),
            StoreBackend::Memory => optional_env("DATABASE_URL"),
        };

        Ok(Config {
            store_backend,
            database_url,
            redis_url: optional_env("REDIS_URL"),
            public_base_url: normalize_base_url(
                &std::env::var("PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!(StoreBackend::parse("postgres").unwrap(), StoreBackend::Postgres);
        assert_eq!(StoreBackend::parse(" Memory ").unwrap(), StoreBackend::Memory);
        assert!(StoreBackend::parse("sqlite").is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_removed() {
        assert_eq!(
            normalize_base_url("https://cv.example.com/"),
            "https://cv.example.com"
        );
    }
}
