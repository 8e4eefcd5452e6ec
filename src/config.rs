use std::collections::HashSet;
use std::env;
use anyhow::{Context, Result};

/// Subdomain labels that never resolve to a tenant.
const DEFAULT_RESERVED_SUBDOMAINS: &str = "www,api,mail,smtp,ftp,admin,staging";

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// The duration of a session in days.
    pub session_duration_days: i64,
    /// The root (marketing/registration) domain, e.g. `example.com`.
    pub root_domain: String,
    /// Subdomain labels that are reserved and never treated as tenants.
    pub reserved_subdomains: HashSet<String>,
    /// The port the HTTP server binds to.
    pub port: u16,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let root_domain = env::var("ROOT_DOMAIN")
            .unwrap_or_else(|_| "localhost".to_string())
            .to_lowercase();

        let reserved_subdomains = env::var("RESERVED_SUBDOMAINS")
            .unwrap_or_else(|_| DEFAULT_RESERVED_SUBDOMAINS.to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            session_duration_days: env::var("SESSION_DURATION_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .context("Invalid SESSION_DURATION_DAYS")?,
            root_domain,
            reserved_subdomains,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid PORT")?,
        })
    }
}
