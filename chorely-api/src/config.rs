/// Configuration management for the API server
///
/// Configuration is read from environment variables (a `.env` file is loaded
/// first when present).
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `DATABASE_MIN_CONNECTIONS`: idle connections kept open (default: 1)
/// - `DATABASE_ACQUIRE_TIMEOUT_SECONDS`: wait for a free connection (default: 5)
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `API_PORT`: port to bind to (default: 8080)
/// - `CORS_ORIGINS`: comma-separated origins, `*` for any (default: *)
/// - `PRODUCTION`: enables HSTS and strict headers (default: false)
/// - `REQUEST_TIMEOUT_SECONDS`: per-request deadline (default: 30)
/// - `JWT_SECRET`: HS256 signing key, at least 32 characters (required)
/// - `ADMIN_EMAILS`: comma-separated emails that register as admins
/// - `RUST_LOG` / `LOG_FORMAT`: read by the binary when installing the subscriber
///
/// # Example
///
/// ```no_run
/// use chorely_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use chorely_shared::db::pool::PoolConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Shortest accepted JWT secret
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub auth: AuthConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS, strict CSP)
    pub production: bool,

    /// Requests running longer than this get 408
    pub request_timeout_seconds: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl DatabaseConfig {
    /// Pool settings derived from this configuration
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            acquire_timeout_seconds: self.acquire_timeout_seconds,
            ..Default::default()
        }
    }
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing key
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Account configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Lowercased emails that receive the admin role at registration
    pub admin_emails: Vec<String>,
}

impl AuthConfig {
    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|admin| *admin == email)
    }
}

fn parse_or<T>(value: Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", name, raw, e)),
        None => Ok(default),
    }
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value does not
    /// parse, or the JWT secret is shorter than 32 characters.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let mut cors_origins = split_list(lookup("CORS_ORIGINS"));
        if cors_origins.is_empty() {
            cors_origins.push("*".to_string());
        }

        let admin_emails = split_list(lookup("ADMIN_EMAILS"))
            .into_iter()
            .map(|email| email.to_lowercase())
            .collect();

        Ok(Self {
            api: ApiConfig {
                host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(lookup("API_PORT"), "API_PORT", 8080)?,
                cors_origins,
                production: parse_or(lookup("PRODUCTION"), "PRODUCTION", false)?,
                request_timeout_seconds: parse_or(
                    lookup("REQUEST_TIMEOUT_SECONDS"),
                    "REQUEST_TIMEOUT_SECONDS",
                    30,
                )?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_or(
                    lookup("DATABASE_MAX_CONNECTIONS"),
                    "DATABASE_MAX_CONNECTIONS",
                    10,
                )?,
                min_connections: parse_or(
                    lookup("DATABASE_MIN_CONNECTIONS"),
                    "DATABASE_MIN_CONNECTIONS",
                    1,
                )?,
                acquire_timeout_seconds: parse_or(
                    lookup("DATABASE_ACQUIRE_TIMEOUT_SECONDS"),
                    "DATABASE_ACQUIRE_TIMEOUT_SECONDS",
                    5,
                )?,
            },
            jwt: JwtConfig { secret: jwt_secret },
            auth: AuthConfig { admin_emails },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://localhost/chorely"),
            ("JWT_SECRET", SECRET),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert!(!config.api.production);
        assert_eq!(config.api.request_timeout_seconds, 30);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.acquire_timeout_seconds, 5);
        assert!(config.auth.admin_emails.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://localhost/chorely"),
            ("JWT_SECRET", SECRET),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "3000"),
            ("CORS_ORIGINS", "https://chorely.app, https://admin.chorely.app"),
            ("PRODUCTION", "true"),
            ("REQUEST_TIMEOUT_SECONDS", "10"),
            ("ADMIN_EMAILS", "Root@Chorely.app, ops@chorely.app"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.api.cors_origins.len(), 2);
        assert!(config.api.production);
        assert_eq!(config.api.request_timeout_seconds, 10);
        assert!(config.auth.is_admin_email(" root@chorely.APP "));
        assert!(!config.auth.is_admin_email("someone@chorely.app"));
    }

    #[test]
    fn test_missing_required() {
        assert!(load(&[("JWT_SECRET", SECRET)]).is_err());
        assert!(load(&[("DATABASE_URL", "postgresql://localhost/chorely")]).is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgresql://localhost/chorely"),
            ("JWT_SECRET", "too-short"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_invalid_number() {
        let err = load(&[
            ("DATABASE_URL", "postgresql://localhost/chorely"),
            ("JWT_SECRET", SECRET),
            ("API_PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("API_PORT"));
    }

    #[test]
    fn test_pool_config() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://localhost/chorely"),
            ("JWT_SECRET", SECRET),
            ("DATABASE_MAX_CONNECTIONS", "20"),
        ])
        .unwrap();

        let pool = config.database.pool_config();
        assert_eq!(pool.url, "postgresql://localhost/chorely");
        assert_eq!(pool.max_connections, 20);
    }
}
