/// Configuration management for the API server
///
/// Configuration is read from environment variables (a `.env` file is loaded
/// first when present).
///
/// # Environment Variables
///
/// - `STORE_BACKEND`: `postgres` (default) or `memory`
/// - `DATABASE_URL`: PostgreSQL connection string (required for `postgres`)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `API_PORT` or `PORT`: port to bind to (default: 5000)
/// - `CORS_ORIGINS`: comma-separated allowed origins, `*` for any (default: `*`)
/// - `REQUEST_TIMEOUT_SECS`: upper bound on a single store call (default: 10)
/// - `JWT_SECRET`: signing secret, at least 32 characters (required)
/// - `JWT_EXPIRATION_HOURS`: credential lifetime (default: 24)
/// - `RUST_LOG`: log filter
///
/// # Example
///
/// ```no_run
/// use taskhub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::{env, str::FromStr, time::Duration};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Store selection and database settings
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins (`*` means any)
    pub cors_origins: Vec<String>,

    /// Upper bound on a single store call, in seconds
    pub request_timeout_secs: u64,
}

/// Which document store backs the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("Unknown STORE_BACKEND '{}' (expected postgres or memory)", other),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Selected backend
    pub backend: StoreBackend,

    /// PostgreSQL connection URL (present whenever backend is postgres)
    pub url: Option<String>,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Longest accepted credential lifetime (ten years)
pub const MAX_EXPIRATION_HOURS: i64 = 24 * 365 * 10;

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Lifetime of issued credentials, in hours
    pub expiration_hours: i64,
}

impl JwtConfig {
    /// Credential lifetime as a chrono duration
    pub fn expiration(&self) -> chrono::Duration {
        chrono::Duration::hours(self.expiration_hours)
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or a value fails to
    /// parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let api_port = lookup("API_PORT")
            .or_else(|| lookup("PORT"))
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u16>()?;

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let request_timeout_secs = lookup("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u64>()?;
        if request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
        }

        let backend = lookup("STORE_BACKEND")
            .map(|value| value.parse::<StoreBackend>())
            .transpose()?
            .unwrap_or(StoreBackend::Postgres);

        let database_url = lookup("DATABASE_URL");
        if backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL environment variable is required");
        }

        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let expiration_hours = lookup("JWT_EXPIRATION_HOURS")
            .unwrap_or_else(|| "24".to_string())
            .parse::<i64>()?;
        if !(1..=MAX_EXPIRATION_HOURS).contains(&expiration_hours) {
            anyhow::bail!(
                "JWT_EXPIRATION_HOURS must be between 1 and {}",
                MAX_EXPIRATION_HOURS
            );
        }

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                request_timeout_secs,
            },
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_hours,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Upper bound on a single store call
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }
}
