use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use url::Url;

use crate::marketplace::accounts::sessions::DEFAULT_SESSION_TTL_HOURS;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub backend: BackendConfig,
    pub auth: AuthConfig,
    pub payments: PaymentConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let base_url = env::var("BACKEND_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string());
        let base_url = parse_url("BACKEND_BASE_URL", &base_url)?;
        let timeout = Duration::from_secs(number_var("BACKEND_TIMEOUT_SECS", 10)?);

        let min_password_length = bounded_var::<usize>("AUTH_MIN_PASSWORD_LENGTH", 8)?;
        let session_ttl_hours = bounded_var::<u32>(
            "AUTH_SESSION_TTL_HOURS",
            DEFAULT_SESSION_TTL_HOURS as u64,
        )?;
        let identity = match env::var("IDENTITY_API_KEY") {
            Ok(api_key) if !api_key.trim().is_empty() => {
                let raw = env::var("IDENTITY_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_IDENTITY_BASE_URL.to_string());
                Some(IdentityConfig {
                    api_key: api_key.trim().to_string(),
                    base_url: parse_url("IDENTITY_BASE_URL", &raw)?,
                })
            }
            _ => None,
        };

        let payments = PaymentConfig {
            initial_poll_delay: Duration::from_millis(number_var("PAYMENT_POLL_INITIAL_MS", 5000)?),
            max_poll_attempts: bounded_var::<u32>("PAYMENT_POLL_MAX_ATTEMPTS", 6)?,
            max_poll_delay: Duration::from_millis(number_var("PAYMENT_POLL_MAX_DELAY_MS", 30_000)?),
            success_display_delay: Duration::from_millis(number_var(
                "PAYMENT_SUCCESS_DISPLAY_MS",
                2000,
            )?),
            success_result_code: env::var("PAYMENT_SUCCESS_RESULT_CODE")
                .unwrap_or_else(|_| "0".to_string()),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            backend: BackendConfig { base_url, timeout },
            auth: AuthConfig {
                min_password_length,
                session_ttl_hours,
                identity,
            },
            payments,
        })
    }
}

const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

fn number_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { name }),
        Err(_) => Ok(default),
    }
}

/// [`number_var`] narrowed to `T`; out-of-range values are rejected, not truncated.
fn bounded_var<T: TryFrom<u64>>(name: &'static str, default: u64) -> Result<T, ConfigError> {
    T::try_from(number_var(name, default)?).map_err(|_| ConfigError::InvalidNumber { name })
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { name, source })
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Location of the external REST backend holding profiles, agencies, and payments.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

/// Account policy and the optional external identity provider.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub min_password_length: usize,
    pub session_ttl_hours: u32,
    pub identity: Option<IdentityConfig>,
}

impl AuthConfig {
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.session_ttl_hours))
    }
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub api_key: String,
    pub base_url: Url,
}

/// Timing for M-Pesa confirmation polling and the success screen.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub initial_poll_delay: Duration,
    pub max_poll_attempts: u32,
    pub max_poll_delay: Duration,
    pub success_display_delay: Duration,
    pub success_result_code: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidNumber {
        name: &'static str,
    },
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name } => {
                write!(f, "{name} must be a non-negative integer")
            }
            ConfigError::InvalidUrl { name, .. } => write!(f, "{name} must be an absolute URL"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidUrl { source, .. } => Some(source),
        }
    }
}
