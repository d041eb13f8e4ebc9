use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;
use reqwest::Url;

const DEFAULT_CORS_ORIGIN: &str = "https://guide.theloanconnection.com.sg";
const DEFAULT_SUBMISSION_LOG: &str = "form_submissions.log";

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
    pub sink: SinkConfig,
    pub cors: CorsConfig,
    pub audit: AuditConfig,
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

        let sink_url = match env::var("APP_SINK_URL") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidSinkUrl { source })?,
            ),
            _ => None,
        };
        let timeout_secs = parse_number("APP_SINK_TIMEOUT_SECS", 10)?;
        let max_retries = parse_number("APP_SINK_MAX_RETRIES", 2)?;
        let backoff_ms = parse_number("APP_SINK_RETRY_BACKOFF_MS", 250)?;

        let allowed_origin =
            env::var("APP_CORS_ORIGIN").unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string());
        let allowed_origin = normalize_origin(&allowed_origin);
        HeaderValue::from_str(&allowed_origin).map_err(|_| ConfigError::InvalidOrigin)?;

        let log_path = env::var("APP_SUBMISSION_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SUBMISSION_LOG));
        let site_dir = env::var("APP_SITE_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig {
                host,
                port,
                site_dir,
            },
            telemetry: TelemetryConfig { log_level },
            sink: SinkConfig {
                url: sink_url,
                timeout: Duration::from_secs(timeout_secs),
                max_retries: u32::try_from(max_retries)
                    .map_err(|_| ConfigError::InvalidNumber("APP_SINK_MAX_RETRIES"))?,
                retry_backoff: Duration::from_millis(backoff_ms),
            },
            cors: CorsConfig { allowed_origin },
            audit: AuditConfig { log_path },
        })
    }
}

fn parse_number(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber(key)),
        Err(_) => Ok(default),
    }
}

// Browsers send the origin without a trailing slash.
fn normalize_origin(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the landing page assets, served for unmatched GET paths.
    pub site_dir: Option<PathBuf>,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Outbound delivery to the spreadsheet-backed sink.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub url: Option<Url>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl SinkConfig {
    pub fn endpoint(&self) -> Result<&Url, ConfigError> {
        self.url.as_ref().ok_or(ConfigError::MissingSinkUrl)
    }
}

/// The single browser origin allowed to post leads.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origin: String,
}

/// Location of the append-only submission log.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub log_path: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber(&'static str),
    InvalidSinkUrl { source: url::ParseError },
    MissingSinkUrl,
    InvalidOrigin,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber(key) => {
                write!(f, "{key} must be a non-negative integer")
            }
            ConfigError::InvalidSinkUrl { .. } => write!(f, "APP_SINK_URL must be an absolute URL"),
            ConfigError::MissingSinkUrl => {
                write!(f, "APP_SINK_URL must be set to deliver submissions")
            }
            ConfigError::InvalidOrigin => {
                write!(f, "APP_CORS_ORIGIN must be a valid header value")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidSinkUrl { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber(_)
            | ConfigError::MissingSinkUrl
            | ConfigError::InvalidOrigin => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_SINK_URL",
            "APP_SINK_TIMEOUT_SECS",
            "APP_SINK_MAX_RETRIES",
            "APP_SINK_RETRY_BACKOFF_MS",
            "APP_CORS_ORIGIN",
            "APP_SUBMISSION_LOG",
            "APP_SITE_DIR",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert!(config.server.site_dir.is_none());
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.sink.url.is_none());
        assert_eq!(config.sink.timeout, Duration::from_secs(10));
        assert_eq!(config.sink.max_retries, 2);
        assert_eq!(config.sink.retry_backoff, Duration::from_millis(250));
        assert_eq!(config.cors.allowed_origin, DEFAULT_CORS_ORIGIN);
        assert_eq!(config.audit.log_path, PathBuf::from("form_submissions.log"));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn sink_url_is_required_only_when_requested() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads");
        assert!(matches!(
            config.sink.endpoint(),
            Err(ConfigError::MissingSinkUrl)
        ));

        env::set_var("APP_SINK_URL", "https://script.example.com/macros/s/abc/exec");
        let config = AppConfig::load().expect("config loads");
        let url = config.sink.endpoint().expect("sink configured");
        assert_eq!(url.host_str(), Some("script.example.com"));
    }

    #[test]
    fn rejects_relative_sink_url() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_SINK_URL", "/exec");
        let err = AppConfig::load().expect_err("relative url rejected");
        assert!(matches!(err, ConfigError::InvalidSinkUrl { .. }));
    }

    #[test]
    fn rejects_non_numeric_retry_budget() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_SINK_MAX_RETRIES", "many");
        let err = AppConfig::load().expect_err("invalid number rejected");
        assert_eq!(err.to_string(), "APP_SINK_MAX_RETRIES must be a non-negative integer");
    }

    #[test]
    fn strips_trailing_slash_from_origin() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_CORS_ORIGIN", "https://guide.example.com/");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.cors.allowed_origin, "https://guide.example.com");
    }
}
