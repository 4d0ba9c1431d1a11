use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "CareGraph";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_PORT: u16 = 4002;
const DEFAULT_RECORD_API_URL: &str = "http://localhost:4001/api/v1";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_MAX_ATTEMPTS: u32 = 1;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 100;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,caregraph_lib=debug,caregraph=debug"
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Base URL of the record service, without trailing slash.
    pub record_api_url: String,
    /// Bound on every outbound record-service call.
    pub record_api_timeout: Duration,
    /// Attempts per lookup for retryable failures. `1` disables retry.
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            record_api_url: DEFAULT_RECORD_API_URL.to_string(),
            record_api_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from any variable source. Unset variables fall
    /// back to defaults; set-but-malformed ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = parse_var(&lookup, "HOST")?.unwrap_or(defaults.host);
        let port = parse_var(&lookup, "PORT")?.unwrap_or(defaults.port);
        let record_api_url = lookup("RECORD_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.record_api_url);
        let record_api_timeout = parse_var::<u64, _>(&lookup, "RECORD_API_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.record_api_timeout);
        let max_attempts = match parse_var::<u32, _>(&lookup, "RECORD_API_MAX_ATTEMPTS")? {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    var: "RECORD_API_MAX_ATTEMPTS",
                    value: "0".into(),
                })
            }
            Some(n) => n,
            None => defaults.max_attempts,
        };
        let retry_backoff = parse_var::<u64, _>(&lookup, "RECORD_API_RETRY_BACKOFF_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_backoff);

        Ok(Self {
            host,
            port,
            record_api_url,
            record_api_timeout,
            max_attempts,
            retry_backoff,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
    }
}
