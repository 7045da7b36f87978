//! Configuration module for the Pokédex backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log line format
    pub log_format: LogFormat,
    /// Upper bound on the time spent serving a single request
    pub request_timeout: Duration,
    /// Size of the SQLite connection pool
    pub max_connections: u32,
}

/// An environment variable held a value that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value for {}: {:?}", self.var, self.value)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("POKEDEX_DB_PATH")
            .unwrap_or_else(|_| "./data/pokemon.sqlite".to_string())
            .into();

        let bind_addr = parse_var("POKEDEX_BIND_ADDR", "127.0.0.1:8000")?;

        let log_level = env::var("POKEDEX_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("POKEDEX_LOG_FORMAT").as_deref() {
            Err(_) | Ok("text") => LogFormat::Text,
            Ok("json") => LogFormat::Json,
            Ok(other) => {
                return Err(ConfigError {
                    var: "POKEDEX_LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let timeout_secs: u64 = parse_var("POKEDEX_REQUEST_TIMEOUT_SECS", "30")?;
        let max_connections = parse_var("POKEDEX_MAX_CONNECTIONS", "5")?;

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            log_format,
            request_timeout: Duration::from_secs(timeout_secs),
            max_connections,
        })
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env::var(var).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|_| ConfigError { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 6] = [
        "POKEDEX_DB_PATH",
        "POKEDEX_BIND_ADDR",
        "POKEDEX_LOG_LEVEL",
        "POKEDEX_LOG_FORMAT",
        "POKEDEX_REQUEST_TIMEOUT_SECS",
        "POKEDEX_MAX_CONNECTIONS",
    ];

    // Both checks mutate process env, so they run in one test.
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }

        let config = Config::from_env().unwrap();

        assert_eq!(config.db_path, PathBuf::from("./data/pokemon.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8000");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_connections, 5);

        env::set_var("POKEDEX_MAX_CONNECTIONS", "many");
        let err = Config::from_env().unwrap_err();
        assert_eq!(err.var, "POKEDEX_MAX_CONNECTIONS");
        assert_eq!(err.value, "many");
        env::remove_var("POKEDEX_MAX_CONNECTIONS");
    }
}
