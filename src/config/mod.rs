//! Configuration module for the club backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Default Jaro-Winkler similarity above which two names are treated as the same person.
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.88;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy contact index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
    /// Name similarity threshold for duplicate detection
    pub duplicate_threshold: f64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("CLUB_API_PSK").ok().filter(|k| !k.is_empty());

        let db_path = env::var("CLUB_DB_PATH")
            .unwrap_or_else(|_| "./data/club.sqlite".to_string())
            .into();

        let index_path = env::var("CLUB_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let raw_addr = env::var("CLUB_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| AppError::Validation(format!("Invalid CLUB_BIND_ADDR: {}", raw_addr)))?;

        let log_level = env::var("CLUB_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = match env::var("CLUB_LOG_FORMAT") {
            Ok(raw) => parse_log_format(&raw)?,
            Err(_) => false,
        };

        let duplicate_threshold = match env::var("CLUB_DUPLICATE_THRESHOLD") {
            Ok(raw) => parse_threshold(&raw)?,
            Err(_) => DEFAULT_DUPLICATE_THRESHOLD,
        };

        Ok(Self {
            api_psk,
            db_path,
            index_path,
            bind_addr,
            log_level,
            log_json,
            duplicate_threshold,
        })
    }
}

/// `text` or `json`; returns whether JSON output is wanted.
fn parse_log_format(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "text" => Ok(false),
        "json" => Ok(true),
        other => Err(AppError::Validation(format!(
            "Invalid CLUB_LOG_FORMAT: {} (expected text or json)",
            other
        ))),
    }
}

fn parse_threshold(raw: &str) -> Result<f64, AppError> {
    let value: f64 = raw.trim().parse().map_err(|_| {
        AppError::Validation(format!("Invalid CLUB_DUPLICATE_THRESHOLD: {}", raw))
    })?;
    if value <= 0.0 || value > 1.0 {
        return Err(AppError::Validation(format!(
            "CLUB_DUPLICATE_THRESHOLD must be in (0, 1], got {}",
            value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    // Tests in this module mutate process-wide environment variables.
    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const VARS: [&str; 7] = [
        "CLUB_API_PSK",
        "CLUB_DB_PATH",
        "CLUB_INDEX_PATH",
        "CLUB_BIND_ADDR",
        "CLUB_LOG_LEVEL",
        "CLUB_LOG_FORMAT",
        "CLUB_DUPLICATE_THRESHOLD",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = Config::from_env().unwrap();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/club.sqlite"));
        assert_eq!(config.index_path, PathBuf::from("./data/index"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert_eq!(config.duplicate_threshold, DEFAULT_DUPLICATE_THRESHOLD);
    }

    #[test]
    fn test_invalid_bind_addr_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("CLUB_BIND_ADDR", "not-an-address");

        let result = Config::from_env();
        clear_env();

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_log_format() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("CLUB_LOG_FORMAT", "JSON");
        let config = Config::from_env();
        clear_env();
        assert!(config.unwrap().log_json);

        assert!(!parse_log_format("text").unwrap());
        assert!(parse_log_format("yaml").is_err());
    }

    #[test]
    fn test_threshold_bounds() {
        assert_eq!(parse_threshold("0.9").unwrap(), 0.9);
        assert_eq!(parse_threshold(" 1 ").unwrap(), 1.0);
        assert!(parse_threshold("0").is_err());
        assert!(parse_threshold("1.5").is_err());
        assert!(parse_threshold("high").is_err());
    }
}
