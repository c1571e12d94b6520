//! Application configuration
//!
//! Loads configuration from environment variables with sensible defaults.

use chrono::FixedOffset;
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Base URL of the upstream student API
    pub backend_url: String,
    /// Per-request timeout towards the student API, in seconds
    pub backend_timeout_secs: u64,
    /// Extra attempts for reads that failed transiently
    pub backend_retry_attempts: u32,
    /// Session length assumed when the API omits a duration, in minutes
    pub default_session_minutes: u32,
    /// Offset used to decide what "today" means for students
    pub display_offset: FixedOffset,
    /// Frontend assets directory
    pub frontend_dir: String,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
    /// Environment (development/production)
    pub environment: Environment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        };

        // STUDENT_API_URL is accepted as an alias for older deployments
        let backend_url = env::var("BACKEND_URL")
            .or_else(|_| env::var("STUDENT_API_URL"))
            .map_err(|_| ConfigError::Missing("BACKEND_URL is required".to_string()))?;
        if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "BACKEND_URL must be an http(s) URL, got '{}'",
                backend_url
            )));
        }

        let offset_minutes: i32 = env::var("DISPLAY_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|m| m.parse().ok())
            .unwrap_or(0);
        let display_offset = FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "DISPLAY_UTC_OFFSET_MINUTES out of range: {}",
                offset_minutes
            ))
        })?;

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            backend_url,
            backend_timeout_secs: env::var("BACKEND_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|s| *s > 0)
                .unwrap_or(10),
            backend_retry_attempts: env::var("BACKEND_RETRY_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            default_session_minutes: env::var("DEFAULT_SESSION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(120),
            display_offset,
            frontend_dir: env::var("FRONTEND_DIR").unwrap_or_else(|_| "./frontend".to_string()),
            max_body_size: env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64 * 1024), // 64KB default
            cors_origins: env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["http://localhost:8080".to_string()]),
            environment,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Get the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[cfg(test)]
    pub fn for_tests(backend_url: String) -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            backend_url,
            backend_timeout_secs: 1,
            backend_retry_attempts: 1,
            default_session_minutes: 120,
            display_offset: FixedOffset::east_opt(0).unwrap(),
            frontend_dir: "./frontend".to_string(),
            max_body_size: 64 * 1024,
            cors_origins: Vec::new(),
            environment: Environment::Development,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
