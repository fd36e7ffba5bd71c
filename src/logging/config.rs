use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Where and how the service logs
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub environment: String,
    pub level: LogLevel,
    /// Directory of the daily rolling `app.log` / `error.log`
    pub dir: PathBuf,
}

impl LoggingConfig {
    /// `ENVIRONMENT`, `LOG_LEVEL` and `LOG_DIR`; debug outside production
    pub fn from_env() -> Self {
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let default_level = if environment == "production" {
            LogLevel::Info
        } else {
            LogLevel::Debug
        };
        let level = std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default_level);

        Self {
            environment,
            level,
            dir: PathBuf::from(std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string())),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Filter used when `RUST_LOG` is not set
    pub fn filter_directive(&self) -> String {
        format!(
            "portfolio_cms={},tower_http=debug,axum=debug,sqlx=warn",
            self.level
        )
    }
}
