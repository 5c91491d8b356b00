use std::env;
use std::fmt;
use std::path::PathBuf;

/// Top-level configuration, sourced from the environment (and a local .env
/// file when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telemetry: TelemetryConfig,
    pub output_dir: PathBuf,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let log_level = env::var("OBLIGO_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let output_dir = match env::var("OBLIGO_OUTPUT_DIR") {
            Ok(value) if value.trim().is_empty() => {
                return Err(ConfigError::EmptyVar {
                    name: "OBLIGO_OUTPUT_DIR",
                })
            }
            Ok(value) => PathBuf::from(value),
            Err(_) => PathBuf::from("."),
        };

        Ok(Self {
            telemetry: TelemetryConfig { log_level },
            output_dir,
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    EmptyVar { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyVar { name } => {
                write!(f, "environment variable {} is set but empty", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
