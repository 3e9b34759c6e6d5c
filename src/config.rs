use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9013;
pub const DEFAULT_MODEL_PATH: &str = "models/batik_model.onnx";
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub labels_path: Option<PathBuf>,
    pub max_payload_size: usize,
    pub intra_threads: usize,
    pub workers: Option<usize>,
    pub log_level: log::LevelFilter,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            labels_path: None,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            intra_threads: 1,
            workers: None,
            log_level: log::LevelFilter::Info,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(invalid("port", 0, "Must be between 1 and 65535"));
        }
        if self.max_payload_size == 0 {
            return Err(invalid("max_payload_size", 0, "Must be greater than 0"));
        }
        if self.intra_threads == 0 {
            return Err(invalid("intra_threads", 0, "Must be at least 1"));
        }
        if self.workers == Some(0) {
            return Err(invalid("workers", 0, "Must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a level name as accepted by `--log-level`.
pub fn parse_log_level(s: &str) -> ConfigResult<log::LevelFilter> {
    match s.parse::<log::LevelFilter>() {
        Ok(log::LevelFilter::Off) | Err(_) => Err(invalid(
            "log_level",
            s,
            "Expected one of error, warn, info, debug, trace",
        )),
        Ok(level) => Ok(level),
    }
}
