use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Stream event error: {0}")]
    Event(#[from] EventError),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Invalid JSON in '{event}' event: {source}")]
    InvalidJson {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Event '{event}' is missing required field '{field}'")]
    MissingField { event: String, field: &'static str },
}

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Too many concurrent parsing streams (limit {limit})")]
    TooManyStreams { limit: usize },

    #[error("No tokio runtime available to drive stream: {0}")]
    RuntimeUnavailable(String),
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Failed to install log subscriber: {0}")]
    Install(String),
}

pub type Result<T> = std::result::Result<T, ParsingError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn read_config(path: &str) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn too_many() -> Result<()> {
        let started: std::result::Result<(), DriverError> = Err(DriverError::TooManyStreams { limit: 2 });
        started?;
        Ok(())
    }

    #[test]
    fn test_subsystem_errors_convert() {
        let err = read_config("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ParsingError::Io(_)));

        let err = too_many().unwrap_err();
        assert!(matches!(err, ParsingError::Driver(DriverError::TooManyStreams { limit: 2 })));
        assert_eq!(
            err.to_string(),
            "Driver error: Too many concurrent parsing streams (limit 2)"
        );
    }
}
