use std::path::Path;

use crate::config::schema::{ParsingConfig, CONFIG_VERSION};
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ParsingConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<ParsingConfig, ConfigError> {
    let config: ParsingConfig = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &ParsingConfig) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.broadcast_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "broadcastCapacity must be greater than 0".to_string(),
        });
    }

    if config.max_concurrent_streams == 0 {
        return Err(ConfigError::Validation {
            message: "maxConcurrentStreams must be greater than 0".to_string(),
        });
    }

    if !(0.0..=1.0).contains(&config.low_confidence_threshold) {
        return Err(ConfigError::Validation {
            message: format!(
                "lowConfidenceThreshold must be between 0 and 1, got {}",
                config.low_confidence_threshold
            ),
        });
    }

    if config.logging.level.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "logging.level must not be empty".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config, ParsingConfig::default());
        assert_eq!(config.broadcast_capacity, 100);
        assert_eq!(config.max_concurrent_streams, 8);
        assert!(config.extract_problems_from_output);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_full_config() {
        let config = load_config_from_str(
            r#"{
                "version": "1.0",
                "broadcastCapacity": 16,
                "maxConcurrentStreams": 2,
                "extractProblemsFromOutput": false,
                "lowConfidenceThreshold": 0.5,
                "logging": {"level": "debug", "format": "json"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.broadcast_capacity, 16);
        assert_eq!(config.max_concurrent_streams, 2);
        assert!(!config.extract_problems_from_output);
        assert_eq!(config.low_confidence_threshold, 0.5);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let err = load_config_from_str(r#"{"version": "2.0"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert!(err.to_string().contains("Unsupported config version"));
    }

    #[test]
    fn test_rejects_zero_limits() {
        assert!(load_config_from_str(r#"{"broadcastCapacity": 0}"#).is_err());
        assert!(load_config_from_str(r#"{"maxConcurrentStreams": 0}"#).is_err());
    }

    #[test]
    fn test_rejects_threshold_out_of_range() {
        assert!(load_config_from_str(r#"{"lowConfidenceThreshold": 1.5}"#).is_err());
    }

    #[test]
    fn test_invalid_json() {
        let err = load_config_from_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseJson(_)));
    }
}
