use serde::{Deserialize, Serialize};

use crate::schema::DEFAULT_LOW_CONFIDENCE_THRESHOLD;

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsingConfig {
    #[serde(default = "default_version")]
    pub version: String,
    /// Capacity of the state change broadcast channel.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
    #[serde(default = "default_max_concurrent_streams")]
    pub max_concurrent_streams: usize,
    /// Detect completed problems in raw output deltas.
    #[serde(default = "default_true")]
    pub extract_problems_from_output: bool,
    #[serde(default = "default_low_confidence_threshold")]
    pub low_confidence_threshold: f32,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            broadcast_capacity: default_broadcast_capacity(),
            max_concurrent_streams: default_max_concurrent_streams(),
            extract_problems_from_output: true,
            low_confidence_threshold: default_low_confidence_threshold(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `worksheet_parsing=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_broadcast_capacity() -> usize {
    100
}

fn default_max_concurrent_streams() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_low_confidence_threshold() -> f32 {
    DEFAULT_LOW_CONFIDENCE_THRESHOLD
}

fn default_log_level() -> String {
    "info".to_string()
}
