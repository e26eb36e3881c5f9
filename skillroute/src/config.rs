//! Router configuration.
//!
//! Loaded from JSON. The default location is
//! `<config dir>/skillroute/config.json`; a missing default file means
//! defaults, while a missing explicit path is an error.

use crate::coordinator::DEFAULT_FOLLOW_UP_CACHE_CAPACITY;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Log output format named in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Logging section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level such as "debug"; `None` defers to `RUST_LOG`
    pub level: Option<String>,
    pub format: LogFormat,
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: LogFormat::Pretty,
            timestamps: true,
        }
    }
}

/// Tunables of the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Upper bound on follow-ups returned per turn
    pub max_follow_ups: usize,

    /// Results whose follow-ups stay retrievable
    pub follow_up_cache_capacity: usize,

    /// Progress text written when a turn starts
    pub processing_message: String,

    /// Minimum score for the keyword classifier
    pub intent_threshold: f32,

    pub log: LogConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_follow_ups: 3,
            follow_up_cache_capacity: DEFAULT_FOLLOW_UP_CACHE_CAPACITY,
            processing_message: "Processing...".to_string(),
            intent_threshold: 0.34,
            log: LogConfig::default(),
        }
    }
}

impl RouterConfig {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        config_dir.join("skillroute").join("config.json")
    }

    /// Load from `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Load from the default location, falling back to defaults if absent
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse and validate JSON text
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.follow_up_cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "follow_up_cache_capacity must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.intent_threshold) {
            return Err(ConfigError::Invalid(format!(
                "intent_threshold must be within 0..=1, got {}",
                self.intent_threshold
            )));
        }
        Ok(())
    }

    /// Tracing settings derived from the `log` section
    #[cfg(feature = "tracing")]
    pub fn tracing_config(&self) -> crate::tracing_support::TracingConfig {
        use crate::tracing_support::{TracingConfig, TracingFormat};

        TracingConfig {
            level: self.log.level.as_deref().and_then(|l| l.parse().ok()),
            format: match self.log.format {
                LogFormat::Pretty => TracingFormat::Pretty,
                LogFormat::Compact => TracingFormat::Compact,
                LogFormat::Json => TracingFormat::Json,
            },
            timestamps: self.log.timestamps,
            ..TracingConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.max_follow_ups, 3);
        assert_eq!(config.processing_message, "Processing...");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RouterConfig::from_json(r#"{ "max_follow_ups": 5, "log": { "format": "json" } }"#)
            .unwrap();
        assert_eq!(config.max_follow_ups, 5);
        assert_eq!(config.follow_up_cache_capacity, DEFAULT_FOLLOW_UP_CACHE_CAPACITY);
        assert_eq!(config.log.format, LogFormat::Json);
        assert!(config.log.timestamps);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = RouterConfig::from_json(r#"{ "intent_threshold": 1.5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = RouterConfig::from_json(r#"{ "follow_up_cache_capacity": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "processing_message": "Thinking..." }}"#).unwrap();

        let config = RouterConfig::load(file.path()).unwrap();
        assert_eq!(config.processing_message, "Thinking...");
    }

    #[test]
    fn test_load_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        match RouterConfig::load(file.path()).unwrap_err() {
            ConfigError::Parse { path, .. } => assert_eq!(path, file.path()),
            other => panic!("Expected parse error, got {:?}", other),
        }
        assert!(matches!(
            RouterConfig::load("/definitely/not/here.json").unwrap_err(),
            ConfigError::Read { .. }
        ));
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn test_tracing_config_from_log_section() {
        let config = RouterConfig::from_json(r#"{ "log": { "level": "debug", "format": "compact" } }"#)
            .unwrap();
        let settings = config.tracing_config();
        assert_eq!(settings.level, Some(tracing::Level::DEBUG));
        assert_eq!(settings.format, crate::tracing_support::TracingFormat::Compact);
    }
}
