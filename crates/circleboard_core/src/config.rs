//! Runtime configuration.
//!
//! Sources are layered: built-in defaults, then an optional JSON file, then
//! `CIRCLEBOARD_*` environment overrides.

use crate::live::draft::DEFAULT_AUTOSAVE_DEBOUNCE;
use crate::logging::default_log_level;
use crate::service::meeting_service::PhasePolicy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DB_PATH: &str = "CIRCLEBOARD_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CIRCLEBOARD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CIRCLEBOARD_LOG_DIR";
pub const ENV_AUTOSAVE_MS: &str = "CIRCLEBOARD_AUTOSAVE_MS";
pub const ENV_REQUIRE_ALL_PROCESSED: &str = "CIRCLEBOARD_REQUIRE_ALL_PROCESSED";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidValue { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub autosave_debounce_ms: u64,
    pub require_all_processed: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            autosave_debounce_ms: DEFAULT_AUTOSAVE_DEBOUNCE.as_millis() as u64,
            require_all_processed: false,
        }
    }
}

impl CoreConfig {
    /// Defaults, then `file` when given, then the process environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `CIRCLEBOARD_*` overrides read through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = non_blank(lookup(ENV_DB_PATH)) {
            self.db_path = Some(PathBuf::from(value));
        }
        if let Some(value) = non_blank(lookup(ENV_LOG_LEVEL)) {
            self.log_level = value;
        }
        if let Some(value) = non_blank(lookup(ENV_LOG_DIR)) {
            self.log_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = non_blank(lookup(ENV_AUTOSAVE_MS)) {
            self.autosave_debounce_ms =
                value
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_AUTOSAVE_MS,
                        value: value.clone(),
                    })?;
        }
        if let Some(value) = non_blank(lookup(ENV_REQUIRE_ALL_PROCESSED)) {
            self.require_all_processed = parse_bool(&value).ok_or(ConfigError::InvalidValue {
                key: ENV_REQUIRE_ALL_PROCESSED,
                value,
            })?;
        }
        Ok(())
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn phase_policy(&self) -> PhasePolicy {
        PhasePolicy {
            require_all_processed: self.require_all_processed,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_AUTOSAVE_MS, ENV_REQUIRE_ALL_PROCESSED};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_live_meeting_behavior() {
        let config = CoreConfig::default();
        assert_eq!(config.autosave_debounce(), Duration::from_millis(800));
        assert!(!config.phase_policy().require_all_processed);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config: CoreConfig =
            serde_json::from_str(r#"{"db_path": "/tmp/a.db", "autosave_debounce_ms": 500}"#)
                .expect("valid config json");
        config
            .apply_env(env(&[
                ("CIRCLEBOARD_DB_PATH", "/tmp/b.db"),
                (ENV_REQUIRE_ALL_PROCESSED, "yes"),
            ]))
            .expect("valid overrides");

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/b.db")));
        assert_eq!(config.autosave_debounce_ms, 500);
        assert!(config.require_all_processed);
    }

    #[test]
    fn invalid_env_values_are_rejected() {
        let mut config = CoreConfig::default();
        let err = config
            .apply_env(env(&[(ENV_AUTOSAVE_MS, "soon")]))
            .expect_err("non-numeric debounce");
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: ENV_AUTOSAVE_MS, .. }
        ));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let parsed = serde_json::from_str::<CoreConfig>(r#"{"colour": "red"}"#);
        assert!(parsed.is_err());
    }
}
