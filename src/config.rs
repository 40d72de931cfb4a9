use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DATA_DIR_ENV: &str = "LESSON_SCHEDULE_DATA_DIR";
pub const SAVE_DEBOUNCE_ENV: &str = "LESSON_SCHEDULE_SAVE_DEBOUNCE_MS";
pub const MAX_SAVE_RETRIES_ENV: &str = "LESSON_SCHEDULE_MAX_SAVE_RETRIES";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the editor keeps its files and how eagerly it writes them.
///
/// Artifact paths are relative to `data_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub data_dir: PathBuf,
    pub profile_file: PathBuf,
    pub today_config_file: PathBuf,
    pub save_debounce_ms: u64,
    pub max_save_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            profile_file: PathBuf::from("profiles/scheduleEditor.profile.json"),
            today_config_file: PathBuf::from("scheduleEditor.todayConfig.json"),
            save_debounce_ms: 300,
            max_save_retries: 5,
            retry_delay_ms: 100,
        }
    }
}

impl EditorConfig {
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults overridden by the `LESSON_SCHEDULE_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`. Unparseable numbers are ignored.
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|dir| !dir.is_empty()) {
            debug!(data_dir = %dir, "data dir from environment");
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(ms) = parse_var(&lookup, SAVE_DEBOUNCE_ENV) {
            self.save_debounce_ms = ms;
        }
        if let Some(retries) = parse_var(&lookup, MAX_SAVE_RETRIES_ENV) {
            self.max_save_retries = retries;
        }
        self
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_apply_and_bad_numbers_are_ignored() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (DATA_DIR_ENV, "/srv/schedule"),
            (SAVE_DEBOUNCE_ENV, "50"),
            (MAX_SAVE_RETRIES_ENV, "many"),
        ]);
        let config = EditorConfig::default().apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.data_dir, PathBuf::from("/srv/schedule"));
        assert_eq!(config.save_debounce_ms, 50);
        assert_eq!(config.max_save_retries, 5);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{"maxSaveRetries": 2}"#).unwrap();
        assert_eq!(config.max_save_retries, 2);
        assert_eq!(
            config.profile_file,
            PathBuf::from("profiles/scheduleEditor.profile.json")
        );
    }
}
