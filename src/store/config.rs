use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Contents of `.prio/config.json`, written once at init. `debounce_ms` is
/// the quiescence window for the debounced slot writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub version: u32,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl Config {
    /// Read the config from a slot root; a missing or malformed file falls
    /// back to defaults.
    pub fn load(root: &Path) -> Self {
        fs::read_to_string(root.join("config.json"))
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        assert_eq!(Config::load(dir.path()), Config::default());
    }

    #[test]
    fn missing_debounce_field_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.json"), br#"{"version": 1}"#).unwrap();
        let config = Config::load(dir.path());
        assert_eq!(config.debounce_ms, 300);
    }

    #[test]
    fn explicit_debounce_wins() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("config.json"),
            br#"{"version": 1, "debounce_ms": 50}"#,
        )
        .unwrap();
        assert_eq!(Config::load(dir.path()).debounce_ms, 50);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.json"), b"debounce: fast").unwrap();
        assert_eq!(Config::load(dir.path()), Config::default());
    }
}
