// src/search/config.rs

//! Run parameters for the staged search.
//!
//! [`SearchConfig`] is handed to the controller at construction; there is no
//! process-wide state. It round-trips through JSON so a run can be repeated
//! from a saved file.

use crate::core::constants::register::MAX_INDEX_WIDTH;
use crate::core::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters of one or more staged search runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Key width in bits; also the number of stages per run.
    pub index_width: usize,
    /// Shots requested from the backend per stage.
    pub shots: u64,
    /// Independent runs performed by `run_repeated`.
    pub repeats: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            index_width: 8,
            shots: 100,
            repeats: 1,
        }
    }
}

impl SearchConfig {
    /// Default configuration for a key of `index_width` bits.
    pub fn with_index_width(index_width: usize) -> Self {
        SearchConfig { index_width, ..Self::default() }
    }

    pub fn shots(mut self, shots: u64) -> Self {
        self.shots = shots;
        self
    }

    pub fn repeats(mut self, repeats: usize) -> Self {
        self.repeats = repeats;
        self
    }

    /// Register width the backend is asked to execute: index, mirror and ancilla.
    pub fn register_width(&self) -> usize {
        2 * self.index_width + 1
    }

    /// Checks every field.
    ///
    /// # Errors
    /// `SearchError::Config` naming the first unusable field.
    pub fn validate(&self) -> Result<()> {
        if self.index_width == 0 || self.index_width > MAX_INDEX_WIDTH {
            return Err(SearchError::config(
                "index_width",
                format!("must be in 1..={}, got {}", MAX_INDEX_WIDTH, self.index_width),
            ));
        }
        if self.shots == 0 {
            return Err(SearchError::config("shots", "must be > 0"));
        }
        if self.repeats == 0 {
            return Err(SearchError::config("repeats", "must be > 0"));
        }
        Ok(())
    }

    /// Parses and validates a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: SearchConfig =
            serde_json::from_str(json).map_err(|e| SearchError::config("(json)", e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads and validates a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SearchError::config("(file)", format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&contents)
    }

    /// Writes the configuration as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SearchError::config("(serialization)", e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_is_valid() -> Result<()> {
        let cfg = SearchConfig::default();
        cfg.validate()?;
        assert_eq!(cfg.index_width, 8);
        assert_eq!(cfg.shots, 100);
        assert_eq!(cfg.repeats, 1);
        assert_eq!(cfg.register_width(), 17);
        Ok(())
    }

    #[test]
    fn invalid_fields_are_named() {
        let cases = [
            (SearchConfig::with_index_width(0), "index_width"),
            (SearchConfig::with_index_width(32), "index_width"),
            (SearchConfig::default().shots(0), "shots"),
            (SearchConfig::default().repeats(0), "repeats"),
        ];
        for (cfg, expected) in cases {
            match cfg.validate() {
                Err(SearchError::Config { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected config error for {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn partial_json_takes_defaults() -> Result<()> {
        let cfg = SearchConfig::from_json_str(r#"{ "index_width": 4 }"#)?;
        assert_eq!(cfg, SearchConfig::with_index_width(4));
        assert!(matches!(
            SearchConfig::from_json_str(r#"{ "shots": 0 }"#),
            Err(SearchError::Config { .. })
        ));
        assert!(matches!(SearchConfig::from_json_str("not json"), Err(SearchError::Config { .. })));
        Ok(())
    }

    #[test]
    fn json_file_round_trip() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("runs").join("search.json");
        let cfg = SearchConfig::with_index_width(6).shots(250).repeats(3);
        cfg.to_json_file(&path)?;
        assert_eq!(SearchConfig::from_json_file(&path)?, cfg);
        assert!(matches!(
            SearchConfig::from_json_file(&tmp.path().join("missing.json")),
            Err(SearchError::Config { .. })
        ));
        Ok(())
    }
}
