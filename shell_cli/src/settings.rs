//! Interpreter settings.
//!
//! Baked-in defaults with an optional JSON override file. Every field
//! falls back to its default when the file omits it, so an override
//! file only has to name what it changes.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What went wrong loading a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file {path}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse settings file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Tunable knobs of the interpreter loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSettings {
    /// Written to the error stream before each line.
    pub prompt: String,
    /// Most directory matches autocomplete will collect.
    pub match_cap: usize,
    /// Bytes requested from the console per line read.
    pub read_chunk: usize,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            prompt: "$ ".to_string(),
            match_cap: 10,
            read_chunk: 100,
        }
    }
}

impl ShellSettings {
    /// Loads overrides from a JSON file on top of the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = ShellSettings::default();
        assert_eq!(settings.prompt, "$ ");
        assert_eq!(settings.match_cap, 10);
        assert_eq!(settings.read_chunk, 100);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let settings: ShellSettings = serde_json::from_str(r#"{"prompt": "% "}"#).unwrap();
        assert_eq!(settings.prompt, "% ");
        assert_eq!(settings.match_cap, 10);
        assert_eq!(settings.read_chunk, 100);
    }

    #[test]
    fn test_roundtrips_through_json() {
        let settings = ShellSettings {
            prompt: "> ".to_string(),
            match_cap: 3,
            read_chunk: 64,
        };
        let encoded = serde_json::to_string(&settings).unwrap();
        let decoded: ShellSettings = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, settings);
    }

    #[test]
    fn test_load_reads_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"read_chunk": 32}}"#).unwrap();

        let settings = ShellSettings::load(file.path()).unwrap();
        assert_eq!(settings.read_chunk, 32);
        assert_eq!(settings.prompt, "$ ");
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = ShellSettings::load(Path::new("/no/such/settings.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn test_load_reports_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = ShellSettings::load(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }
}
