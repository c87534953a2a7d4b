//! Runtime settings

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Host settings loaded from `mobridge.json` next to the script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Global function called after the script file is evaluated.
    pub entry_function: Option<String>,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive for the subscriber, e.g. "info" or "mobridge=debug".
    pub filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            entry_function: None,
            log: LogSettings::default(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let settings = Settings::load(Path::new("/nonexistent/mobridge.json")).unwrap();
        assert!(settings.entry_function.is_none());
        assert_eq!(settings.log.filter, "info");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "entry_function": "Main" }"#).unwrap();
        assert_eq!(settings.entry_function.as_deref(), Some("Main"));
        assert_eq!(settings.log.filter, "info");
    }
}
