use folio_editor::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Folio configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Library file, relative to the config's directory
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Language of the titles used for canonical paths
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_store_path() -> String {
    "library.json".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        Self::load_from(&PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME))
    }

    /// Load config from an explicit file, falling back to defaults if it is missing
    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get absolute path to the library file
    pub fn get_store_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.store_path)
    }

    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            language: self.language.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            language: default_language(),
        }
    }
}
