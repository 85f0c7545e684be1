//! Configuration file support for paperion.
//!
//! Reads and writes the TOML representation of [`Config`]. Loading for normal
//! runs goes through [`super::load_config`], which also applies environment
//! overrides; this module backs `paperion config init`.
//!
//! # Configuration File Format
//!
//! ```toml
//! [index]
//! endpoint = "http://localhost:9200"
//! name = "papers"
//! exclude_fields = ["paperContent", "paper_content"]
//! timeout_seconds = 30
//! max_retries = 3
//!
//! [limits]
//! search = 50
//! single_seed = 20
//! diversified = 40
//! content_search = 50
//!
//! [recommend]
//! fan_out_min = 2
//! fan_out_max = 6
//! fallback_multiplier = 3
//! minimum_should_match = 60
//! exclude_seed_duplicates = false
//!
//! [logging]
//! level = "info"
//! ```

use std::path::Path;

use super::Config;

/// A configuration file on disk
#[derive(Debug, Default)]
pub struct ConfigFile {
    pub config: Config,
}

impl ConfigFile {
    /// Load configuration from a TOML file (no environment overrides)
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

        let config = toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))?;
        Ok(Self { config })
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        toml::to_string_pretty(&self.config).map_err(|e| ConfigFileError::Serialize(e.to_string()))
    }
}

impl From<Config> for ConfigFile {
    fn from(config: Config) -> Self {
        Self { config }
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut file = ConfigFile::default();
        file.config.index.name = "economic_papers".to_string();
        file.config.recommend.exclude_seed_duplicates = true;
        file.save(&path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.config, file.config);
    }

    #[test]
    fn test_config_file_nonexistent() {
        let result = ConfigFile::load(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigFileError::Io(_))));
    }

    #[test]
    fn test_config_file_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");
        std::fs::write(&path, "invalid = toml = content").unwrap();

        let result = ConfigFile::load(&path);
        assert!(matches!(result, Err(ConfigFileError::Parse(_))));
    }
}
