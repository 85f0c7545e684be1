//! Configuration management.
//!
//! Every value has a default matching the reference deployment, so an empty
//! configuration is usable against a local index. Values are layered: defaults,
//! then an optional TOML file, then `PAPERION_*` environment variables
//! (`__` separates sections, e.g. `PAPERION_INDEX__ENDPOINT`).

mod file_config;

pub use file_config::{ConfigFile, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Search index connection
    #[serde(default)]
    pub index: IndexConfig,

    /// Result size caps
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Recommendation tuning
    #[serde(default)]
    pub recommend: RecommendConfig,

    /// Index field names
    #[serde(default)]
    pub fields: FieldMap,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Search index connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Base URL of the index server
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Index name
    #[serde(default = "default_index_name")]
    pub name: String,

    /// Fields dropped from projections where bulky payloads are unwanted
    #[serde(default = "default_exclude_fields")]
    pub exclude_fields: Vec<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Attempts for transient failures (1 disables retries)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            name: default_index_name(),
            exclude_fields: default_exclude_fields(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9200".to_string()
}

fn default_index_name() -> String {
    "papers".to_string()
}

fn default_exclude_fields() -> Vec<String> {
    vec!["paperContent".to_string(), "paper_content".to_string()]
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

/// Result size caps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_search_limit")]
    pub search: usize,

    #[serde(default = "default_single_seed_limit")]
    pub single_seed: usize,

    #[serde(default = "default_diversified_limit")]
    pub diversified: usize,

    #[serde(default = "default_search_limit")]
    pub content_search: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            search: default_search_limit(),
            single_seed: default_single_seed_limit(),
            diversified: default_diversified_limit(),
            content_search: default_search_limit(),
        }
    }
}

fn default_search_limit() -> usize {
    50
}

fn default_single_seed_limit() -> usize {
    20
}

fn default_diversified_limit() -> usize {
    40
}

/// Recommendation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendConfig {
    /// Smallest per-seed fan-out
    #[serde(default = "default_fan_out_min")]
    pub fan_out_min: usize,

    /// Largest per-seed fan-out
    #[serde(default = "default_fan_out_max")]
    pub fan_out_max: usize,

    /// Match-all window of the fallback tier, as a multiple of the target
    #[serde(default = "default_fallback_multiplier")]
    pub fallback_multiplier: usize,

    #[serde(default = "default_one")]
    pub min_term_freq: u32,

    #[serde(default = "default_one")]
    pub min_doc_freq: u32,

    /// Percentage of seed terms a body-similarity hit must match
    #[serde(default = "default_minimum_should_match")]
    pub minimum_should_match: u8,

    /// Cold-start identifiers returned when a caller has no seeds
    #[serde(default = "default_curated_ids")]
    pub curated_ids: Vec<String>,

    /// Drop similar-paper hits that are copies of the seed (same ID, DOI or body)
    #[serde(default)]
    pub exclude_seed_duplicates: bool,

    /// Fixed RNG seed for reproducible diversification; entropy when unset
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            fan_out_min: default_fan_out_min(),
            fan_out_max: default_fan_out_max(),
            fallback_multiplier: default_fallback_multiplier(),
            min_term_freq: default_one(),
            min_doc_freq: default_one(),
            minimum_should_match: default_minimum_should_match(),
            curated_ids: default_curated_ids(),
            exclude_seed_duplicates: false,
            rng_seed: None,
        }
    }
}

fn default_fan_out_min() -> usize {
    2
}

fn default_fan_out_max() -> usize {
    6
}

fn default_fallback_multiplier() -> usize {
    3
}

fn default_one() -> u32 {
    1
}

fn default_minimum_should_match() -> u8 {
    60
}

fn default_curated_ids() -> Vec<String> {
    [
        20919906, 37133723, 11447754, 21704052, 77082338, 76330020, 75393442, 79628753, 52198442,
        21178154,
    ]
    .iter()
    .map(|id| id.to_string())
    .collect()
}

/// Field names of the index mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMap {
    #[serde(default = "default_id_field")]
    pub id: String,
    #[serde(default = "default_doi_field")]
    pub doi: String,
    #[serde(default = "default_title_field")]
    pub title: String,
    #[serde(default = "default_author_field")]
    pub author: String,
    #[serde(default = "default_journal_field")]
    pub journal: String,
    #[serde(default = "default_year_field")]
    pub year: String,
    /// Keyword sub-field used when sorting by year
    #[serde(default = "default_year_sort_field")]
    pub year_sort: String,
    /// Field matched by the free-text description parameter
    #[serde(default = "default_abstract_field")]
    pub description: String,
    #[serde(default = "default_content_field")]
    pub content: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            id: default_id_field(),
            doi: default_doi_field(),
            title: default_title_field(),
            author: default_author_field(),
            journal: default_journal_field(),
            year: default_year_field(),
            year_sort: default_year_sort_field(),
            description: default_abstract_field(),
            content: default_content_field(),
        }
    }
}

fn default_id_field() -> String {
    "ID".to_string()
}

fn default_doi_field() -> String {
    "DOI".to_string()
}

fn default_title_field() -> String {
    "Title".to_string()
}

fn default_author_field() -> String {
    "Author".to_string()
}

fn default_journal_field() -> String {
    "Journal".to_string()
}

fn default_year_field() -> String {
    "Year".to_string()
}

fn default_year_sort_field() -> String {
    "Year.keyword".to_string()
}

fn default_abstract_field() -> String {
    "Abstract".to_string()
}

fn default_content_field() -> String {
    "paperContent".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` for structured output, anything else for the plain formatter
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const ENV_PREFIX: &str = "PAPERION";

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(env_source())
        .build()?;

    settings.try_deserialize()
}

/// Get the configuration from environment variables and defaults only
pub fn get_config() -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder().add_source(env_source()).build()?;
    settings.try_deserialize()
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("index.exclude_fields")
        .with_list_parse_key("recommend.curated_ids")
        .try_parsing(true)
}

/// Find a configuration file in the default locations
///
/// Checks `./paperion.toml`, then `<config dir>/paperion/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("paperion.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("paperion").join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.index.name, "papers");
        assert_eq!(config.limits.search, 50);
        assert_eq!(config.limits.single_seed, 20);
        assert_eq!(config.limits.diversified, 40);
        assert_eq!(config.recommend.curated_ids.len(), 10);
        assert_eq!(config.recommend.curated_ids[0], "20919906");
        assert_eq!(config.fields.year_sort, "Year.keyword");
        assert!(!config.recommend.exclude_seed_duplicates);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("paperion.toml");
        std::fs::write(
            &path,
            r#"
[index]
endpoint = "http://search.internal:9200"

[recommend]
fan_out_min = 3
rng_seed = 7
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.index.endpoint, "http://search.internal:9200");
        assert_eq!(config.index.name, "papers");
        assert_eq!(config.recommend.fan_out_min, 3);
        assert_eq!(config.recommend.fan_out_max, 6);
        assert_eq!(config.recommend.rng_seed, Some(7));
        assert_eq!(config.limits.diversified, 40);
    }

    #[test]
    fn test_environment_overrides_defaults() {
        std::env::set_var("PAPERION_LIMITS__CONTENT_SEARCH", "7");
        std::env::set_var("PAPERION_INDEX__EXCLUDE_FIELDS", "paperContent,Abstract");

        let config = get_config();

        std::env::remove_var("PAPERION_LIMITS__CONTENT_SEARCH");
        std::env::remove_var("PAPERION_INDEX__EXCLUDE_FIELDS");

        let config = config.unwrap();
        assert_eq!(config.limits.content_search, 7);
        assert_eq!(config.limits.search, 50);
        assert_eq!(
            config.index.exclude_fields,
            vec!["paperContent".to_string(), "Abstract".to_string()]
        );
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = load_config(Path::new("/nonexistent/paperion.toml"));
        assert!(result.is_err());
    }
}
