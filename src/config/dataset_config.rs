//! Dataset Configuration - corpus layout, schema, windowing and split as TOML
//!
//! Each struct implements `Default` with the values the pipeline was tuned
//! with, so a missing or partial config file behaves exactly like the
//! built-in setup.

use crate::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "WELLLOG_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "welllog.toml";

/// Placeholder in `corpus.path_template` replaced by the 1-based well index.
pub const WELL_INDEX_PLACEHOLDER: &str = "{}";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a well-log dataset.
///
/// Load with `DatasetConfig::load()` which searches:
/// 1. `$WELLLOG_CONFIG` env var
/// 2. `./welllog.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Where the well files live
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Column names
    #[serde(default)]
    pub schema: FeatureSchema,

    /// Window length and stride
    #[serde(default)]
    pub window: WindowConfig,

    /// Target normalization scope
    #[serde(default)]
    pub normalization: NormalizationConfig,

    /// Train/test well ids and the input/output split
    #[serde(default)]
    pub training: TrainingConfig,
}

impl DatasetConfig {
    /// Load configuration using the standard search order:
    /// 1. `$WELLLOG_CONFIG` environment variable
    /// 2. `./welllog.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), wells = config.corpus.well_count, "Loaded dataset config from WELLLOG_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from WELLLOG_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "WELLLOG_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(wells = config.corpus.well_count, "Loaded dataset config from ./welllog.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./welllog.toml, using defaults");
                }
            }
        }

        info!("No welllog.toml found — using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    ///
    /// Unknown keys are reported as warnings; semantic problems fail with
    /// `ConfigError::Validation`.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Path of the file for a 1-based well index.
    pub fn well_path(&self, well_id: usize) -> PathBuf {
        PathBuf::from(
            self.corpus
                .path_template
                .replace(WELL_INDEX_PLACEHOLDER, &well_id.to_string()),
        )
    }

    /// Validate the whole config for internal consistency.
    ///
    /// Rules:
    /// - Schema invariants (see `FeatureSchema::validate`)
    /// - `well_count > 0` and the path template contains `{}`
    /// - Window size and stride are positive
    /// - Train/test ids lie within 1..=well_count
    /// - `input_dim`/`output_dim` are positive and fit the modeling columns
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        self.schema.validate(&mut errors);

        if self.corpus.well_count == 0 {
            errors.push("corpus.well_count must be at least 1".to_string());
        }
        if !self.corpus.path_template.contains(WELL_INDEX_PLACEHOLDER) {
            errors.push(format!(
                "corpus.path_template '{}' must contain '{WELL_INDEX_PLACEHOLDER}' for the well index",
                self.corpus.path_template
            ));
        }

        if self.window.size == 0 {
            errors.push("window.size must be at least 1".to_string());
        }
        if self.window.stride == 0 {
            errors.push("window.stride must be at least 1".to_string());
        }

        for (key, ids) in [
            ("training.train_ids", &self.training.train_ids),
            ("training.test_ids", &self.training.test_ids),
        ] {
            for &id in ids {
                if id == 0 || id > self.corpus.well_count {
                    errors.push(format!(
                        "{key} entry {id} is outside 1..={}",
                        self.corpus.well_count
                    ));
                }
            }
        }

        let t = &self.training;
        if t.input_dim == 0 || t.output_dim == 0 {
            errors.push("training.input_dim and training.output_dim must be at least 1".to_string());
        }
        if t
            .input_dim
            .checked_add(t.output_dim)
            .map_or(true, |n| n > self.schema.columns.len())
        {
            errors.push(format!(
                "training.input_dim ({}) + training.output_dim ({}) exceeds the {} modeling columns",
                t.input_dim,
                t.output_dim,
                self.schema.columns.len()
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Corpus
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Number of wells, loaded as ids 1..=well_count
    #[serde(default = "default_well_count")]
    pub well_count: usize,

    /// Per-well file path; `{}` is replaced by the well id
    #[serde(default = "default_path_template")]
    pub path_template: String,
}

fn default_well_count() -> usize {
    14
}
fn default_path_template() -> String {
    "data/A{}.csv".to_string()
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            well_count: default_well_count(),
            path_template: default_path_template(),
        }
    }
}

// ============================================================================
// Windowing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Rows per training sample
    #[serde(default = "default_window_size")]
    pub size: usize,

    /// Rows between consecutive window starts
    #[serde(default = "default_window_stride")]
    pub stride: usize,
}

fn default_window_size() -> usize {
    150
}
fn default_window_stride() -> usize {
    30
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: default_window_size(),
            stride: default_window_stride(),
        }
    }
}

// ============================================================================
// Normalization
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationConfig {
    /// Fit target scalers per well instead of using the corpus-wide ones
    #[serde(default = "default_individual")]
    pub individual: bool,
}

fn default_individual() -> bool {
    true
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            individual: default_individual(),
        }
    }
}

// ============================================================================
// Training Split
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Wells concatenated into the training set, in this order
    #[serde(default = "default_train_ids")]
    pub train_ids: Vec<usize>,

    /// Wells held out for full-length evaluation
    #[serde(default = "default_test_ids")]
    pub test_ids: Vec<usize>,

    /// Leading modeling columns fed to the model
    #[serde(default = "default_input_dim")]
    pub input_dim: usize,

    /// Modeling columns after the inputs used as targets
    #[serde(default = "default_output_dim")]
    pub output_dim: usize,
}

fn default_train_ids() -> Vec<usize> {
    (1..=10).collect()
}
fn default_test_ids() -> Vec<usize> {
    (11..=14).collect()
}
fn default_input_dim() -> usize {
    11
}
fn default_output_dim() -> usize {
    12
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            train_ids: default_train_ids(),
            test_ids: default_test_ids(),
            input_dim: default_input_dim(),
            output_dim: default_output_dim(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = DatasetConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config: DatasetConfig = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config, DatasetConfig::default());
        assert_eq!(config.window.size, 150);
        assert_eq!(config.window.stride, 30);
        assert!(config.normalization.individual);
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
[corpus]
well_count = 3
path_template = "/data/wells/W{}.csv"

[training]
train_ids = [2, 1]
test_ids = [3]
"#;
        let config: DatasetConfig = toml::from_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.corpus.well_count, 3);
        assert_eq!(config.training.train_ids, vec![2, 1]);
        // Non-overridden values retain defaults
        assert_eq!(config.training.input_dim, 11);
        assert_eq!(config.window.size, 150);
        assert!(config.validate().is_ok());
        assert_eq!(config.well_path(2), PathBuf::from("/data/wells/W2.csv"));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = DatasetConfig::default();
        config.window.size = 0;
        config.training.input_dim = 20;
        config.training.train_ids.push(15);
        config.corpus.path_template = "data/fixed.csv".to_string();

        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 4, "errors: {errors:?}");
                assert!(errors.iter().any(|e| e.contains("window.size")));
                assert!(errors.iter().any(|e| e.contains("exceeds")));
                assert!(errors.iter().any(|e| e.contains("entry 15")));
                assert!(errors.iter().any(|e| e.contains("path_template")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_toml_round_trip() {
        let config = DatasetConfig::default();
        let text = config.to_toml().unwrap();
        let back: DatasetConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, back);
    }
}
