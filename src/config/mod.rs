//! Dataset Configuration Module
//!
//! Corpus location, column schema, windowing, normalization scope and the
//! train/test split, loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `WELLLOG_CONFIG` environment variable (path to TOML file)
//! 2. `welllog.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! let config = DatasetConfig::load();
//! let corpus = WellCorpus::load(config)?;
//! ```
//!
//! The config is passed by value into the corpus rather than held in a
//! global, so several corpora with different layouts can coexist in one
//! process (tests rely on this).

mod dataset_config;
pub mod validation;

pub use dataset_config::*;
