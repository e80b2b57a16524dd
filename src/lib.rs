//! welllog-dataset: well-log preparation for supervised learning
//!
//! Loads depth-indexed log and rock-property records for a set of wells,
//! standardizes the modeling columns, and slices every well into
//! overlapping fixed-length windows.
//!
//! ## Architecture
//!
//! - **Loader**: one CSV per well, canonical column names, synthetic `DEPT`
//! - **Window**: lazy fixed-length, fixed-stride windows
//! - **Normalizer**: per-column standardization with exact inverse
//! - **Corpus**: corpus-wide scalers, training-set and test-view builds
//! - **Dataset**: `len` / `get` / `reset` view for a training loop

pub mod config;
pub mod corpus;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod normalizer;
pub mod schema;
pub mod window;

pub use config::DatasetConfig;
pub use corpus::{LatchState, TestView, TrainingSet, WellCorpus, WellSegment};
pub use dataset::{DatasetView, Sample};
pub use error::{DatasetError, Result};
pub use loader::WellTable;
pub use normalizer::Scaler;
pub use schema::FeatureSchema;
pub use window::{stack_windows, window_count, window_starts, windows, Windows};
