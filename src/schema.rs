//! Canonical well-log column names.
//!
//! Every well file carries the same fixed header. A subset of those columns
//! is used for modeling; the trailing part of that subset holds the
//! mechanical/geomechanical properties a model is asked to predict.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Synthetic row-index column appended to every loaded well (1..=N).
pub const ROW_INDEX_COLUMN: &str = "DEPT";

/// Canonical file header: measured depth plus 34 log and rock-property fields.
pub const DEFAULT_HEAD: [&str; 35] = [
    "DEPTH", "BRITTLE_HORZ", "BRITTLE_VERT", "COHESION", "DEN", "DTC", "E_HORZ", "E_VERT",
    "GGRM", "GMPO", "GMTH", "GMUR", "MSPD", "NPRL", "PF", "PP", "PR_HORZ", "PR_VERT",
    "R20F", "R30F", "R40F", "R60F", "R85F", "SHDEF", "SHMAX", "SHMIN", "ST", "SV",
    "TOC", "UCS", "VP", "VPVS_X", "VPVS_Y", "VS_X", "VS_Y",
];

/// Modeling columns in model order: log inputs first, then the targets.
pub const DEFAULT_COLUMNS: [&str; 23] = [
    // Inputs
    "DEPTH", "GGRM", "GMPO", "GMTH", "GMUR", "MSPD", "R20F", "R85F", "VP", "VS_X", "VS_Y",
    // Targets
    "E_HORZ", "E_VERT", "COHESION", "UCS", "DEN", "ST", "BRITTLE_HORZ", "BRITTLE_VERT",
    "PR_HORZ", "PR_VERT", "NPRL", "TOC",
];

/// Geomechanical targets (the trailing suffix of [`DEFAULT_COLUMNS`]).
pub const DEFAULT_TARGET_COLUMNS: [&str; 12] = [
    "E_HORZ", "E_VERT", "COHESION", "UCS", "DEN", "ST", "BRITTLE_HORZ", "BRITTLE_VERT",
    "PR_HORZ", "PR_VERT", "NPRL", "TOC",
];

/// Column layout shared by every well in a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Names assigned to the file columns, in file order
    #[serde(default = "default_head")]
    pub head: Vec<String>,

    /// Modeling columns; an `input_dim` prefix feeds the model
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,

    /// Target group; must equal the trailing suffix of `columns`
    #[serde(default = "default_target_columns")]
    pub target_columns: Vec<String>,
}

fn default_head() -> Vec<String> {
    DEFAULT_HEAD.iter().map(|s| (*s).to_string()).collect()
}
fn default_columns() -> Vec<String> {
    DEFAULT_COLUMNS.iter().map(|s| (*s).to_string()).collect()
}
fn default_target_columns() -> Vec<String> {
    DEFAULT_TARGET_COLUMNS.iter().map(|s| (*s).to_string()).collect()
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self {
            head: default_head(),
            columns: default_columns(),
            target_columns: default_target_columns(),
        }
    }
}

impl FeatureSchema {
    /// Build a schema from string slices.
    pub fn new(head: &[&str], columns: &[&str], target_columns: &[&str]) -> Self {
        let owned = |names: &[&str]| names.iter().map(|s| (*s).to_string()).collect();
        Self {
            head: owned(head),
            columns: owned(columns),
            target_columns: owned(target_columns),
        }
    }

    /// Number of columns every well file must carry.
    pub fn file_width(&self) -> usize {
        self.head.len()
    }

    /// Modeling columns that precede the target suffix.
    ///
    /// These are the inputs used for full-length test views.
    pub fn input_columns(&self) -> &[String] {
        let split = self.columns.len().saturating_sub(self.target_columns.len());
        &self.columns[..split]
    }

    /// Check the structural invariants, collecting every violation.
    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.head.is_empty() {
            errors.push("schema.head must not be empty".to_string());
        }
        if self.target_columns.is_empty() {
            errors.push("schema.target_columns must not be empty".to_string());
        }

        let mut seen = HashSet::new();
        for name in &self.head {
            if name == ROW_INDEX_COLUMN {
                errors.push(format!(
                    "schema.head must not contain the reserved column '{ROW_INDEX_COLUMN}'"
                ));
            }
            if !seen.insert(name.as_str()) {
                errors.push(format!("schema.head contains duplicate column '{name}'"));
            }
        }

        let mut seen_modeling = HashSet::new();
        for name in &self.columns {
            if !seen.contains(name.as_str()) {
                errors.push(format!("schema.columns entry '{name}' is not in schema.head"));
            }
            if !seen_modeling.insert(name.as_str()) {
                errors.push(format!("schema.columns contains duplicate column '{name}'"));
            }
        }

        if self.target_columns.len() > self.columns.len()
            || !self.columns.ends_with(&self.target_columns)
        {
            errors.push(
                "schema.target_columns must be the trailing suffix of schema.columns".to_string(),
            );
        }
    }
}
