//! Config validation: unknown-key detection with Levenshtein suggestions
//! and non-fatal sanity checks on the dataset layout.
//!
//! The raw TOML is first parsed into `toml::Value` and its key tree compared
//! against the known field names; unknown keys become warnings with a
//! "did you mean?" suggestion. Normal serde deserialization follows, so a
//! typo never breaks an otherwise valid config.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " — did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `DatasetConfig`.
///
/// Must be kept in step with the structs in `dataset_config.rs` and
/// `schema.rs`.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [corpus]
        "corpus",
        "corpus.well_count",
        "corpus.path_template",
        // [schema]
        "schema",
        "schema.head",
        "schema.columns",
        "schema.target_columns",
        // [window]
        "window",
        "window.size",
        "window.stride",
        // [normalization]
        "normalization",
        "normalization.individual",
        // [training]
        "training",
        "training.train_ids",
        "training.test_ids",
        "training.input_dim",
        "training.output_dim",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (*k, levenshtein(unknown, k)))
        .filter(|(_, d)| *d <= 3)
        // Tie-break on the name so suggestions are deterministic
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Never fails; syntax errors are left to the serde pass.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Layout Sanity Checks
// ============================================================================

/// Non-fatal checks on a parsed config that still validates.
///
/// - stride larger than the window (rows between windows are never sampled)
/// - a well listed for both training and testing
/// - an empty training list
pub fn layout_warnings(config: &super::DatasetConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if config.window.stride > config.window.size {
        warnings.push(ValidationWarning {
            field: "window.stride".to_string(),
            message: format!(
                "window.stride ({}) exceeds window.size ({}); rows between windows are skipped",
                config.window.stride, config.window.size
            ),
            suggestion: None,
        });
    }

    let train: HashSet<usize> = config.training.train_ids.iter().copied().collect();
    let mut shared: Vec<usize> = config
        .training
        .test_ids
        .iter()
        .copied()
        .filter(|id| train.contains(id))
        .collect();
    shared.sort_unstable();
    shared.dedup();
    if !shared.is_empty() {
        warnings.push(ValidationWarning {
            field: "training.test_ids".to_string(),
            message: format!("wells {shared:?} appear in both train_ids and test_ids"),
            suggestion: None,
        });
    }

    if config.training.train_ids.is_empty() {
        warnings.push(ValidationWarning {
            field: "training.train_ids".to_string(),
            message: "training.train_ids is empty; the training set will have no samples"
                .to_string(),
            suggestion: None,
        });
    }

    warnings
}
