//! Multi-well corpus: owns every well, the corpus-wide scalers, and the
//! target-scaler latch used for inverse transforms.
//!
//! ## Normalization scopes
//!
//! - Input blocks are always standardized with a scaler fit fresh on the
//!   well being processed.
//! - Target blocks use a fresh joint scaler per well when individual
//!   normalization is on. Otherwise each target column is mapped through the
//!   scaler fit on that column across the whole corpus.
//!
//! ## Target latch
//!
//! With individual normalization on, the last freshly fit target scaler is
//! retained and used by [`WellCorpus::inverse_target`]:
//!
//! ```text
//! any state --build_test_view(w)------> SetByTestView(w)
//! any state --build_training_set(..)--> SetByTrainingBuild   (when >= 1 well)
//! inverse_target reads the state without changing it
//! ```
//!
//! `build_test_view` also returns the scaler it used, so callers can invert
//! without depending on call order.

use crate::config::DatasetConfig;
use crate::error::{DatasetError, Result};
use crate::loader::WellTable;
use crate::normalizer::Scaler;
use crate::schema::FeatureSchema;
use crate::window::stack_windows;
use ndarray::{concatenate, Array2, Array3, ArrayView2, Axis};
use std::collections::HashMap;
use tracing::{debug, info};

/// Which call last fit the retained target scaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchState {
    Unset,
    SetByTestView(usize),
    SetByTrainingBuild,
}

#[derive(Debug, Clone)]
enum TargetLatch {
    Unset,
    TestView { well_id: usize, scaler: Scaler },
    TrainingBuild { scaler: Scaler },
}

impl TargetLatch {
    fn state(&self) -> LatchState {
        match self {
            Self::Unset => LatchState::Unset,
            Self::TestView { well_id, .. } => LatchState::SetByTestView(*well_id),
            Self::TrainingBuild { .. } => LatchState::SetByTrainingBuild,
        }
    }

    fn scaler(&self) -> Option<&Scaler> {
        match self {
            Self::Unset => None,
            Self::TestView { scaler, .. } | Self::TrainingBuild { scaler } => Some(scaler),
        }
    }
}

/// Contiguous run of training samples that came from one well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WellSegment {
    pub well_id: usize,
    /// Index of the segment's first sample in the training tensors
    pub offset: usize,
    pub windows: usize,
}

/// Windowed, normalized samples concatenated across training wells.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    /// `(samples, window, input_dim)`
    pub inputs: Array3<f32>,
    /// `(samples, window, output_dim)`
    pub targets: Array3<f32>,
    pub input_dim: usize,
    pub output_dim: usize,
    /// One entry per training well, in concatenation order
    pub segments: Vec<WellSegment>,
}

impl TrainingSet {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.inputs.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Well that produced sample `index`.
    pub fn well_of(&self, index: usize) -> Option<usize> {
        self.segments
            .iter()
            .find(|s| index >= s.offset && index < s.offset + s.windows)
            .map(|s| s.well_id)
    }
}

/// Full-length normalized matrices for one well.
#[derive(Debug, Clone)]
pub struct TestView {
    pub well_id: usize,
    /// `(rows, modeling inputs)`
    pub input: Array2<f64>,
    /// `(rows, target group)`
    pub target: Array2<f64>,
    /// Scaler that produced `target`; invert with it directly
    pub target_scaler: Scaler,
}

/// Every well of a dataset, loaded eagerly, with its fitted scalers.
#[derive(Debug, Clone)]
pub struct WellCorpus {
    config: DatasetConfig,
    /// Indexed by `well_id - 1`
    wells: Vec<WellTable>,
    /// One per modeling column, fit over all wells concatenated
    feature_scalers: HashMap<String, Scaler>,
    /// Joint scaler over the target group, fit over all wells concatenated
    target_group_scaler: Scaler,
    latch: TargetLatch,
}

impl WellCorpus {
    /// Load wells `1..=corpus.well_count` from the configured path template.
    ///
    /// A single failed well aborts the load.
    pub fn load(config: DatasetConfig) -> Result<Self> {
        if !config
            .corpus
            .path_template
            .contains(crate::config::WELL_INDEX_PLACEHOLDER)
        {
            return Err(DatasetError::Configuration(format!(
                "path template '{}' has no '{{}}' placeholder",
                config.corpus.path_template
            )));
        }

        let wells = (1..=config.corpus.well_count)
            .map(|id| WellTable::load(id, config.well_path(id), &config.schema))
            .collect::<Result<Vec<_>>>()?;

        Self::from_tables(config, wells)
    }

    /// Build a corpus from already-loaded wells.
    ///
    /// Tables are addressed by position: the first one is well 1.
    pub fn from_tables(mut config: DatasetConfig, tables: Vec<WellTable>) -> Result<Self> {
        let mut schema_errors = Vec::new();
        config.schema.validate(&mut schema_errors);
        if !schema_errors.is_empty() {
            return Err(DatasetError::Configuration(schema_errors.join("; ")));
        }
        if tables.is_empty() {
            return Err(DatasetError::Configuration(
                "corpus must contain at least one well".to_string(),
            ));
        }
        config.corpus.well_count = tables.len();

        let mut feature_scalers = HashMap::with_capacity(config.schema.columns.len());
        for feature in &config.schema.columns {
            let pooled = pooled_columns(&tables, std::slice::from_ref(feature))?;
            feature_scalers.insert(feature.clone(), Scaler::fit(pooled.view())?);
        }
        let pooled_targets = pooled_columns(&tables, &config.schema.target_columns)?;
        let target_group_scaler = Scaler::fit(pooled_targets.view())?;

        info!(
            wells = tables.len(),
            rows = pooled_targets.nrows(),
            features = feature_scalers.len(),
            individual = config.normalization.individual,
            "Corpus scalers fit"
        );

        Ok(Self {
            config,
            wells: tables,
            feature_scalers,
            target_group_scaler,
            latch: TargetLatch::Unset,
        })
    }

    /// Window and normalize the given wells into one training set.
    ///
    /// Wells are concatenated in `train_ids` order. The input block is the
    /// first `input_dim` modeling columns, the target block the next
    /// `output_dim`.
    pub fn build_training_set(
        &mut self,
        train_ids: &[usize],
        input_dim: usize,
        output_dim: usize,
    ) -> Result<TrainingSet> {
        self.check_split(input_dim, output_dim)?;
        let window = self.config.window;
        if window.size == 0 || window.stride == 0 {
            return Err(DatasetError::Configuration(format!(
                "window size ({}) and stride ({}) must be positive",
                window.size, window.stride
            )));
        }
        for &id in train_ids {
            self.well(id)?;
        }

        let columns = &self.config.schema.columns;
        let input_names = &columns[..input_dim];
        let target_names = &columns[input_dim..input_dim + output_dim];

        let mut input_blocks: Vec<Array3<f64>> = Vec::with_capacity(train_ids.len());
        let mut target_blocks: Vec<Array3<f64>> = Vec::with_capacity(train_ids.len());
        let mut segments = Vec::with_capacity(train_ids.len());
        let mut last_target_scaler = None;
        let mut offset = 0;

        for &id in train_ids {
            let well = &self.wells[id - 1];

            let (input, _) = Scaler::fit_transform(well.select(input_names)?.view())?;

            let target = if self.config.normalization.individual {
                let (target, scaler) = Scaler::fit_transform(well.select(target_names)?.view())?;
                last_target_scaler = Some(scaler);
                target
            } else {
                self.corpus_scaled(well, target_names)?
            };

            let input_windows = stack_windows(input.view(), window.size, window.stride);
            let target_windows = stack_windows(target.view(), window.size, window.stride);
            let count = input_windows.len_of(Axis(0));

            debug!(well = id, rows = well.n_rows(), windows = count, "Well windowed");

            segments.push(WellSegment {
                well_id: id,
                offset,
                windows: count,
            });
            offset += count;
            input_blocks.push(input_windows);
            target_blocks.push(target_windows);
        }

        if let Some(scaler) = last_target_scaler {
            self.latch = TargetLatch::TrainingBuild { scaler };
        }

        let inputs = concat_samples(&input_blocks, window.size, input_dim)?;
        let targets = concat_samples(&target_blocks, window.size, output_dim)?;

        info!(
            wells = train_ids.len(),
            samples = offset,
            input_dim,
            output_dim,
            "Training set built"
        );

        Ok(TrainingSet {
            inputs: inputs.mapv(|v| v as f32),
            targets: targets.mapv(|v| v as f32),
            input_dim,
            output_dim,
            segments,
        })
    }

    /// Normalize one well at full length for evaluation.
    ///
    /// Inputs are the modeling columns before the target group; targets are
    /// the target group.
    pub fn build_test_view(&mut self, well_id: usize) -> Result<TestView> {
        let well = self.well(well_id)?;
        let schema = &self.config.schema;

        let (input, _) = Scaler::fit_transform(well.select(schema.input_columns())?.view())?;
        let raw_target = well.select(&schema.target_columns)?;

        let (target, target_scaler) = if self.config.normalization.individual {
            let (target, scaler) = Scaler::fit_transform(raw_target.view())?;
            self.latch = TargetLatch::TestView {
                well_id,
                scaler: scaler.clone(),
            };
            (target, scaler)
        } else {
            let target = self.target_group_scaler.transform(raw_target.view())?;
            (target, self.target_group_scaler.clone())
        };

        debug!(well = well_id, rows = input.nrows(), latch = ?self.latch.state(), "Test view built");

        Ok(TestView {
            well_id,
            input,
            target,
            target_scaler,
        })
    }

    /// Map normalized target values back to physical units.
    ///
    /// Uses the latched scaler under individual normalization and the
    /// corpus-wide target-group scaler otherwise.
    pub fn inverse_target(&self, values: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if !self.config.normalization.individual {
            return self.target_group_scaler.inverse_transform(values);
        }
        self.latch
            .scaler()
            .ok_or_else(|| {
                DatasetError::IllegalState(
                    "inverse_target called before any target scaler was fit".to_string(),
                )
            })?
            .inverse_transform(values)
    }

    pub fn latch_state(&self) -> LatchState {
        self.latch.state()
    }

    pub fn well_count(&self) -> usize {
        self.wells.len()
    }

    /// Well by 1-based id.
    pub fn well(&self, well_id: usize) -> Result<&WellTable> {
        well_id
            .checked_sub(1)
            .and_then(|idx| self.wells.get(idx))
            .ok_or(DatasetError::UnknownWell {
                id: well_id,
                well_count: self.wells.len(),
            })
    }

    pub fn wells(&self) -> &[WellTable] {
        &self.wells
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.config.schema
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Corpus-wide scaler for one modeling column.
    pub fn feature_scaler(&self, name: &str) -> Option<&Scaler> {
        self.feature_scalers.get(name)
    }

    pub fn target_group_scaler(&self) -> &Scaler {
        &self.target_group_scaler
    }

    fn check_split(&self, input_dim: usize, output_dim: usize) -> Result<()> {
        let available = self.config.schema.columns.len();
        if input_dim == 0 || output_dim == 0 {
            return Err(DatasetError::Configuration(format!(
                "input_dim ({input_dim}) and output_dim ({output_dim}) must be positive"
            )));
        }
        if input_dim.checked_add(output_dim).map_or(true, |n| n > available) {
            return Err(DatasetError::Configuration(format!(
                "input_dim ({input_dim}) + output_dim ({output_dim}) exceeds {available} modeling columns"
            )));
        }
        Ok(())
    }

    /// Apply each column's corpus-wide scaler and join the results column-wise.
    fn corpus_scaled(&self, well: &WellTable, names: &[String]) -> Result<Array2<f64>> {
        let mut out = Array2::zeros((well.n_rows(), names.len()));
        for (idx, name) in names.iter().enumerate() {
            let scaler = self
                .feature_scalers
                .get(name)
                .ok_or_else(|| DatasetError::UnknownColumn(name.clone()))?;
            let column = well.select(std::slice::from_ref(name))?;
            let scaled = scaler.transform(column.view())?;
            out.column_mut(idx).assign(&scaled.column(0));
        }
        Ok(out)
    }
}

/// Stack the named columns of every well vertically.
fn pooled_columns(tables: &[WellTable], names: &[String]) -> Result<Array2<f64>> {
    let blocks = tables
        .iter()
        .map(|t| t.select(names))
        .collect::<Result<Vec<_>>>()?;
    let views: Vec<_> = blocks.iter().map(Array2::view).collect();
    concatenate(Axis(0), &views).map_err(|e| DatasetError::Configuration(e.to_string()))
}

fn concat_samples(blocks: &[Array3<f64>], window: usize, width: usize) -> Result<Array3<f64>> {
    if blocks.is_empty() {
        return Ok(Array3::zeros((0, window, width)));
    }
    let views: Vec<_> = blocks.iter().map(Array3::view).collect();
    concatenate(Axis(0), &views).map_err(|e| DatasetError::Configuration(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfig;
    use ndarray::Array2;

    /// Four modeling columns: two inputs, two targets.
    fn tiny_config(individual: bool) -> DatasetConfig {
        let mut config = DatasetConfig::default();
        config.schema = FeatureSchema::new(
            &["DEPTH", "GR", "UCS", "TOC"],
            &["DEPTH", "GR", "UCS", "TOC"],
            &["UCS", "TOC"],
        );
        config.window.size = 4;
        config.window.stride = 2;
        config.normalization.individual = individual;
        config
    }

    fn well(id: usize, rows: usize, schema: &FeatureSchema, shift: f64) -> WellTable {
        let m = Array2::from_shape_fn((rows, 4), |(i, j)| {
            let i = i as f64;
            match j {
                0 => 1000.0 + i * 0.5,
                1 => (i * 0.3).sin() * 40.0 + 60.0 + shift,
                2 => i.mul_add(2.0, 100.0) + shift * 3.0,
                _ => (i * 0.7).cos() + 2.0,
            }
        });
        WellTable::from_matrix(id, schema, &m).unwrap()
    }

    fn corpus(individual: bool) -> WellCorpus {
        let config = tiny_config(individual);
        let tables = vec![
            well(1, 10, &config.schema, 0.0),
            well(2, 7, &config.schema, 5.0),
            well(3, 3, &config.schema, -2.0),
        ];
        WellCorpus::from_tables(config, tables).unwrap()
    }

    #[test]
    fn test_training_shapes_and_segments() {
        let mut c = corpus(true);
        let set = c.build_training_set(&[1, 2, 3], 2, 2).unwrap();

        // 10 rows -> 4 windows, 7 rows -> 2, 3 rows -> 0
        assert_eq!(set.len(), 6);
        assert_eq!(set.inputs.dim(), (6, 4, 2));
        assert_eq!(set.targets.dim(), (6, 4, 2));
        assert_eq!(
            set.segments,
            vec![
                WellSegment { well_id: 1, offset: 0, windows: 4 },
                WellSegment { well_id: 2, offset: 4, windows: 2 },
                WellSegment { well_id: 3, offset: 6, windows: 0 },
            ]
        );
        assert_eq!(set.well_of(5), Some(2));
        assert_eq!(set.well_of(6), None);
    }

    #[test]
    fn test_order_of_train_ids_controls_concatenation() {
        let mut c = corpus(true);
        let forward = c.build_training_set(&[1, 2], 2, 2).unwrap();
        let reverse = c.build_training_set(&[2, 1], 2, 2).unwrap();
        assert_eq!(forward.len(), reverse.len());
        assert_eq!(
            forward.inputs.index_axis(Axis(0), 0),
            reverse.inputs.index_axis(Axis(0), 2)
        );
    }

    #[test]
    fn test_inputs_use_fresh_per_well_scaler() {
        let mut c = corpus(true);
        let set = c.build_training_set(&[1], 2, 2).unwrap();
        let raw = c.well(1).unwrap().select(&["DEPTH", "GR"]).unwrap();
        let (expected, _) = Scaler::fit_transform(raw.view()).unwrap();
        // Window 1 starts at row 2
        for r in 0..4 {
            for col in 0..2 {
                let got = f64::from(set.inputs[[1, r, col]]);
                assert!((got - expected[[r + 2, col]]).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_corpus_wide_target_scaling() {
        let mut c = corpus(false);
        let set = c.build_training_set(&[2], 2, 2).unwrap();
        let ucs = c.well(2).unwrap().select(&["UCS"]).unwrap();
        let expected = c.feature_scaler("UCS").unwrap().transform(ucs.view()).unwrap();
        assert!((f64::from(set.targets[[0, 0, 0]]) - expected[[0, 0]]).abs() < 1e-5);
        assert!((f64::from(set.targets[[1, 3, 0]]) - expected[[5, 0]]).abs() < 1e-5);
        // Corpus-wide scaling never touches the latch
        assert_eq!(c.latch_state(), LatchState::Unset);
    }

    #[test]
    fn test_split_validation() {
        let mut c = corpus(true);
        assert!(matches!(
            c.build_training_set(&[1], 3, 2),
            Err(DatasetError::Configuration(_))
        ));
        assert!(matches!(
            c.build_training_set(&[1], 0, 2),
            Err(DatasetError::Configuration(_))
        ));
        assert!(matches!(
            c.build_training_set(&[1], usize::MAX, 1),
            Err(DatasetError::Configuration(_))
        ));
        assert!(matches!(
            c.build_training_set(&[4], 2, 2),
            Err(DatasetError::UnknownWell { id: 4, well_count: 3 })
        ));
        assert!(matches!(
            c.build_training_set(&[0], 2, 2),
            Err(DatasetError::UnknownWell { id: 0, .. })
        ));
    }

    #[test]
    fn test_zero_window_rejected_eagerly() {
        let mut config = tiny_config(true);
        config.window.size = 0;
        let tables = vec![well(1, 10, &config.schema, 0.0)];
        let mut c = WellCorpus::from_tables(config, tables).unwrap();
        assert!(matches!(
            c.build_training_set(&[1], 2, 2),
            Err(DatasetError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_train_ids_give_empty_set() {
        let mut c = corpus(true);
        let set = c.build_training_set(&[], 2, 2).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.inputs.dim(), (0, 4, 2));
        assert_eq!(c.latch_state(), LatchState::Unset);
    }

    #[test]
    fn test_latch_transitions() {
        let mut c = corpus(true);
        assert_eq!(c.latch_state(), LatchState::Unset);
        assert!(matches!(
            c.inverse_target(Array2::zeros((1, 2)).view()),
            Err(DatasetError::IllegalState(_))
        ));

        c.build_test_view(2).unwrap();
        assert_eq!(c.latch_state(), LatchState::SetByTestView(2));

        c.build_training_set(&[1], 2, 2).unwrap();
        assert_eq!(c.latch_state(), LatchState::SetByTrainingBuild);

        c.build_test_view(1).unwrap();
        assert_eq!(c.latch_state(), LatchState::SetByTestView(1));

        // Reading does not transition
        c.inverse_target(Array2::zeros((1, 2)).view()).unwrap();
        assert_eq!(c.latch_state(), LatchState::SetByTestView(1));
    }

    #[test]
    fn test_test_view_round_trip() {
        let mut c = corpus(true);
        let view = c.build_test_view(1).unwrap();
        assert_eq!(view.input.dim(), (10, 2));
        assert_eq!(view.target.dim(), (10, 2));

        let original = c.well(1).unwrap().select(&["UCS", "TOC"]).unwrap();
        let restored = c.inverse_target(view.target.view()).unwrap();
        for (a, b) in restored.iter().zip(original.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
        assert_eq!(
            view.target_scaler.inverse_transform(view.target.view()).unwrap(),
            restored
        );
    }

    #[test]
    fn test_test_view_without_individual_uses_group_scaler() {
        let mut c = corpus(false);
        let view = c.build_test_view(3).unwrap();
        assert_eq!(&view.target_scaler, c.target_group_scaler());
        assert_eq!(c.latch_state(), LatchState::Unset);

        let original = c.well(3).unwrap().select(&["UCS", "TOC"]).unwrap();
        let restored = c.inverse_target(view.target.view()).unwrap();
        for (a, b) in restored.iter().zip(original.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_corpus_scalers_pool_all_wells() {
        let c = corpus(true);
        let scaler = c.feature_scaler("GR").unwrap();
        assert_eq!(scaler.samples(), 20);
        assert_eq!(c.target_group_scaler().n_features(), 2);
        assert!(c.feature_scaler("DEPT").is_none());
    }
}
