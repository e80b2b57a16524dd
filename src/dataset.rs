//! Index-addressable training dataset handed to a training loop.
//!
//! A trainer only needs [`DatasetView::len`], [`DatasetView::get`] and
//! [`DatasetView::reset`]; the rest is inspection.

use crate::corpus::{TrainingSet, WellCorpus};
use crate::error::{DatasetError, Result};
use ndarray::{ArrayView2, Axis};

/// One paired sample: `(window, input_dim)` inputs and `(window, output_dim)` targets.
pub type Sample<'a> = (ArrayView2<'a, f32>, ArrayView2<'a, f32>);

/// Training set view over a corpus.
#[derive(Debug, Clone)]
pub struct DatasetView {
    corpus: WellCorpus,
    train_ids: Vec<usize>,
    set: TrainingSet,
}

impl DatasetView {
    /// Build the initial training set for `train_ids`.
    pub fn new(
        mut corpus: WellCorpus,
        train_ids: Vec<usize>,
        input_dim: usize,
        output_dim: usize,
    ) -> Result<Self> {
        let set = corpus.build_training_set(&train_ids, input_dim, output_dim)?;
        Ok(Self {
            corpus,
            train_ids,
            set,
        })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Sample at `index`, valid for `0..len()`.
    pub fn get(&self, index: usize) -> Result<Sample<'_>> {
        if index >= self.len() {
            return Err(DatasetError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok((
            self.set.inputs.index_axis(Axis(0), index),
            self.set.targets.index_axis(Axis(0), index),
        ))
    }

    /// Rebuild with a new input/output column split.
    ///
    /// On error the previous training set is kept.
    pub fn reset(&mut self, input_dim: usize, output_dim: usize) -> Result<()> {
        let set = self
            .corpus
            .build_training_set(&self.train_ids, input_dim, output_dim)?;
        tracing::info!(
            samples = set.len(),
            input_dim,
            output_dim,
            "Dataset reset"
        );
        self.set = set;
        Ok(())
    }

    /// Iterate every sample in index order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Sample<'_>> + '_ {
        self.set
            .inputs
            .outer_iter()
            .zip(self.set.targets.outer_iter())
    }

    pub fn input_dim(&self) -> usize {
        self.set.input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.set.output_dim
    }

    pub fn train_ids(&self) -> &[usize] {
        &self.train_ids
    }

    /// Well that produced sample `index`.
    pub fn well_of(&self, index: usize) -> Option<usize> {
        self.set.well_of(index)
    }

    pub fn training_set(&self) -> &TrainingSet {
        &self.set
    }

    pub fn corpus(&self) -> &WellCorpus {
        &self.corpus
    }

    /// Mutable corpus access, e.g. for `build_test_view`.
    pub fn corpus_mut(&mut self) -> &mut WellCorpus {
        &mut self.corpus
    }
}
