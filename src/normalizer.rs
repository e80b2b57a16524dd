//! Per-column standardization.
//!
//! A [`Scaler`] stores the mean and scale of every column of the sample it
//! was fit on and maps values to `(x - mean) / scale`. Statistics are the
//! population mean and standard deviation (divisor `n`).

use crate::error::{DatasetError, Result};
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Standard deviations below this are treated as a constant column.
pub const MIN_SCALE: f64 = 10.0 * f64::EPSILON;

/// True when `std` is indistinguishable from the round-off of summing `n`
/// copies of `mean`: `var <= n*eps*var + (n*mean*eps)^2`.
fn is_constant(std: f64, mean: f64, n: usize) -> bool {
    if !std.is_finite() || std < MIN_SCALE {
        return true;
    }
    let n = n as f64;
    let var = std * std;
    let bound = (n * f64::EPSILON).mul_add(var, (n * mean * f64::EPSILON).powi(2));
    var <= bound
}

/// Fitted standardization transform for one or more columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    mean: Vec<f64>,
    /// Standard deviation per column, or 1.0 for constant columns
    scale: Vec<f64>,
    samples: usize,
}

impl Scaler {
    /// Fit per-column statistics over every row of `samples`.
    pub fn fit(samples: ArrayView2<'_, f64>) -> Result<Self> {
        if samples.nrows() == 0 {
            return Err(DatasetError::EmptySample);
        }

        let mut mean = Vec::with_capacity(samples.ncols());
        let mut scale = Vec::with_capacity(samples.ncols());

        for (idx, column) in samples.axis_iter(Axis(1)).enumerate() {
            let m = column.iter().mean();
            let std = column.iter().population_std_dev();

            // Constant columns map to x - mean
            let s = if is_constant(std, m, samples.nrows()) {
                tracing::debug!(column = idx, std, "Zero-variance column, using unit scale");
                1.0
            } else {
                std
            };

            mean.push(m);
            scale.push(s);
        }

        Ok(Self {
            mean,
            scale,
            samples: samples.nrows(),
        })
    }

    /// Fit on `samples` and return the transformed matrix with its scaler.
    pub fn fit_transform(samples: ArrayView2<'_, f64>) -> Result<(Array2<f64>, Self)> {
        let scaler = Self::fit(samples)?;
        let normalized = scaler.transform(samples)?;
        Ok((normalized, scaler))
    }

    /// Map values to zero-mean unit-variance using the fitted statistics.
    pub fn transform(&self, samples: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_width(samples.ncols())?;
        let mut out = samples.to_owned();
        for (mut column, (m, s)) in out
            .axis_iter_mut(Axis(1))
            .zip(self.mean.iter().zip(&self.scale))
        {
            column.mapv_inplace(|x| (x - m) / s);
        }
        Ok(out)
    }

    /// Exact inverse of [`Scaler::transform`].
    pub fn inverse_transform(&self, samples: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_width(samples.ncols())?;
        let mut out = samples.to_owned();
        for (mut column, (m, s)) in out
            .axis_iter_mut(Axis(1))
            .zip(self.mean.iter().zip(&self.scale))
        {
            column.mapv_inplace(|x| x.mul_add(*s, *m));
        }
        Ok(out)
    }

    /// Number of columns this scaler was fit on.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Number of rows seen during fitting.
    pub fn samples(&self) -> usize {
        self.samples
    }

    fn check_width(&self, found: usize) -> Result<()> {
        if found == self.n_features() {
            Ok(())
        } else {
            Err(DatasetError::ColumnMismatch {
                expected: self.n_features(),
                found,
            })
        }
    }
}
