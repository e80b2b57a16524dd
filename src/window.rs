//! Fixed-length, fixed-stride windowing over depth-ordered matrices.
//!
//! Windows start at row 0 and advance by `stride` rows; generation stops at
//! the first start whose window would run past the last row, so trailing
//! partial windows are dropped rather than padded.

use ndarray::{s, Array3, ArrayView2, Axis};

/// Lazy iterator over the windows of a matrix.
///
/// `Clone` gives an independent restart from the current position; call
/// [`windows`] again for a fresh pass from row 0.
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    matrix: ArrayView2<'a, f64>,
    size: usize,
    stride: usize,
    next_start: usize,
}

/// Yield `size`-row windows of `matrix`, one every `stride` rows.
///
/// A zero `size` or `stride` yields nothing.
pub fn windows(matrix: ArrayView2<'_, f64>, size: usize, stride: usize) -> Windows<'_> {
    Windows {
        matrix,
        size,
        stride,
        next_start: 0,
    }
}

impl<'a> Iterator for Windows<'a> {
    type Item = ArrayView2<'a, f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.size == 0 || self.stride == 0 {
            return None;
        }
        let start = self.next_start;
        let end = start.checked_add(self.size)?;
        if end > self.matrix.nrows() {
            return None;
        }
        self.next_start = start + self.stride;
        Some(self.matrix.slice_move(s![start..end, ..]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .matrix
            .nrows()
            .checked_sub(self.next_start)
            .map_or(0, |rows| window_count(rows, self.size, self.stride));
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}

/// Number of complete windows over `rows` rows: `floor((rows - size) / stride) + 1`,
/// or zero when `rows < size`.
pub fn window_count(rows: usize, size: usize, stride: usize) -> usize {
    if size == 0 || stride == 0 || rows < size {
        return 0;
    }
    (rows - size) / stride + 1
}

/// Start rows of every window, ascending.
pub fn window_starts(rows: usize, size: usize, stride: usize) -> impl Iterator<Item = usize> {
    (0..window_count(rows, size, stride)).map(move |i| i * stride)
}

/// Stack every window into a `(count, size, columns)` tensor.
pub fn stack_windows(matrix: ArrayView2<'_, f64>, size: usize, stride: usize) -> Array3<f64> {
    let count = window_count(matrix.nrows(), size, stride);
    let mut out = Array3::zeros((count, size, matrix.ncols()));
    for (mut slot, window) in out.axis_iter_mut(Axis(0)).zip(windows(matrix, size, stride)) {
        slot.assign(&window);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn ramp(rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(i, j)| (i * 10 + j) as f64)
    }

    #[test]
    fn test_count_matches_formula() {
        for rows in [0usize, 1, 149, 150, 151, 179, 180, 210, 1000] {
            let m = ramp(rows, 2);
            let expected = if rows < 150 { 0 } else { (rows - 150) / 30 + 1 };
            assert_eq!(windows(m.view(), 150, 30).count(), expected, "rows={rows}");
            assert_eq!(window_count(rows, 150, 30), expected);
        }
    }

    #[test]
    fn test_starts_and_shapes() {
        let m = ramp(210, 3);
        let starts: Vec<usize> = windows(m.view(), 150, 30).map(|w| w[[0, 0]] as usize / 10).collect();
        assert_eq!(starts, vec![0, 30, 60]);
        assert_eq!(window_starts(210, 150, 30).collect::<Vec<_>>(), vec![0, 30, 60]);
        for w in windows(m.view(), 150, 30) {
            assert_eq!(w.dim(), (150, 3));
        }
    }

    #[test]
    fn test_partial_window_dropped() {
        let m = ramp(10, 1);
        let all: Vec<_> = windows(m.view(), 4, 3).collect();
        // starts 0, 3, 6; start 9 would need rows 9..13
        assert_eq!(all.len(), 3);
        assert_eq!(all[2][[3, 0]], 90.0);
    }

    #[test]
    fn test_empty_and_degenerate_inputs() {
        let m = ramp(5, 2);
        assert_eq!(windows(m.view(), 6, 1).count(), 0);
        assert_eq!(windows(m.view(), 0, 1).count(), 0);
        assert_eq!(windows(m.view(), 2, 0).count(), 0);
    }

    #[test]
    fn test_restartable() {
        let m = ramp(50, 1);
        let iter = windows(m.view(), 10, 10);
        let first: Vec<f64> = iter.clone().map(|w| w[[0, 0]]).collect();
        let second: Vec<f64> = iter.map(|w| w[[0, 0]]).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn test_size_hint_exact() {
        let m = ramp(100, 1);
        let mut iter = windows(m.view(), 20, 15);
        assert_eq!(iter.len(), 6);
        iter.next();
        assert_eq!(iter.len(), 5);
    }

    #[test]
    fn test_stack_windows() {
        let m = ramp(210, 2);
        let stacked = stack_windows(m.view(), 150, 30);
        assert_eq!(stacked.dim(), (3, 150, 2));
        assert_eq!(stacked[[1, 0, 1]], m[[30, 1]]);
        assert_eq!(stacked[[2, 149, 0]], m[[209, 0]]);
    }
}
