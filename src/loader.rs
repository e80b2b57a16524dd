//! Per-well CSV loading.
//!
//! Each well file carries a header row followed by one numeric record per
//! depth sample. The header's names are discarded and replaced with the
//! canonical schema names; only the column count is checked. A synthetic
//! `DEPT` column numbering the rows 1..=N is appended.
//!
//! # Usage
//!
//! ```ignore
//! use welllog_dataset::loader::WellTable;
//! use welllog_dataset::schema::FeatureSchema;
//!
//! let well = WellTable::load(1, "data/A1.csv", &FeatureSchema::default())?;
//! let gamma = well.column("GGRM")?;
//! ```

use crate::error::{DatasetError, Result};
use crate::schema::{FeatureSchema, ROW_INDEX_COLUMN};
use ndarray::{Array2, ArrayView1, Axis};
use std::fs::File;
use std::path::{Path, PathBuf};

/// One well's full record set, immutable after load.
#[derive(Debug, Clone)]
pub struct WellTable {
    well_id: usize,
    columns: Vec<String>,
    /// Rows are depth samples, columns follow `columns`
    data: Array2<f64>,
    source: PathBuf,
}

impl WellTable {
    /// Load one well file, assigning the canonical column names.
    pub fn load(well_id: usize, path: impl AsRef<Path>, schema: &FeatureSchema) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DatasetError::FileNotFound(path.to_path_buf()));
        }

        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let width = schema.file_width();
        let header_len = reader
            .headers()
            .map_err(|e| csv_error(path, &e))?
            .len();
        if header_len != width {
            return Err(DatasetError::SchemaMismatch {
                path: path.to_path_buf(),
                line: 1,
                expected: width,
                found: header_len,
            });
        }

        let mut values: Vec<f64> = Vec::new();
        let mut rows = 0usize;

        for record in reader.records() {
            let record = record.map_err(|e| csv_error(path, &e))?;
            let line = record.position().map_or(0, csv::Position::line);

            if record.len() != width {
                return Err(DatasetError::SchemaMismatch {
                    path: path.to_path_buf(),
                    line,
                    expected: width,
                    found: record.len(),
                });
            }

            for (field, name) in record.iter().zip(&schema.head) {
                let value = field.parse::<f64>().map_err(|_| DatasetError::Parse {
                    path: path.to_path_buf(),
                    line,
                    message: format!("column {name}: '{field}' is not a number"),
                })?;
                values.push(value);
            }

            rows += 1;
            // DEPT, 1-based row position
            values.push(rows as f64);
        }

        let data = Array2::from_shape_vec((rows, width + 1), values).map_err(|e| {
            DatasetError::Parse {
                path: path.to_path_buf(),
                line: 0,
                message: e.to_string(),
            }
        })?;

        let mut columns = schema.head.clone();
        columns.push(ROW_INDEX_COLUMN.to_string());

        tracing::info!(well = well_id, file = %path.display(), rows, "Well loaded");

        Ok(Self {
            well_id,
            columns,
            data,
            source: path.to_path_buf(),
        })
    }

    /// Build a table from an in-memory matrix laid out like a well file.
    pub fn from_matrix(well_id: usize, schema: &FeatureSchema, matrix: &Array2<f64>) -> Result<Self> {
        if matrix.ncols() != schema.file_width() {
            return Err(DatasetError::SchemaMismatch {
                path: PathBuf::from(format!("<well {well_id}>")),
                line: 0,
                expected: schema.file_width(),
                found: matrix.ncols(),
            });
        }

        let rows = matrix.nrows();
        let mut data = Array2::zeros((rows, matrix.ncols() + 1));
        data.slice_mut(ndarray::s![.., ..matrix.ncols()]).assign(matrix);
        for (i, mut row) in data.axis_iter_mut(Axis(0)).enumerate() {
            row[matrix.ncols()] = (i + 1) as f64;
        }

        let mut columns = schema.head.clone();
        columns.push(ROW_INDEX_COLUMN.to_string());

        Ok(Self {
            well_id,
            columns,
            data,
            source: PathBuf::from(format!("<well {well_id}>")),
        })
    }

    pub fn well_id(&self) -> usize {
        self.well_id
    }

    /// Number of depth samples.
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Canonical names followed by `DEPT`.
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// View one column by name.
    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| DatasetError::UnknownColumn(name.to_string()))?;
        Ok(self.data.column(idx))
    }

    /// Copy the named columns, in the given order, into a new matrix.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Array2<f64>> {
        let indices = names
            .iter()
            .map(|n| {
                let n = n.as_ref();
                self.column_index(n)
                    .ok_or_else(|| DatasetError::UnknownColumn(n.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.data.select(Axis(1), &indices))
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

fn csv_error(path: &Path, err: &csv::Error) -> DatasetError {
    if let csv::ErrorKind::Io(e) = err.kind() {
        return DatasetError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(e.kind(), e.to_string()),
        };
    }
    DatasetError::Parse {
        path: path.to_path_buf(),
        line: err.position().map_or(0, csv::Position::line),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn small_schema() -> FeatureSchema {
        FeatureSchema::new(&["DEPTH", "GR", "UCS"], &["DEPTH", "GR", "UCS"], &["UCS"])
    }

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_renames_header_and_adds_dept() {
        let file = write_csv("a,b,c\n100.0,50.0,3.0\n100.5,55.0,3.5\n101.0,60.0,4.0\n");
        let well = WellTable::load(7, file.path(), &small_schema()).unwrap();

        assert_eq!(well.well_id(), 7);
        assert_eq!(well.n_rows(), 3);
        assert_eq!(well.column_names(), &["DEPTH", "GR", "UCS", "DEPT"]);
        assert_eq!(well.column("GR").unwrap().to_vec(), vec![50.0, 55.0, 60.0]);
        assert_eq!(well.column("DEPT").unwrap().to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_select_preserves_requested_order() {
        let file = write_csv("x,y,z\n1,2,3\n4,5,6\n");
        let well = WellTable::load(1, file.path(), &small_schema()).unwrap();
        let m = well.select(&["UCS", "DEPTH"]).unwrap();
        assert_eq!(m, ndarray::array![[3.0, 1.0], [6.0, 4.0]]);
        assert!(matches!(
            well.select(&["NOPE"]),
            Err(DatasetError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = WellTable::load(1, "/definitely/not/here.csv", &small_schema()).unwrap_err();
        assert!(matches!(err, DatasetError::FileNotFound(_)));
    }

    #[test]
    fn test_header_width_mismatch() {
        let file = write_csv("a,b\n1,2\n");
        let err = WellTable::load(1, file.path(), &small_schema()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::SchemaMismatch { expected: 3, found: 2, .. }
        ));
    }

    #[test]
    fn test_short_record_is_schema_mismatch() {
        let file = write_csv("a,b,c\n1,2,3\n4,5\n");
        let err = WellTable::load(1, file.path(), &small_schema()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::SchemaMismatch { line: 3, found: 2, .. }
        ));
    }

    #[test]
    fn test_non_numeric_cell() {
        let file = write_csv("a,b,c\n1,abc,3\n");
        let err = WellTable::load(1, file.path(), &small_schema()).unwrap_err();
        match err {
            DatasetError::Parse { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("GR"), "message: {message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_header_only_file_has_no_rows() {
        let file = write_csv("a,b,c\n");
        let well = WellTable::load(1, file.path(), &small_schema()).unwrap();
        assert_eq!(well.n_rows(), 0);
        assert_eq!(well.column_names().len(), 4);
    }
}
