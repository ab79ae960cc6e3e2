//! CSV frame reader with schema and numeric validation.

use std::path::{Path, PathBuf};

use execflag_frame::{Formula, Frame};
use tracing::{debug, info, instrument};

use crate::IoError;

/// Reads a delimited file into a [`Frame`].
///
/// Expected format:
/// - Header row required; it names every column.
/// - `WAP,Volume,Count,Minute,Tesla3,Tesla6,Tesla9,Decision,EXECUTE`
/// - Every data row has exactly as many fields as the header, and every
///   field is a finite decimal number (`.` as decimal separator,
///   surrounding whitespace ignored).
///
/// The formula is a schema check only: the returned frame keeps the
/// file's column order and every column.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingFormulaColumn`] | Header lacks the label or a predictor |
/// | [`IoError::MalformedRow`] | Row has a different field count than the header |
/// | [`IoError::NumericParse`] | Field is NaN, Inf, or not a number |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::Frame`] | Header repeats a column name |
pub struct FrameReader {
    path: PathBuf,
    delimiter: u8,
}

impl FrameReader {
    /// Create a new comma-delimited reader for the given path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            delimiter: b',',
        }
    }

    /// Use a different field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read and validate the file against `formula`, returning a [`Frame`].
    pub fn read(&self, formula: &Formula) -> Result<Frame, IoError> {
        self.load(Some(formula))
    }

    /// Read the file without a formula schema check.
    ///
    /// Same parsing rules and errors as [`read`](Self::read), minus
    /// [`IoError::MissingFormulaColumn`].
    pub fn read_raw(&self) -> Result<Frame, IoError> {
        self.load(None)
    }

    #[instrument(skip(self, formula), fields(path = %self.path.display()))]
    fn load(&self, formula: Option<&Formula>) -> Result<Frame, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets our MalformedRow check fire instead of a
        // low-level CsvParse error on ragged rows.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?;
        let names: Vec<String> = header.iter().map(String::from).collect();
        debug!(n_cols = names.len(), "read CSV header");

        if let Some(formula) = formula {
            debug!(%formula, "checking formula columns");
            let required = std::iter::once(formula.label())
                .chain(formula.predictors().iter().map(String::as_str));
            for column in required {
                if !names.iter().any(|n| n == column) {
                    return Err(IoError::MissingFormulaColumn {
                        path: self.path.clone(),
                        column: column.to_string(),
                    });
                }
            }
        }

        let mut rows = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            if record.len() != names.len() {
                return Err(IoError::MalformedRow {
                    path: self.path.clone(),
                    row_index,
                    expected: names.len(),
                    got: record.len(),
                });
            }

            let mut values = Vec::with_capacity(names.len());
            for (raw, column) in record.iter().zip(&names) {
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NumericParse {
                        path: self.path.clone(),
                        row_index,
                        column: column.clone(),
                        raw: raw.to_string(),
                    })?;
                values.push(value);
            }
            rows.push(values);
        }

        if rows.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let frame = Frame::new(names, rows).map_err(|e| IoError::Frame {
            path: self.path.clone(),
            source: e,
        })?;

        info!(
            n_rows = frame.n_rows(),
            n_cols = frame.n_cols(),
            "frame loaded"
        );
        Ok(frame)
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    fn formula() -> Formula {
        Formula::new("EXECUTE", ["WAP", "Minute"]).unwrap()
    }

    #[test]
    fn read_keeps_file_column_order() {
        let csv = "Minute,Volume,WAP,EXECUTE\n0,100,0.6512,1\n10,250,0.6515,0\n";
        let f = write_csv(csv);
        let frame = FrameReader::new(f.path()).read(&formula()).unwrap();
        assert_eq!(frame.column_names(), &["Minute", "Volume", "WAP", "EXECUTE"]);
        assert_eq!(frame.n_rows(), 2);
        assert_eq!(frame.value(1, "Volume").unwrap(), 250.0);
    }

    #[test]
    fn value_round_trip() {
        let csv = "WAP,Minute,EXECUTE\n0.65123456789,20,1\n";
        let f = write_csv(csv);
        let frame = FrameReader::new(f.path()).read(&formula()).unwrap();
        assert!((frame.value(0, "WAP").unwrap() - 0.65123456789).abs() < 1e-15);
    }

    #[test]
    fn whitespace_and_integers_parse() {
        let csv = "WAP , Minute , EXECUTE\n 0.5 , 40 , 0\n";
        let f = write_csv(csv);
        let frame = FrameReader::new(f.path()).read(&formula()).unwrap();
        assert_eq!(frame.row(0).unwrap(), &[0.5, 40.0, 0.0]);
    }

    #[test]
    fn semicolon_delimiter() {
        let csv = "WAP;Minute;EXECUTE\n0.5;40;0\n";
        let f = write_csv(csv);
        let frame = FrameReader::new(f.path())
            .with_delimiter(b';')
            .read(&formula())
            .unwrap();
        assert_eq!(frame.n_cols(), 3);
    }

    #[test]
    fn read_raw_skips_formula_check() {
        let csv = "Tesla3,Tesla6\n0.1,0.2\n0.3,0.4\n";
        let f = write_csv(csv);
        assert!(matches!(
            FrameReader::new(f.path()).read(&formula()),
            Err(IoError::MissingFormulaColumn { .. })
        ));
        let frame = FrameReader::new(f.path()).read_raw().unwrap();
        assert_eq!(frame.column_names(), &["Tesla3", "Tesla6"]);
        assert_eq!(frame.n_rows(), 2);
    }

    #[test]
    fn error_file_not_found() {
        let result = FrameReader::new(Path::new("/nonexistent/train.csv")).read(&formula());
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn error_malformed_row() {
        let csv = "WAP,Minute,EXECUTE\n0.5,0,1\n0.6,10\n";
        let f = write_csv(csv);
        let result = FrameReader::new(f.path()).read(&formula());
        assert!(matches!(
            result,
            Err(IoError::MalformedRow {
                row_index: 1,
                expected: 3,
                got: 2,
                ..
            })
        ));
    }

    #[test]
    fn error_numeric_parse() {
        let csv = "WAP,Minute,EXECUTE\n0.5,abc,1\n";
        let f = write_csv(csv);
        match FrameReader::new(f.path()).read(&formula()) {
            Err(IoError::NumericParse { column, raw, .. }) => {
                assert_eq!(column, "Minute");
                assert_eq!(raw, "abc");
            }
            other => panic!("expected NumericParse, got {other:?}"),
        }
    }

    #[test]
    fn error_non_finite() {
        for bad in ["NaN", "inf", "-Infinity"] {
            let csv = format!("WAP,Minute,EXECUTE\n{bad},0,1\n");
            let f = write_csv(&csv);
            let result = FrameReader::new(f.path()).read(&formula());
            assert!(matches!(result, Err(IoError::NumericParse { .. })), "{bad}");
        }
    }

    #[test]
    fn error_decimal_comma_rejected() {
        let csv = "WAP;Minute;EXECUTE\n0,5;0;1\n";
        let f = write_csv(csv);
        let result = FrameReader::new(f.path()).with_delimiter(b';').read(&formula());
        assert!(matches!(result, Err(IoError::NumericParse { .. })));
    }

    #[test]
    fn error_missing_formula_column() {
        let csv = "WAP,EXECUTE\n0.5,1\n";
        let f = write_csv(csv);
        match FrameReader::new(f.path()).read(&formula()) {
            Err(IoError::MissingFormulaColumn { column, .. }) => assert_eq!(column, "Minute"),
            other => panic!("expected MissingFormulaColumn, got {other:?}"),
        }
    }

    #[test]
    fn error_empty_dataset() {
        let csv = "WAP,Minute,EXECUTE\n";
        let f = write_csv(csv);
        let result = FrameReader::new(f.path()).read(&formula());
        assert!(matches!(result, Err(IoError::EmptyDataset { .. })));
    }

    #[test]
    fn error_duplicate_header() {
        let csv = "WAP,Minute,WAP,EXECUTE\n0.5,0,0.6,1\n";
        let f = write_csv(csv);
        let result = FrameReader::new(f.path()).read(&formula());
        assert!(matches!(result, Err(IoError::Frame { .. })));
    }
}
