//! Dense row-major frame with named numeric columns.

use std::collections::HashSet;
use std::fmt;

use crate::FrameError;

/// A column reference: either a zero-based position or a column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKey<'a> {
    /// Zero-based column position.
    Index(usize),
    /// Column name (case-sensitive).
    Name(&'a str),
}

impl From<usize> for ColumnKey<'_> {
    fn from(index: usize) -> Self {
        ColumnKey::Index(index)
    }
}

impl<'a> From<&'a str> for ColumnKey<'a> {
    fn from(name: &'a str) -> Self {
        ColumnKey::Name(name)
    }
}

impl<'a> From<&'a String> for ColumnKey<'a> {
    fn from(name: &'a String) -> Self {
        ColumnKey::Name(name.as_str())
    }
}

/// An in-memory table of `f64` values with named, ordered columns.
///
/// Values are stored row-major: `data[row * n_cols + col]`. Every row has
/// exactly one value per column, every value is finite and column names
/// are unique. Frames are
/// never mutated once built; transforms in [`crate::transform`] return new
/// frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    names: Vec<String>,
    data: Vec<f64>,
    n_rows: usize,
}

impl Frame {
    /// Build a frame from column names and row-major rows.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`FrameError::DuplicateColumn`] | A column name repeats |
    /// | [`FrameError::ShapeMismatch`] | A row's length differs from `names.len()` |
    /// | [`FrameError::NonFiniteValue`] | A value is NaN or infinite |
    pub fn new(names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, FrameError> {
        check_unique(&names)?;
        let n_cols = names.len();
        let n_rows = rows.len();
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != n_cols {
                return Err(FrameError::ShapeMismatch {
                    row,
                    expected: n_cols,
                    got: values.len(),
                });
            }
            if let Some(col) = values.iter().position(|v| !v.is_finite()) {
                return Err(FrameError::NonFiniteValue {
                    row,
                    column: names[col].clone(),
                    value: values[col],
                });
            }
            data.extend(values);
        }
        Ok(Self {
            names,
            data,
            n_rows,
        })
    }

    /// Assemble a frame from parts that are already known to be consistent.
    pub(crate) fn from_parts(names: Vec<String>, data: Vec<f64>, n_rows: usize) -> Self {
        debug_assert_eq!(data.len(), n_rows * names.len());
        Self {
            names,
            data,
            n_rows,
        }
    }

    /// Return the column names in order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Return the number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    /// Return `true` if the frame has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Return the position of the named column.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::UnknownColumn`] if no column has that name.
    pub fn column_index(&self, name: &str) -> Result<usize, FrameError> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| FrameError::UnknownColumn {
                name: name.to_string(),
            })
    }

    /// Return the value at `row` in the column identified by `key`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`FrameError::IndexOutOfRange`] | `row` or a column index is outside the frame |
    /// | [`FrameError::UnknownColumn`] | A column name does not exist |
    pub fn value<'a>(&self, row: usize, key: impl Into<ColumnKey<'a>>) -> Result<f64, FrameError> {
        let col = self.resolve(key.into())?;
        self.check_row(row)?;
        Ok(self.data[row * self.n_cols() + col])
    }

    /// Return a copy of the column at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::IndexOutOfRange`] if `index >= n_cols()`.
    pub fn column(&self, index: usize) -> Result<Vec<f64>, FrameError> {
        let col = self.resolve(ColumnKey::Index(index))?;
        Ok(self.rows().map(|row| row[col]).collect())
    }

    /// Return a copy of the named column.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::UnknownColumn`] if no column has that name.
    pub fn column_by_name(&self, name: &str) -> Result<Vec<f64>, FrameError> {
        self.column(self.column_index(name)?)
    }

    /// Borrow the values of one row.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::IndexOutOfRange`] if `index >= n_rows()`.
    pub fn row(&self, index: usize) -> Result<&[f64], FrameError> {
        self.check_row(index)?;
        Ok(self.row_unchecked(index))
    }

    /// Iterate over rows in order.
    #[must_use]
    pub fn rows(&self) -> Rows<'_> {
        Rows {
            frame: self,
            next: 0,
        }
    }

    /// Return a new frame holding rows `[start, end)` with the same columns.
    ///
    /// `slice(r, r)` yields a zero-row frame that keeps the column names.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidRange`] if `start > end` or `end > n_rows()`.
    pub fn slice(&self, start: usize, end: usize) -> Result<Frame, FrameError> {
        if start > end || end > self.n_rows {
            return Err(FrameError::InvalidRange {
                start,
                end,
                n_rows: self.n_rows,
            });
        }
        let n_cols = self.n_cols();
        let data = self.data[start * n_cols..end * n_cols].to_vec();
        Ok(Frame::from_parts(self.names.clone(), data, end - start))
    }

    /// Return a new frame holding only the named columns, in the given order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`FrameError::UnknownColumn`] | A requested name does not exist |
    /// | [`FrameError::DuplicateColumn`] | A name is requested twice |
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Frame, FrameError> {
        let selected: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        check_unique(&selected)?;
        let indices = selected
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Result<Vec<_>, _>>()?;
        let mut data = Vec::with_capacity(self.n_rows * indices.len());
        for row in self.rows() {
            data.extend(indices.iter().map(|&c| row[c]));
        }
        Ok(Frame::from_parts(selected, data, self.n_rows))
    }

    pub(crate) fn row_unchecked(&self, index: usize) -> &[f64] {
        let n_cols = self.n_cols();
        &self.data[index * n_cols..(index + 1) * n_cols]
    }

    fn resolve(&self, key: ColumnKey<'_>) -> Result<usize, FrameError> {
        match key {
            ColumnKey::Index(index) if index < self.n_cols() => Ok(index),
            ColumnKey::Index(index) => Err(FrameError::IndexOutOfRange {
                axis: "column",
                index,
                len: self.n_cols(),
            }),
            ColumnKey::Name(name) => self.column_index(name),
        }
    }

    fn check_row(&self, row: usize) -> Result<(), FrameError> {
        if row >= self.n_rows {
            return Err(FrameError::IndexOutOfRange {
                axis: "row",
                index: row,
                len: self.n_rows,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Frame {
    /// Render the header and up to the first ten rows.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{} rows x {} columns]", self.n_rows, self.n_cols())?;
        writeln!(f, "{}", self.names.join("\t"))?;
        for row in self.rows().take(10) {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(f, "{}", cells.join("\t"))?;
        }
        if self.n_rows > 10 {
            writeln!(f, "... {} more rows", self.n_rows - 10)?;
        }
        Ok(())
    }
}

/// Iterator over the rows of a [`Frame`], yielding one slice per row.
#[derive(Debug, Clone)]
pub struct Rows<'a> {
    frame: &'a Frame,
    next: usize,
}

impl<'a> Iterator for Rows<'a> {
    type Item = &'a [f64];

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.frame.n_rows {
            return None;
        }
        let row = self.frame.row_unchecked(self.next);
        self.next += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.frame.n_rows - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Rows<'_> {}

pub(crate) fn check_unique(names: &[String]) -> Result<(), FrameError> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(FrameError::DuplicateColumn { name: name.clone() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    fn sample() -> Frame {
        Frame::new(
            names(&["WAP", "Count", "EXECUTE"]),
            vec![
                vec![1.5, 10.0, 0.0],
                vec![1.6, 12.0, 1.0],
                vec![1.7, 9.0, 0.0],
                vec![1.4, 20.0, 1.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn shape_accessors() {
        let frame = sample();
        assert_eq!(frame.n_rows(), 4);
        assert_eq!(frame.n_cols(), 3);
        assert_eq!(frame.column_names(), &["WAP", "Count", "EXECUTE"]);
    }

    #[test]
    fn value_by_index_and_name() {
        let frame = sample();
        assert_eq!(frame.value(1, 1usize).unwrap(), 12.0);
        assert_eq!(frame.value(1, "Count").unwrap(), 12.0);
        assert_eq!(frame.value(3, "EXECUTE").unwrap(), 1.0);
    }

    #[test]
    fn value_out_of_range() {
        let frame = sample();
        assert!(matches!(
            frame.value(4, 0usize),
            Err(FrameError::IndexOutOfRange { axis: "row", index: 4, len: 4 })
        ));
        assert!(matches!(
            frame.value(0, 3usize),
            Err(FrameError::IndexOutOfRange { axis: "column", index: 3, len: 3 })
        ));
    }

    #[test]
    fn value_unknown_column() {
        let frame = sample();
        let err = frame.value(0, "Volume").unwrap_err();
        assert_eq!(
            err,
            FrameError::UnknownColumn {
                name: "Volume".into()
            }
        );
    }

    #[test]
    fn column_copy_has_row_count_length() {
        let frame = sample();
        assert_eq!(frame.column(0).unwrap(), vec![1.5, 1.6, 1.7, 1.4]);
        assert_eq!(frame.column_by_name("EXECUTE").unwrap(), vec![0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn shape_mismatch_on_construction() {
        let err = Frame::new(names(&["a", "b"]), vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(
            err,
            FrameError::ShapeMismatch {
                row: 1,
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn non_finite_values_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = Frame::new(names(&["a", "b"]), vec![vec![1.0, 2.0], vec![3.0, bad]])
                .unwrap_err();
            assert!(
                matches!(err, FrameError::NonFiniteValue { row: 1, ref column, .. } if column == "b"),
                "{bad}: {err:?}"
            );
        }
    }

    #[test]
    fn duplicate_column_rejected() {
        let err = Frame::new(names(&["a", "a"]), vec![]).unwrap_err();
        assert!(matches!(err, FrameError::DuplicateColumn { name } if name == "a"));
    }

    #[test]
    fn slice_middle_rows() {
        let frame = sample();
        let sliced = frame.slice(1, 3).unwrap();
        assert_eq!(sliced.n_rows(), 2);
        assert_eq!(sliced.row(0).unwrap(), &[1.6, 12.0, 1.0]);
        assert_eq!(sliced.row(1).unwrap(), &[1.7, 9.0, 0.0]);
    }

    #[test]
    fn empty_slice_keeps_names() {
        let frame = sample();
        for r in 0..=frame.n_rows() {
            let sliced = frame.slice(r, r).unwrap();
            assert_eq!(sliced.n_rows(), 0);
            assert_eq!(sliced.column_names(), frame.column_names());
        }
    }

    #[test]
    fn slice_invalid_ranges() {
        let frame = sample();
        assert!(matches!(frame.slice(3, 2), Err(FrameError::InvalidRange { .. })));
        assert!(matches!(frame.slice(0, 5), Err(FrameError::InvalidRange { .. })));
        assert!(matches!(frame.slice(5, 5), Err(FrameError::InvalidRange { .. })));
    }

    #[test]
    fn select_reorders_columns() {
        let frame = sample();
        let projected = frame.select(&["EXECUTE", "WAP"]).unwrap();
        assert_eq!(projected.column_names(), &["EXECUTE", "WAP"]);
        assert_eq!(projected.row(1).unwrap(), &[1.0, 1.6]);
        assert!(frame.select(&["WAP", "Nope"]).is_err());
    }

    #[test]
    fn rows_iterator_is_exact_size() {
        let frame = sample();
        let rows = frame.rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows.last().unwrap(), &[1.4, 20.0, 1.0]);
    }

    #[test]
    fn zero_column_frame_has_rows() {
        let frame = Frame::new(vec![], vec![vec![], vec![]]).unwrap();
        assert_eq!(frame.n_rows(), 2);
        assert_eq!(frame.rows().count(), 2);
    }
}
