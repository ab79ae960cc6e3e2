//! Error types for frame construction, access, and transforms.

/// Errors from frame construction, element access, and frame transforms.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    /// Returned when a row's length differs from the number of column names.
    #[error("row {row} has {got} values, expected {expected} (one per column)")]
    ShapeMismatch {
        /// Zero-based index of the offending row.
        row: usize,
        /// Number of column names.
        expected: usize,
        /// Number of values in the row.
        got: usize,
    },

    /// Returned when a value is NaN or infinite.
    #[error("row {row}, column \"{column}\" holds non-finite value {value}")]
    NonFiniteValue {
        /// Zero-based row index.
        row: usize,
        /// Column name.
        column: String,
        /// The rejected value.
        value: f64,
    },

    /// Returned when a column is too wide to normalize: `max - min`
    /// overflows.
    #[error("cannot normalize column \"{column}\": range [{min}, {max}] overflows")]
    NonFiniteRange {
        /// Column name.
        column: String,
        /// Column minimum.
        min: f64,
        /// Column maximum.
        max: f64,
    },

    /// Returned when a column name appears more than once.
    #[error("duplicate column name \"{name}\"")]
    DuplicateColumn {
        /// The repeated column name.
        name: String,
    },

    /// Returned when a row or column index is outside the frame.
    #[error("{axis} index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// `"row"` or `"column"`.
        axis: &'static str,
        /// The requested index.
        index: usize,
        /// Number of rows or columns available.
        len: usize,
    },

    /// Returned when a column name does not exist in the frame.
    #[error("unknown column \"{name}\"")]
    UnknownColumn {
        /// The requested column name.
        name: String,
    },

    /// Returned when slice bounds are reversed or outside `[0, n_rows]`.
    #[error("invalid row range [{start}, {end}) for frame with {n_rows} rows")]
    InvalidRange {
        /// Inclusive start row.
        start: usize,
        /// Exclusive end row.
        end: usize,
        /// Number of rows in the frame.
        n_rows: usize,
    },

    /// Returned when a split ratio is not strictly between 0 and 1.
    #[error("split ratio must be in (0, 1), got {ratio}")]
    InvalidRatio {
        /// The rejected ratio.
        ratio: f64,
    },

    /// Returned when merging frames with different row counts.
    #[error("cannot merge frames with {left} and {right} rows")]
    RowCountMismatch {
        /// Row count of the left frame.
        left: usize,
        /// Row count of the right frame.
        right: usize,
    },

    /// Returned when stacking frames whose column names differ.
    #[error("cannot stack frames with different columns: {left:?} vs {right:?}")]
    ColumnMismatch {
        /// Column names of the upper frame.
        left: Vec<String>,
        /// Column names of the lower frame.
        right: Vec<String>,
    },

    /// Returned when normalizing a column whose min equals its max.
    #[error("cannot normalize constant column \"{column}\" (every value is {value})")]
    ConstantColumn {
        /// Name of the constant column.
        column: String,
        /// The single value the column holds.
        value: f64,
    },

    /// Returned when `merge_normalized` receives no frames.
    #[error("merge requires at least one frame")]
    EmptyMerge,

    /// Returned when a formula declares no predictors.
    #[error("formula for label \"{label}\" declares no predictors")]
    EmptyFormula {
        /// The label column name.
        label: String,
    },
}
