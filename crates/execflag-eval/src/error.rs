use execflag_frame::FrameError;
use execflag_io::IoError;
use execflag_rf::RfError;

/// Errors from the evaluation harness and its learners.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// Returned by `test` and `predict` before a successful `train`.
    #[error("model has not been trained")]
    ModelNotTrained,

    /// Returned by `test` when the harness has no testing file.
    #[error("no testing file configured")]
    NoTestPath,

    /// Returned when a fit needs more seeds than the sequence holds.
    #[error("requested {requested} seeds, sequence holds {available}")]
    SeedsExhausted {
        /// Number of seeds requested.
        requested: usize,
        /// Length of the seed sequence.
        available: usize,
    },

    /// Returned when a custom seed sequence is empty.
    #[error("seed sequence must hold at least one seed")]
    EmptySeedSequence,

    /// Returned when leave-one-out evaluation has fewer than two rows.
    #[error("leave-one-out evaluation needs at least 2 rows, got {n_rows}")]
    TooFewRows {
        /// Rows left after loading and filtering.
        n_rows: usize,
    },

    /// Returned when a label value is not an integer.
    #[error("label {column} at row {row} is not an integer: {value}")]
    NonIntegralLabel {
        /// Label column name.
        column: String,
        /// Zero-based row index.
        row: usize,
        /// The offending value.
        value: f64,
    },

    /// Returned when an observation cannot supply a predictor.
    #[error("observation has no value for predictor {name}")]
    MissingFeature {
        /// Predictor column name.
        name: String,
    },

    /// Returned when a row filter expression cannot be parsed.
    #[error("invalid row filter {expr:?}: {reason}")]
    InvalidFilter {
        /// The expression as given.
        expr: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Returned when a label is missing from the configured label set.
    #[error("label {value} is not in the configured label set {labels:?}")]
    UnknownLabel {
        /// The label value found in the data.
        value: i64,
        /// The configured label set.
        labels: Vec<i64>,
    },

    /// Returned when a model predicts a class index with no label value.
    #[error("predicted class {class} but the model knows {n_classes} labels")]
    UnknownClass {
        /// Class index returned by the model.
        class: usize,
        /// Number of distinct training labels.
        n_classes: usize,
    },

    /// Returned when reading a data file fails.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Returned when a frame operation fails.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Returned when the random forest rejects its input.
    #[error("random forest: {0}")]
    Rf(#[from] RfError),
}
