//! Schema mapping from frame columns to a label and ordered predictors.

use std::fmt;

use crate::frame::check_unique;
use crate::{Frame, FrameError};

/// Declares which column is the classification label and which columns
/// are predictors, in order.
///
/// A formula is built once and shared read-only by ingestion and
/// evaluation. It never reorders or drops frame columns by itself; use
/// [`Formula::project`] to get a predictor-only frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    label: String,
    predictors: Vec<String>,
}

impl Formula {
    /// Create a formula from a label name and predictor names.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`FrameError::EmptyFormula`] | `predictors` is empty |
    /// | [`FrameError::DuplicateColumn`] | A predictor repeats, or the label is also a predictor |
    pub fn new<S: Into<String>>(
        label: impl Into<String>,
        predictors: impl IntoIterator<Item = S>,
    ) -> Result<Self, FrameError> {
        let label = label.into();
        let predictors: Vec<String> = predictors.into_iter().map(Into::into).collect();
        if predictors.is_empty() {
            return Err(FrameError::EmptyFormula { label });
        }
        let mut all = predictors.clone();
        all.push(label.clone());
        check_unique(&all)?;
        Ok(Self { label, predictors })
    }

    /// The trade-execution formula: `EXECUTE ~ WAP + Count + Minute +
    /// Tesla3 + Tesla6 + Tesla9 + Decision`.
    #[must_use]
    pub fn execute_flag() -> Self {
        Self {
            label: "EXECUTE".to_string(),
            predictors: ["WAP", "Count", "Minute", "Tesla3", "Tesla6", "Tesla9", "Decision"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Return the label column name.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Return the predictor column names in order.
    #[must_use]
    pub fn predictors(&self) -> &[String] {
        &self.predictors
    }

    /// Check that the label and every predictor exist in `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::UnknownColumn`] naming the first missing column.
    pub fn validate(&self, frame: &Frame) -> Result<(), FrameError> {
        self.label_index(frame)?;
        self.predictor_indices(frame)?;
        Ok(())
    }

    /// Return the position of the label column in `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::UnknownColumn`] if the label is missing.
    pub fn label_index(&self, frame: &Frame) -> Result<usize, FrameError> {
        frame.column_index(&self.label)
    }

    /// Return the positions of the predictor columns in `frame`, in formula order.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::UnknownColumn`] naming the first missing predictor.
    pub fn predictor_indices(&self, frame: &Frame) -> Result<Vec<usize>, FrameError> {
        self.predictors
            .iter()
            .map(|p| frame.column_index(p))
            .collect()
    }

    /// Return a frame holding only the predictor columns, in formula order.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::UnknownColumn`] naming the first missing predictor.
    pub fn project(&self, frame: &Frame) -> Result<Frame, FrameError> {
        frame.select(&self.predictors)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.label, self.predictors.join(" + "))
    }
}
