//! Row filters applied when the harness loads a file.

use std::fmt;
use std::str::FromStr;

use execflag_frame::{Frame, FrameError, filter};

use crate::EvalError;

type Predicate = Box<dyn Fn(f64) -> bool + Send + Sync>;

/// Keeps the rows whose value in `column` satisfies a predicate.
///
/// Filters run in the order they were declared, after the file is read
/// and before any fit.
///
/// ```
/// use execflag_eval::RowFilter;
///
/// let by_closure = RowFilter::new("Minute", |m| m == 0.0 || m == 20.0 || m == 40.0);
/// let parsed: RowFilter = "Minute=0,20,40".parse().unwrap();
/// assert_eq!(by_closure.column(), parsed.column());
/// ```
pub struct RowFilter {
    column: String,
    description: String,
    predicate: Predicate,
}

impl RowFilter {
    /// Build a filter from any predicate.
    pub fn new<F>(column: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(f64) -> bool + Send + Sync + 'static,
    {
        Self {
            column: column.into(),
            description: "custom predicate".to_string(),
            predicate: Box::new(predicate),
        }
    }

    /// Keep rows whose value equals one of `values`.
    pub fn one_of(column: impl Into<String>, values: Vec<f64>) -> Self {
        let description = format!(
            "in {{{}}}",
            values
                .iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Self {
            column: column.into(),
            description,
            predicate: Box::new(move |v| values.contains(&v)),
        }
    }

    /// Return the filtered column's name.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Return `true` if `value` passes the filter.
    #[must_use]
    pub fn matches(&self, value: f64) -> bool {
        (self.predicate)(value)
    }

    /// Return the rows of `frame` that pass, in order.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::UnknownColumn`] if the column is missing.
    pub fn apply(&self, frame: &Frame) -> Result<Frame, FrameError> {
        filter(frame, &self.column, &*self.predicate)
    }
}

impl fmt::Debug for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowFilter")
            .field("column", &self.column)
            .field("predicate", &self.description)
            .finish()
    }
}

impl fmt::Display for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.description)
    }
}

/// Parses `COLUMN=v1,v2,...` into [`RowFilter::one_of`].
impl FromStr for RowFilter {
    type Err = EvalError;

    fn from_str(expr: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| EvalError::InvalidFilter {
            expr: expr.to_string(),
            reason: reason.to_string(),
        };
        let (column, values) = expr.split_once('=').ok_or_else(|| invalid("missing '='"))?;
        let column = column.trim();
        if column.is_empty() {
            return Err(invalid("empty column name"));
        }
        let values = values
            .split(',')
            .map(|raw| {
                raw.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| invalid(&format!("{:?} is not a finite number", raw.trim())))
            })
            .collect::<Result<Vec<f64>, _>>()?;
        Ok(Self::one_of(column, values))
    }
}
