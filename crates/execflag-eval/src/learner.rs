//! The fitting capability the harness consumes.

use std::fmt;

use execflag_frame::{Formula, Frame};

use crate::{EvalError, SeedSequence};

/// A fitted model that labels one row of predictor values.
pub trait Classifier: Send + Sync {
    /// Predict the label for `features`, given in formula predictor order.
    ///
    /// # Errors
    ///
    /// Implementations fail when `features` has the wrong length.
    fn predict(&self, features: &[f64]) -> Result<i64, EvalError>;

    /// One importance weight per predictor, in formula order.
    fn importance(&self) -> Vec<f64>;
}

/// Fits a [`Classifier`] from a frame and a formula.
///
/// A fit must be deterministic: the same formula, frame, parameters and
/// seeds always produce a model with the same predictions.
pub trait Learner: Sync {
    /// Hyperparameters for one fit.
    type Params: fmt::Debug + Send + Sync;
    /// The fitted model.
    type Model: Classifier;

    /// Fit a model to `frame` through `formula`.
    ///
    /// # Errors
    ///
    /// Fails on missing columns, non-integral labels, exhausted seeds, or
    /// any rejection from the underlying algorithm.
    fn fit(
        &self,
        formula: &Formula,
        frame: &Frame,
        params: &Self::Params,
        seeds: &SeedSequence,
    ) -> Result<Self::Model, EvalError>;
}

/// Read the formula's label column as integers.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`EvalError::Frame`] | The label column is missing |
/// | [`EvalError::NonIntegralLabel`] | A label has a fractional part or does not fit in `i64` |
pub fn integral_labels(formula: &Formula, frame: &Frame) -> Result<Vec<i64>, EvalError> {
    let column = frame.column(formula.label_index(frame)?)?;
    column
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                Ok(value as i64)
            } else {
                Err(EvalError::NonIntegralLabel {
                    column: formula.label().to_string(),
                    row,
                    value,
                })
            }
        })
        .collect()
}

/// Collect each row's predictor values in formula order.
pub(crate) fn predictor_rows(formula: &Formula, frame: &Frame) -> Result<Vec<Vec<f64>>, EvalError> {
    let indices = formula.predictor_indices(frame)?;
    Ok(frame
        .rows()
        .map(|row| indices.iter().map(|&i| row[i]).collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(labels: &[f64]) -> Frame {
        Frame::new(
            vec!["WAP".into(), "EXECUTE".into()],
            labels.iter().map(|&l| vec![0.5, l]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn labels_convert_to_integers() {
        let formula = Formula::new("EXECUTE", ["WAP"]).unwrap();
        let labels = integral_labels(&formula, &frame(&[0.0, 1.0, -1.0])).unwrap();
        assert_eq!(labels, vec![0, 1, -1]);
    }

    #[test]
    fn fractional_label_rejected() {
        let formula = Formula::new("EXECUTE", ["WAP"]).unwrap();
        match integral_labels(&formula, &frame(&[0.0, 0.5])) {
            Err(EvalError::NonIntegralLabel { row, value, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(value, 0.5);
            }
            other => panic!("expected NonIntegralLabel, got {other:?}"),
        }
    }

    #[test]
    fn predictor_rows_follow_formula_order() {
        let frame = Frame::new(
            vec!["Minute".into(), "WAP".into(), "EXECUTE".into()],
            vec![vec![20.0, 0.66, 1.0]],
        )
        .unwrap();
        let formula = Formula::new("EXECUTE", ["WAP", "Minute"]).unwrap();
        assert_eq!(predictor_rows(&formula, &frame).unwrap(), vec![vec![0.66, 20.0]]);
    }
}
