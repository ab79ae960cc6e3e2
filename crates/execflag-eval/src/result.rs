//! Evaluation and training outputs.

use execflag_rf::{RankedFeature, rank_features};
use serde::Serialize;

use crate::metrics::{ClassMetrics, ConfusionMatrix};

/// One predicted label next to the actual label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Prediction {
    /// Zero-based row in the evaluated frame (after filtering).
    pub row: usize,
    /// Label returned by the model.
    pub predicted: i64,
    /// Label stored in the file.
    pub actual: i64,
}

impl Prediction {
    /// Return `true` when the prediction matches the label.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.predicted == self.actual
    }
}

/// Per-row predictions of a test or leave-one-out run, with aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    accuracy: f64,
    n_rows: usize,
    confusion: ConfusionMatrix,
    class_metrics: Vec<ClassMetrics>,
    predictions: Vec<Prediction>,
}

impl EvaluationResult {
    /// Aggregate predictions given in row order.
    #[must_use]
    pub fn from_predictions(predictions: Vec<Prediction>) -> Self {
        let confusion =
            ConfusionMatrix::from_pairs(predictions.iter().map(|p| (p.actual, p.predicted)));
        Self {
            accuracy: confusion.accuracy(),
            n_rows: predictions.len(),
            class_metrics: confusion.class_metrics(),
            confusion,
            predictions,
        }
    }

    /// Fraction of rows predicted correctly; 0.0 when there are no rows.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Return the per-row predictions in row order.
    #[must_use]
    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    /// Return the confusion matrix.
    #[must_use]
    pub fn confusion(&self) -> &ConfusionMatrix {
        &self.confusion
    }

    /// Return precision, recall and F1 per label.
    #[must_use]
    pub fn class_metrics(&self) -> &[ClassMetrics] {
        &self.class_metrics
    }
}

/// Importance of one predictor in a trained model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    /// Predictor column name.
    pub name: String,
    /// Importance weight reported by the model.
    pub importance: f64,
    /// 1-based rank, 1 being the most important.
    pub rank: usize,
}

impl From<RankedFeature> for FeatureImportance {
    fn from(feature: RankedFeature) -> Self {
        Self {
            name: feature.name,
            importance: feature.importance,
            rank: feature.rank,
        }
    }
}

/// What `train` fitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    /// Rows used for fitting (after filtering).
    pub n_rows: usize,
    /// The formula, rendered as `label ~ a + b`.
    pub formula: String,
    /// Predictors ranked by importance.
    pub importance: Vec<FeatureImportance>,
}

impl TrainingSummary {
    pub(crate) fn new(n_rows: usize, formula: String, names: &[String], weights: &[f64]) -> Self {
        let importance = rank_features(names, weights)
            .into_iter()
            .map(FeatureImportance::from)
            .collect();
        Self {
            n_rows,
            formula,
            importance,
        }
    }
}
