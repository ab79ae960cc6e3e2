//! Confusion matrix and per-class classification metrics over integer labels.

use std::fmt;

use serde::Serialize;

/// A confusion matrix keyed by label value.
///
/// `classes` holds every label seen as actual or predicted, ascending.
/// Entry `matrix[i][j]` counts rows whose actual label is `classes[i]`
/// and whose predicted label is `classes[j]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    classes: Vec<i64>,
    matrix: Vec<Vec<usize>>,
}

/// Per-class precision, recall, and F1 score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    /// The label value.
    pub class: i64,
    /// TP / (TP + FP); 0.0 when the class is never predicted.
    pub precision: f64,
    /// TP / (TP + FN); 0.0 when the class never occurs.
    pub recall: f64,
    /// Harmonic mean of precision and recall; 0.0 when both are zero.
    pub f1: f64,
    /// Number of rows whose actual label is this class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Build a matrix from `(actual, predicted)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i64, i64)> + Clone) -> Self {
        let mut classes: Vec<i64> = pairs
            .clone()
            .into_iter()
            .flat_map(|(a, p)| [a, p])
            .collect();
        classes.sort_unstable();
        classes.dedup();

        let mut matrix = vec![vec![0usize; classes.len()]; classes.len()];
        for (actual, predicted) in pairs {
            // Both labels were inserted above.
            let i = classes.binary_search(&actual).unwrap_or_default();
            let j = classes.binary_search(&predicted).unwrap_or_default();
            matrix[i][j] += 1;
        }
        Self { classes, matrix }
    }

    /// Proportion of correct predictions; 0.0 for an empty matrix.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.classes.len()).map(|i| self.matrix[i][i]).sum();
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }

    /// Per-class precision, recall, F1, and support, by ascending label.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        let n = self.classes.len();
        (0..n)
            .map(|c| {
                let tp = self.matrix[c][c];
                let predicted: usize = (0..n).map(|i| self.matrix[i][c]).sum();
                let support: usize = self.matrix[c].iter().sum();
                let precision = if predicted == 0 {
                    0.0
                } else {
                    tp as f64 / predicted as f64
                };
                let recall = if support == 0 {
                    0.0
                } else {
                    tp as f64 / support as f64
                };
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class: self.classes[c],
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Return the label values, ascending.
    #[must_use]
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    /// Return the matrix rows (actual labels).
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Return the number of rows counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>10}", "")?;
        for class in &self.classes {
            write!(f, " pred_{class:>4}")?;
        }
        writeln!(f)?;
        for (class, row) in self.classes.iter().zip(&self.matrix) {
            write!(f, "true_{class:>5}")?;
            for count in row {
                write!(f, " {count:>9}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
