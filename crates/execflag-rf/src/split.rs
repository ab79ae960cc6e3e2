use rand::Rng;

use crate::node::{FeatureIndex, Impurity};

/// Criterion for measuring the quality of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl SplitCriterion {
    /// Compute the impurity of a node from its class-weighted counts.
    ///
    /// `p_i = counts[i] / Σ counts`. Returns zero when the total weight is
    /// zero.
    #[must_use]
    pub fn impurity(&self, counts: &[f64]) -> Impurity {
        let total: f64 = counts.iter().sum();
        if total <= 0.0 {
            return Impurity::new(0.0);
        }
        let value = match self {
            SplitCriterion::Gini => {
                1.0 - counts
                    .iter()
                    .map(|&c| {
                        let p = c / total;
                        p * p
                    })
                    .sum::<f64>()
            }
            SplitCriterion::Entropy => -counts
                .iter()
                .filter(|&&c| c > 0.0)
                .map(|&c| {
                    let p = c / total;
                    p * p.ln()
                })
                .sum::<f64>(),
        };
        Impurity::new(value)
    }
}

/// Sum the class weight of every sample, per class.
pub(crate) fn weighted_counts(
    labels: &[usize],
    sample_indices: &[usize],
    class_weights: &[f64],
) -> Vec<f64> {
    let mut counts = vec![0.0f64; class_weights.len()];
    for &si in sample_indices {
        counts[labels[si]] += class_weights[labels[si]];
    }
    counts
}

/// Best split found for one node.
#[derive(Debug, Clone)]
pub(crate) struct SplitCandidate {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    /// `W·I(parent) - W_l·I(left) - W_r·I(right)` over class weights.
    pub(crate) impurity_decrease: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// Tree-wide inputs to split search.
pub(crate) struct SplitContext<'a> {
    /// Column-major: `features[feature_idx][sample_idx]`.
    pub(crate) features: &'a [Vec<f64>],
    pub(crate) labels: &'a [usize],
    pub(crate) class_weights: &'a [f64],
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_features: usize,
    pub(crate) min_samples_leaf: usize,
}

impl SplitContext<'_> {
    /// Find the best threshold split among `max_features` randomly drawn
    /// features.
    ///
    /// Each drawn feature is sorted once and scanned left to right with
    /// incremental weighted counts. Boundaries between equal values and
    /// splits leaving fewer than `min_samples_leaf` samples on a side are
    /// skipped. Returns `None` when no boundary qualifies.
    pub(crate) fn find_best_split(
        &self,
        sample_indices: &[usize],
        parent_counts: &[f64],
        rng: &mut impl Rng,
    ) -> Option<SplitCandidate> {
        let n_features = self.features.len();
        let n_samples = sample_indices.len();
        if n_samples < 2 || n_features == 0 {
            return None;
        }

        let parent_weight: f64 = parent_counts.iter().sum();
        let parent_impurity = self.criterion.impurity(parent_counts).value();

        // Partial Fisher-Yates over the first `take` positions.
        let mut feature_order: Vec<usize> = (0..n_features).collect();
        let take = self.max_features.min(n_features);
        for i in 0..take {
            let j = rng.gen_range(i..n_features);
            feature_order.swap(i, j);
        }

        let mut best_decrease = f64::NEG_INFINITY;
        let mut best: Option<(usize, f64)> = None;

        for &feat_idx in &feature_order[..take] {
            let column = &self.features[feat_idx];
            let mut sorted: Vec<(f64, usize)> =
                sample_indices.iter().map(|&si| (column[si], si)).collect();
            sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            let mut left_counts = vec![0.0f64; parent_counts.len()];
            let mut right_counts = parent_counts.to_vec();
            let mut left_weight = 0.0f64;

            for i in 0..(n_samples - 1) {
                let (value, si) = sorted[i];
                let class = self.labels[si];
                let w = self.class_weights[class];
                left_counts[class] += w;
                right_counts[class] -= w;
                left_weight += w;

                let next = sorted[i + 1].0;
                if value == next {
                    continue;
                }
                let n_left = i + 1;
                if n_left < self.min_samples_leaf || n_samples - n_left < self.min_samples_leaf {
                    continue;
                }

                let right_weight = parent_weight - left_weight;
                let decrease = parent_weight * parent_impurity
                    - left_weight * self.criterion.impurity(&left_counts).value()
                    - right_weight * self.criterion.impurity(&right_counts).value();

                if decrease > best_decrease {
                    best_decrease = decrease;
                    best = Some((feat_idx, (value + next) / 2.0));
                }
            }
        }

        let (feature, threshold) = best?;
        let column = &self.features[feature];
        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
            .iter()
            .partition(|&&si| column[si] <= threshold);

        Some(SplitCandidate {
            feature: FeatureIndex::new(feature),
            threshold,
            impurity_decrease: best_decrease,
            left_indices,
            right_indices,
        })
    }
}
