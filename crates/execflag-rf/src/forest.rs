//! Random Forest training with parallel tree construction, and prediction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::ForestConfig;
use crate::error::RfError;
use crate::importance::{RankedFeature, aggregate_importances, rank_features};
use crate::tree::{DecisionTree, DecisionTreeConfig, to_columns, validate_dataset};

/// Averaged class probabilities from a forest prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDistribution {
    probs: Vec<f64>,
}

impl ClassDistribution {
    /// Return the most probable class; ties go to the lower class.
    #[must_use]
    pub fn predicted_class(&self) -> usize {
        let mut best = 0usize;
        for (class, &p) in self.probs.iter().enumerate() {
            if p > self.probs[best] {
                best = class;
            }
        }
        best
    }

    /// Return the probability distribution as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }
}

/// A fitted Random Forest ensemble.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
    feature_names: Vec<String>,
    importances: Vec<f64>,
}

/// Draw `draw_count` sample indices with replacement.
fn bootstrap_sample(n_samples: usize, draw_count: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..draw_count).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Train the Random Forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &ForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<RandomForest, RfError> {
    let (n_samples, n_features) = validate_dataset(features, labels)?;
    if feature_names.len() != n_features {
        return Err(RfError::FeatureNameMismatch {
            n_names: feature_names.len(),
            n_features,
        });
    }
    let max_features = config.max_features.resolve(n_features)?;
    if !(config.bootstrap_fraction > 0.0 && config.bootstrap_fraction <= 1.0) {
        return Err(RfError::InvalidBootstrapFraction {
            fraction: config.bootstrap_fraction,
        });
    }

    let tree_config = DecisionTreeConfig::new()
        .with_criterion(config.criterion)
        .with_max_depth(config.max_depth)
        .with_max_leaf_nodes(config.max_leaf_nodes)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_max_features(Some(max_features))
        .with_class_weights(config.class_weights.clone());
    tree_config.validate()?;
    let label_classes = labels.iter().max().copied().unwrap_or(0) + 1;
    let n_classes = tree_config.resolve_class_weights(label_classes)?.len();

    let tree_seeds: Vec<u64> = match &config.tree_seeds {
        Some(seeds) if seeds.len() < config.n_trees => {
            return Err(RfError::InsufficientSeeds {
                n_trees: config.n_trees,
                available: seeds.len(),
            });
        }
        Some(seeds) => seeds[..config.n_trees].to_vec(),
        None => {
            let mut master = ChaCha8Rng::seed_from_u64(config.seed);
            (0..config.n_trees).map(|_| master.r#gen()).collect()
        }
    };
    let draw_count = ((n_samples as f64) * config.bootstrap_fraction).ceil() as usize;

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features,
        draw_count,
        explicit_seeds = config.tree_seeds.is_some(),
        "training random forest"
    );

    let columns = to_columns(features, n_features);

    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let bag = bootstrap_sample(n_samples, draw_count, &mut rng);
            let bag_columns: Vec<Vec<f64>> = columns
                .iter()
                .map(|col| bag.iter().map(|&i| col[i]).collect())
                .collect();
            let bag_labels: Vec<usize> = bag.iter().map(|&i| labels[i]).collect();
            tree_config
                .clone()
                .with_seed(rng.r#gen())
                .fit_columns(&bag_columns, &bag_labels, n_classes)
        })
        .collect::<Result<_, _>>()?;

    let per_tree: Vec<Vec<f64>> = trees.iter().map(DecisionTree::feature_importances).collect();
    let importances = aggregate_importances(&per_tree, n_features);

    debug!(
        n_trees_trained = trees.len(),
        mean_leaves = trees.iter().map(DecisionTree::n_leaves).sum::<usize>() as f64
            / trees.len() as f64,
        "random forest training complete"
    );

    Ok(RandomForest {
        trees,
        n_features,
        n_classes,
        feature_names: feature_names.to_vec(),
        importances,
    })
}

impl RandomForest {
    /// Predict the class label for a single sample.
    ///
    /// Returns the argmax of the averaged leaf distributions.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        Ok(self.predict_proba(sample)?.predicted_class())
    }

    /// Return the averaged class probability distribution for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<ClassDistribution, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut avg = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            for (a, p) in avg.iter_mut().zip(tree.predict_proba(sample)?) {
                *a += p;
            }
        }
        let n = self.trees.len() as f64;
        avg.iter_mut().for_each(|v| *v /= n);
        Ok(ClassDistribution { probs: avg })
    }

    /// Predict class labels for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, RfError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Mean Decrease in Impurity per feature in column order, summing to 1
    /// (all zeros when every tree is a single leaf).
    #[must_use]
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Features sorted by descending importance.
    #[must_use]
    pub fn ranked_importances(&self) -> Vec<RankedFeature> {
        rank_features(&self.feature_names, &self.importances)
    }

    /// Return the trees in seed order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the feature names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}
