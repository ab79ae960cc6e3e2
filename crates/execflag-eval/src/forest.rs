//! Random forest learner backed by `execflag-rf`.

use execflag_frame::{Formula, Frame};
use execflag_rf::{ForestConfig, MaxFeatures, RandomForest, SplitCriterion};
use tracing::{debug, instrument};

use crate::learner::{Classifier, Learner, integral_labels, predictor_rows};
use crate::{EvalError, SeedSequence};

/// Hyperparameters for one random forest fit.
///
/// # Presets
///
/// | Parameter | `training()` | `validation()` |
/// |---|---|---|
/// | `n_trees` | 200 | 20 |
/// | `mtry` | floor(sqrt(p)) | 2 |
/// | `criterion` | Gini | Gini |
/// | `max_depth` | 20 | 8 |
/// | `max_leaf_nodes` | none | 10 |
/// | `min_samples_leaf` | 5 | 1 |
/// | `subsample` | 1.0 | 1.0 |
/// | `class_weights` | none | `[1, 100]` |
/// | `labels` | from data | `[0, 1]` |
///
/// `class_weights[i]` applies to the `i`-th smallest value of the label set.
/// Without a fixed label set the classes are the distinct labels of each fit,
/// so a fold missing a label would shift the weights onto other labels.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    n_trees: usize,
    mtry: Option<usize>,
    criterion: SplitCriterion,
    max_depth: Option<usize>,
    max_leaf_nodes: Option<usize>,
    min_samples_leaf: usize,
    subsample: f64,
    class_weights: Option<Vec<f64>>,
    labels: Option<Vec<i64>>,
}

impl ForestParams {
    /// Parameters for fitting the model kept by `train`.
    #[must_use]
    pub fn training() -> Self {
        Self {
            n_trees: 200,
            mtry: None,
            criterion: SplitCriterion::Gini,
            max_depth: Some(20),
            max_leaf_nodes: None,
            min_samples_leaf: 5,
            subsample: 1.0,
            class_weights: None,
            labels: None,
        }
    }

    /// Parameters for every leave-one-out fold fit.
    #[must_use]
    pub fn validation() -> Self {
        Self {
            n_trees: 20,
            mtry: Some(2),
            criterion: SplitCriterion::Gini,
            max_depth: Some(8),
            max_leaf_nodes: Some(10),
            min_samples_leaf: 1,
            subsample: 1.0,
            class_weights: Some(vec![1.0, 100.0]),
            labels: Some(vec![0, 1]),
        }
    }

    /// Set the number of trees.
    #[must_use]
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    /// Set the predictors tried per split; `None` means floor(sqrt(p)).
    #[must_use]
    pub fn with_mtry(mut self, mtry: Option<usize>) -> Self {
        self.mtry = mtry;
        self
    }

    /// Set the split criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the maximum tree depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the leaf cap per tree.
    #[must_use]
    pub fn with_max_leaf_nodes(mut self, max_leaf_nodes: Option<usize>) -> Self {
        self.max_leaf_nodes = max_leaf_nodes;
        self
    }

    /// Set the minimum samples per leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the bootstrap fraction drawn per tree.
    #[must_use]
    pub fn with_subsample(mut self, subsample: f64) -> Self {
        self.subsample = subsample;
        self
    }

    /// Set per-class weights, indexed by ascending label value.
    #[must_use]
    pub fn with_class_weights(mut self, class_weights: Option<Vec<f64>>) -> Self {
        self.class_weights = class_weights;
        self
    }

    /// Fix the label values the classes stand for; `None` takes them from
    /// the data of each fit.
    #[must_use]
    pub fn with_labels(mut self, labels: Option<Vec<i64>>) -> Self {
        self.labels = labels.map(|mut labels| {
            labels.sort_unstable();
            labels.dedup();
            labels
        });
        self
    }

    /// Return the number of trees, which is also the number of seeds a fit takes.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Resolve `mtry` for `n_predictors` columns.
    #[must_use]
    pub fn mtry_for(&self, n_predictors: usize) -> usize {
        self.mtry
            .unwrap_or_else(|| ((n_predictors as f64).sqrt().floor() as usize).max(1))
    }
}

/// Fits [`ForestModel`]s; tree `i` is grown from seed `i` of the sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForestLearner;

/// A fitted forest plus the label values its class indices stand for.
#[derive(Debug, Clone)]
pub struct ForestModel {
    forest: RandomForest,
    classes: Vec<i64>,
}

impl ForestModel {
    /// Return the underlying forest.
    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Return the label values in class-index order.
    #[must_use]
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }
}

impl Learner for ForestLearner {
    type Params = ForestParams;
    type Model = ForestModel;

    #[instrument(skip_all, fields(n_rows = frame.n_rows(), n_trees = params.n_trees))]
    fn fit(
        &self,
        formula: &Formula,
        frame: &Frame,
        params: &ForestParams,
        seeds: &SeedSequence,
    ) -> Result<ForestModel, EvalError> {
        let labels = integral_labels(formula, frame)?;
        let features = predictor_rows(formula, frame)?;

        let classes = match &params.labels {
            Some(fixed) => fixed.clone(),
            None => {
                let mut distinct = labels.clone();
                distinct.sort_unstable();
                distinct.dedup();
                distinct
            }
        };
        let encoded = labels
            .iter()
            .map(|&value| {
                classes
                    .binary_search(&value)
                    .map_err(|_| EvalError::UnknownLabel {
                        value,
                        labels: classes.clone(),
                    })
            })
            .collect::<Result<Vec<usize>, _>>()?;

        let mtry = params.mtry_for(formula.predictors().len());
        let tree_seeds = seeds.take(params.n_trees)?.to_vec();
        debug!(?classes, mtry, "fitting forest");

        let forest = ForestConfig::new(params.n_trees)?
            .with_max_features(MaxFeatures::Fixed(mtry))
            .with_criterion(params.criterion)
            .with_max_depth(params.max_depth)
            .with_max_leaf_nodes(params.max_leaf_nodes)
            .with_min_samples_leaf(params.min_samples_leaf)
            .with_bootstrap_fraction(params.subsample)
            .with_class_weights(params.class_weights.clone())
            .with_tree_seeds(tree_seeds)
            .fit(&features, &encoded, formula.predictors())?;

        Ok(ForestModel { forest, classes })
    }
}

impl Classifier for ForestModel {
    fn predict(&self, features: &[f64]) -> Result<i64, EvalError> {
        let class = self.forest.predict(features)?;
        self.classes
            .get(class)
            .copied()
            .ok_or(EvalError::UnknownClass {
                class,
                n_classes: self.classes.len(),
            })
    }

    fn importance(&self) -> Vec<f64> {
        self.forest.feature_importances().to_vec()
    }
}
