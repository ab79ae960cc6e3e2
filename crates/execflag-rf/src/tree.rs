use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    RfError,
    node::{Impurity, Node, NodeIndex},
    split::{SplitCandidate, SplitContext, SplitCriterion, weighted_counts},
};

/// Configuration for a single CART decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `criterion`         | `Gini`                |
/// | `max_depth`         | `None` (unlimited)    |
/// | `max_leaf_nodes`    | `None` (unlimited)    |
/// | `min_samples_split` | 2                     |
/// | `min_samples_leaf`  | 1                     |
/// | `max_features`      | `None` (all features) |
/// | `class_weights`     | `None` (all 1.0)      |
/// | `seed`              | 42                    |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) max_leaf_nodes: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) class_weights: Option<Vec<f64>>,
    pub(crate) seed: u64,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: SplitCriterion::Gini,
            max_depth: None,
            max_leaf_nodes: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            class_weights: None,
            seed: 42,
        }
    }

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the maximum tree depth (root is depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Cap the number of leaves.
    ///
    /// With a cap the tree grows best-first: the open leaf whose best split
    /// removes the most weighted impurity is split next.
    #[must_use]
    pub fn with_max_leaf_nodes(mut self, max_leaf_nodes: Option<usize>) -> Self {
        self.max_leaf_nodes = max_leaf_nodes;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples required in each leaf after a split.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the maximum number of features to consider at each split.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Weight each class's samples in impurity and leaf distributions.
    ///
    /// Index `c` is the weight of class `c`.
    #[must_use]
    pub fn with_class_weights(mut self, class_weights: Option<Vec<f64>>) -> Self {
        self.class_weights = class_weights;
        self
    }

    /// Set the random seed for feature sampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the leaf-count cap, if any.
    #[must_use]
    pub fn max_leaf_nodes(&self) -> Option<usize> {
        self.max_leaf_nodes
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a decision tree on a row-major dataset with labels `0..k`.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`RfError::EmptyDataset`] | `features` is empty |
    /// | [`RfError::ZeroFeatures`] | rows have zero feature columns |
    /// | [`RfError::LabelCountMismatch`] | `labels.len() != features.len()` |
    /// | [`RfError::FeatureCountMismatch`] | rows have inconsistent lengths |
    /// | [`RfError::NonFiniteValue`] | any value is NaN or infinite |
    /// | [`RfError::InvalidMaxFeatures`] | `max_features` outside [1, n_features] |
    /// | [`RfError::InvalidMaxDepth`] | `max_depth` is `Some(0)` |
    /// | [`RfError::InvalidMaxLeafNodes`] | `max_leaf_nodes` is below 2 |
    /// | [`RfError::InvalidMinSamplesSplit`] | `min_samples_split` < 2 |
    /// | [`RfError::InvalidMinSamplesLeaf`] | `min_samples_leaf` < 1 |
    /// | [`RfError::ClassWeightMismatch`] | fewer class weights than classes |
    /// | [`RfError::InvalidClassWeight`] | a class weight is not positive and finite |
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<DecisionTree, RfError> {
        let (_, n_features) = validate_dataset(features, labels)?;
        let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;
        let col_features = to_columns(features, n_features);
        self.fit_columns(&col_features, labels, n_classes)
    }

    pub(crate) fn validate(&self) -> Result<(), RfError> {
        if let Some(d) = self.max_depth
            && d == 0
        {
            return Err(RfError::InvalidMaxDepth { max_depth: 0 });
        }
        if let Some(m) = self.max_leaf_nodes
            && m < 2
        {
            return Err(RfError::InvalidMaxLeafNodes { max_leaf_nodes: m });
        }
        if self.min_samples_split < 2 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(RfError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }
        if let Some(weights) = &self.class_weights {
            for (class, &weight) in weights.iter().enumerate() {
                if !weight.is_finite() || weight <= 0.0 {
                    return Err(RfError::InvalidClassWeight { class, weight });
                }
            }
        }
        Ok(())
    }

    /// Resolve one weight per class, covering at least `n_classes` classes.
    pub(crate) fn resolve_class_weights(&self, n_classes: usize) -> Result<Vec<f64>, RfError> {
        match &self.class_weights {
            None => Ok(vec![1.0; n_classes]),
            Some(w) if w.len() < n_classes => Err(RfError::ClassWeightMismatch {
                n_weights: w.len(),
                n_classes,
            }),
            Some(w) => Ok(w.clone()),
        }
    }

    /// Fit on pre-validated column-major features.
    ///
    /// `n_classes` may exceed the labels present so every tree of a forest
    /// shares one distribution length.
    #[instrument(skip_all, fields(n_samples = labels.len(), seed = self.seed))]
    pub(crate) fn fit_columns(
        &self,
        col_features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<DecisionTree, RfError> {
        self.validate()?;
        let n_features = col_features.len();
        let max_features = self.max_features.unwrap_or(n_features);
        if max_features == 0 || max_features > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features,
                n_features,
            });
        }
        let class_weights = self.resolve_class_weights(n_classes)?;

        let ctx = SplitContext {
            features: col_features,
            labels,
            class_weights: &class_weights,
            criterion: self.criterion,
            max_features,
            min_samples_leaf: self.min_samples_leaf,
        };
        let mut grower = Grower {
            config: self,
            ctx,
            rng: ChaCha8Rng::seed_from_u64(self.seed),
            arena: Vec::new(),
            open: BinaryHeap::new(),
        };
        let nodes = grower.grow((0..labels.len()).collect());

        debug!(n_nodes = nodes.len(), "decision tree built");
        Ok(DecisionTree {
            nodes,
            n_features,
            n_classes: class_weights.len(),
        })
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Check the dataset shape and values, returning `(n_samples, n_features)`.
pub(crate) fn validate_dataset(
    features: &[Vec<f64>],
    labels: &[usize],
) -> Result<(usize, usize), RfError> {
    let Some(first) = features.first() else {
        return Err(RfError::EmptyDataset);
    };
    let n_samples = features.len();
    let n_features = first.len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }
    if labels.len() != n_samples {
        return Err(RfError::LabelCountMismatch {
            n_samples,
            n_labels: labels.len(),
        });
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok((n_samples, n_features))
}

/// Transpose row-major samples into one `Vec` per feature.
pub(crate) fn to_columns(features: &[Vec<f64>], n_features: usize) -> Vec<Vec<f64>> {
    (0..n_features)
        .map(|f| features.iter().map(|row| row[f]).collect())
        .collect()
}

/// A leaf waiting to be split, ordered by impurity decrease.
struct OpenLeaf {
    node: usize,
    depth: usize,
    split: SplitCandidate,
}

impl PartialEq for OpenLeaf {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenLeaf {}

impl PartialOrd for OpenLeaf {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenLeaf {
    // Max-heap on decrease; ties go to the node created first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.split
            .impurity_decrease
            .total_cmp(&other.split.impurity_decrease)
            .then_with(|| other.node.cmp(&self.node))
    }
}

struct Grower<'a> {
    config: &'a DecisionTreeConfig,
    ctx: SplitContext<'a>,
    rng: ChaCha8Rng,
    arena: Vec<Node>,
    open: BinaryHeap<OpenLeaf>,
}

impl Grower<'_> {
    fn grow(&mut self, root_samples: Vec<usize>) -> Vec<Node> {
        let root = self.push_leaf(&root_samples);
        self.open_leaf(root, 0, &root_samples);
        let mut n_leaves = 1usize;

        while let Some(OpenLeaf { node, depth, split }) = self.open.pop() {
            if self.config.max_leaf_nodes.is_some_and(|m| n_leaves >= m) {
                break;
            }
            let left = self.push_leaf(&split.left_indices);
            let right = self.push_leaf(&split.right_indices);
            let impurity = self.arena[node].impurity();
            let n_samples = self.arena[node].n_samples();
            self.arena[node] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: NodeIndex::new(left),
                right: NodeIndex::new(right),
                impurity,
                n_samples,
                impurity_decrease: split.impurity_decrease,
            };
            n_leaves += 1;
            self.open_leaf(left, depth + 1, &split.left_indices);
            self.open_leaf(right, depth + 1, &split.right_indices);
        }

        std::mem::take(&mut self.arena)
    }

    fn push_leaf(&mut self, samples: &[usize]) -> usize {
        let counts = weighted_counts(self.ctx.labels, samples, self.ctx.class_weights);
        let total: f64 = counts.iter().sum();
        let distribution: Vec<f64> = if total > 0.0 {
            counts.iter().map(|&c| c / total).collect()
        } else {
            vec![0.0; counts.len()]
        };
        let mut prediction = 0usize;
        for (class, &c) in counts.iter().enumerate() {
            if c > counts[prediction] {
                prediction = class;
            }
        }
        self.arena.push(Node::Leaf {
            prediction,
            distribution,
            impurity: self.ctx.criterion.impurity(&counts),
            n_samples: samples.len(),
        });
        self.arena.len() - 1
    }

    /// Queue `node` for splitting unless a stopping rule makes it final.
    fn open_leaf(&mut self, node: usize, depth: usize, samples: &[usize]) {
        let depth_exceeded = self.config.max_depth.is_some_and(|d| depth >= d);
        let too_few = samples.len() < self.config.min_samples_split;
        let impurity: Impurity = self.arena[node].impurity();
        if depth_exceeded || too_few || impurity.value() == 0.0 {
            return;
        }
        let counts = weighted_counts(self.ctx.labels, samples, self.ctx.class_weights);
        if let Some(split) = self.ctx.find_best_split(samples, &counts, &mut self.rng) {
            self.open.push(OpenLeaf { node, depth, split });
        }
    }
}

/// A fitted CART decision tree stored as a `Vec<Node>` arena.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Predict the class label for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        match self.leaf(sample)? {
            Node::Leaf { prediction, .. } => Ok(*prediction),
            Node::Split { .. } => unreachable!("traverse always ends at a leaf"),
        }
    }

    /// Return the leaf class distribution for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<&[f64], RfError> {
        match self.leaf(sample)? {
            Node::Leaf { distribution, .. } => Ok(distribution),
            Node::Split { .. } => unreachable!("traverse always ends at a leaf"),
        }
    }

    /// Mean Decrease in Impurity per feature, normalized to sum to 1.
    ///
    /// All zeros when the tree is a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                totals[feature.index()] += impurity_decrease.max(0.0);
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the total number of nodes (splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the number of classes in the leaf distributions.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the maximum depth; a single root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut queue = VecDeque::from([(0usize, 0usize)]);
        while let Some((idx, d)) = queue.pop_front() {
            match &self.nodes[idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    queue.push_back((left.index(), d + 1));
                    queue.push_back((right.index(), d + 1));
                }
            }
        }
        max_depth
    }

    fn leaf(&self, sample: &[f64]) -> Result<&Node, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                node @ Node::Leaf { .. } => return Ok(node),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[feature.index()] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }
}
