/// Errors from Random Forest configuration, training, and prediction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RfError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when max_leaf_nodes is below 2.
    #[error("max_leaf_nodes must be at least 2, got {max_leaf_nodes}")]
    InvalidMaxLeafNodes {
        /// The invalid max_leaf_nodes value provided.
        max_leaf_nodes: usize,
    },

    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when min_samples_leaf is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The invalid min_samples_leaf value provided.
        min_samples_leaf: usize,
    },

    /// Returned when max_features resolves to 0 or exceeds n_features.
    #[error("max_features resolved to {max_features}, but must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved max_features value.
        max_features: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when bootstrap_fraction is not in (0.0, 1.0].
    #[error("bootstrap_fraction must be in (0.0, 1.0], got {fraction}")]
    InvalidBootstrapFraction {
        /// The invalid bootstrap_fraction value provided.
        fraction: f64,
    },

    /// Returned when a class weight is not a positive finite number.
    #[error("class weight for class {class} must be positive and finite, got {weight}")]
    InvalidClassWeight {
        /// The class whose weight is invalid.
        class: usize,
        /// The rejected weight.
        weight: f64,
    },

    /// Returned when fewer class weights than classes are supplied.
    #[error("{n_weights} class weights supplied for {n_classes} classes")]
    ClassWeightMismatch {
        /// Number of class weights supplied.
        n_weights: usize,
        /// Number of classes in the labels.
        n_classes: usize,
    },

    /// Returned when an explicit seed list is shorter than the ensemble.
    #[error("{n_trees} trees need {n_trees} seeds, only {available} supplied")]
    InsufficientSeeds {
        /// Number of trees requested.
        n_trees: usize,
        /// Number of seeds supplied.
        available: usize,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when the number of labels differs from the number of samples.
    #[error("{n_labels} labels supplied for {n_samples} samples")]
    LabelCountMismatch {
        /// Number of feature rows.
        n_samples: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when the feature names do not match the feature columns.
    #[error("{n_names} feature names supplied for {n_features} features")]
    FeatureNameMismatch {
        /// Number of names supplied.
        n_names: usize,
        /// Number of feature columns.
        n_features: usize,
    },

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },
}
