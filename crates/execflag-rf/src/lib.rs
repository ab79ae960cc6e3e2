//! Seeded Random Forest classification: train, predict, rank features.
//!
//! Provides a CART-based Random Forest with Gini/Entropy split criteria,
//! per-class weights, depth and leaf-count limits, explicit per-tree seed
//! lists for reproducible ensembles, and parallel training via rayon.

mod config;
mod error;
mod forest;
mod importance;
mod node;
mod split;
mod tree;

pub use config::{ForestConfig, MaxFeatures};
pub use error::RfError;
pub use forest::{ClassDistribution, RandomForest};
pub use importance::{RankedFeature, rank_features};
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use split::SplitCriterion;
pub use tree::{DecisionTree, DecisionTreeConfig};
