//! Train / test / leave-one-out evaluation over pluggable classifiers.
//!
//! [`Harness`] loads CSV files through a [`Formula`](execflag_frame::Formula),
//! applies [`RowFilter`]s, and drives any [`Learner`]. [`ForestLearner`]
//! is the default learner, backed by `execflag-rf`. All randomness comes
//! from a [`SeedSequence`], so repeated evaluations are identical.

mod error;
mod filter;
mod forest;
mod harness;
mod learner;
mod metrics;
mod observation;
mod result;
mod seeds;

pub use error::EvalError;
pub use filter::RowFilter;
pub use forest::{ForestLearner, ForestModel, ForestParams};
pub use harness::{Harness, HarnessConfig};
pub use learner::{Classifier, Learner, integral_labels};
pub use metrics::{ClassMetrics, ConfusionMatrix};
pub use observation::Observation;
pub use result::{EvaluationResult, FeatureImportance, Prediction, TrainingSummary};
pub use seeds::SeedSequence;
