//! Columnar numeric frames for the execflag pipeline.
//!
//! Provides a dense row-major [`Frame`] with named columns, the
//! [`Formula`] schema mapping (label + predictors), and pure transforms
//! that always return a freshly owned frame: normalization, row-aligned
//! merge, contiguous split, vertical stacking and predicate filtering.

mod error;
mod formula;
mod frame;
pub mod transform;

pub use error::FrameError;
pub use formula::Formula;
pub use frame::{ColumnKey, Frame, Rows};
pub use transform::{filter, merge, merge_normalized, normalize, split, stack};
