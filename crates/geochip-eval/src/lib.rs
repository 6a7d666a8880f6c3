//! Confusion-matrix evaluation with mergeable state.
//!
//! Workers build partial [`ConfusionMatrix`] / [`ConfusionAccumulator`] /
//! [`Evaluation`] values independently; merging is an elementwise sum, so
//! partial results can be combined in any order.

mod accumulator;
mod error;
mod evaluation;
mod matrix;
mod metric;

pub use accumulator::ConfusionAccumulator;
pub use error::EvalError;
pub use evaluation::{AverageMetrics, AverageRecord, Evaluation};
pub use matrix::ConfusionMatrix;
pub use metric::Metric;
