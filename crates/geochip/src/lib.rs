//! High-level facade crate for the `geochip-*` workspace.
//!
//! ## Quickstart
//!
//! ```
//! use geochip::core::{ClassConfig, GeometryTable, InMemoryVectorSource, LabelFeature, Polygon, Window};
//! use geochip::rasterize::{RasterizedSource, RasterizerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = GeometryTable::new(vec![LabelFeature::new(Polygon::rect(0.0, 0.0, 4.0, 8.0), 1)]);
//! let extent = Window::new(0, 0, 8, 8)?;
//! let gt = RasterizedSource::new(&InMemoryVectorSource::new(table), RasterizerConfig::default(), extent)?;
//!
//! // a perfect prediction
//! let windows = extent.sliding_windows(4, 4)?;
//! let classes = ClassConfig::new(["background", "building"]);
//! let eval = geochip::evaluate_windows(&gt, &gt, &windows, &classes, None)?;
//! assert_eq!(eval.item(1).map(|i| i.true_pos()), Some(32));
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `geochip::core`: windows, chips, `RasterSource`, geometry tables, CRS transforms.
//! - `geochip::rasterize`: on-demand rasterization of polygon labels.
//! - `geochip::labels`: `LabelAggregate` and label stores.
//! - `geochip::eval`: `ConfusionMatrix`, `ConfusionAccumulator`, `Evaluation`.

pub use geochip_core as core;
pub use geochip_eval as eval;
pub use geochip_labels as labels;
pub use geochip_rasterize as rasterize;

pub use geochip_core::{Chip, RasterSource, Window};
pub use geochip_eval::{ConfusionAccumulator, Evaluation, Metric};
pub use geochip_labels::{LabelAggregate, SceneLabels, WindowLabels};
pub use geochip_rasterize::{RasterizedSource, RasterizerConfig};

mod evaluate;

pub use evaluate::evaluate_windows;
#[cfg(feature = "rayon")]
pub use evaluate::par_evaluate_windows;
