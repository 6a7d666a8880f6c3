//! Label rasters synthesized from vector geometries.
//!
//! [`RasterizedSource`] turns a polygon label table into a single-band `u8`
//! [`RasterSource`](geochip_core::RasterSource): each `get_chip` call burns
//! the geometries intersecting the requested window, later rows winning
//! where they overlap. [`rasterize`] is the underlying scan converter.
//!
//! ```
//! use geochip_core::{GeometryTable, InMemoryVectorSource, LabelFeature, Polygon, RasterSource, Window};
//! use geochip_rasterize::{RasterizedSource, RasterizerConfig};
//!
//! let table = GeometryTable::new(vec![LabelFeature::new(Polygon::rect(0.0, 0.0, 4.0, 4.0), 1)]);
//! let vs = InMemoryVectorSource::new(table);
//! let extent = Window::new(0, 0, 8, 8).unwrap();
//! let src = RasterizedSource::new(&vs, RasterizerConfig::default(), extent).unwrap();
//!
//! let chip = src.get_chip(&Window::new(0, 0, 4, 4).unwrap()).unwrap();
//! assert_eq!(chip.shape(), (4, 4, 1));
//! assert_eq!(chip.count_eq(1), 16);
//! ```

mod burn;
mod source;

pub use burn::rasterize;
pub use source::{RasterizeError, RasterizedSource, RasterizerConfig};
