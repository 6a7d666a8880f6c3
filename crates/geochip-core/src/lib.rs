//! Core types for windowed geospatial raster access.
//!
//! Everything here is pixel-space and storage-agnostic: windows, chips, the
//! [`RasterSource`] contract with its transformer chain, labeled geometry
//! tables, and the opaque pixel ↔ map [`CrsTransform`].

mod chip;
mod class_config;
mod crs;
mod error;
mod geometry;
mod logger;
mod raster_source;
mod table;
mod transformers;
mod vector_source;
mod window;

pub use chip::{Chip, DataType, Pixel};
pub use class_config::ClassConfig;
pub use crs::{AffineTransform, CrsTransform, IdentityTransform};
pub use error::{ConfigError, RasterError};
pub use geometry::{Bounds, Geometry, GeometryKind, Polygon, Ring};
pub use raster_source::{ArraySource, RasterSource, RasterTransformer};
pub use table::{GeometryTable, LabelFeature};
pub use transformers::{NanTransformer, NodataTransformer, ReclassTransformer};
pub use vector_source::{InMemoryVectorSource, VectorSource, VectorSourceError};
pub use window::{Window, WindowError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_level, level_from_env, LOG_ENV};
