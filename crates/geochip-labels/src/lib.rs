//! Per-entity classification labels.
//!
//! A [`LabelAggregate`] maps an entity key (a scene id or a pixel
//! [`Window`](geochip_core::Window)) to exactly one [`ClassificationLabel`].
//! Aggregates produced by parallel workers are combined with
//! [`LabelAggregate::merge`] / [`LabelAggregate::merge_all`] and exported
//! through a [`LabelStore`].

mod aggregate;
mod label;
mod store;

pub use aggregate::{LabelAggregate, LabelError, SceneLabels, WindowLabels};
pub use label::ClassificationLabel;
pub use store::{GeoJsonLabelStore, LabelKey, LabelStore, LabelStoreError};
