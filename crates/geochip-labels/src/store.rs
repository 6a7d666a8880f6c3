//! Label export.

use crate::LabelAggregate;
use geochip_core::{ClassConfig, CrsTransform, Window};
use log::info;
use serde_json::{json, Map, Value};
use std::{
    fs,
    hash::Hash,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum LabelStoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Persistence backend for a [`LabelAggregate`].
pub trait LabelStore<K: Hash + Eq> {
    fn save(
        &self,
        labels: &LabelAggregate<K>,
        class_config: &ClassConfig,
        crs: &dyn CrsTransform,
    ) -> Result<(), LabelStoreError>;
}

/// How a label key appears in a GeoJSON feature.
pub trait LabelKey: Hash + Eq + Clone {
    /// GeoJSON geometry object in map coordinates, or `Value::Null`.
    fn geometry(&self, crs: &dyn CrsTransform) -> Value;

    /// Value of the feature's `id` property, if the key has one.
    fn id(&self) -> Option<String> {
        None
    }
}

impl LabelKey for Window {
    fn geometry(&self, crs: &dyn CrsTransform) -> Value {
        let [tl, tr, br, bl] = self.corners();
        let ring: Vec<[f64; 2]> = [tl, tr, br, bl, tl]
            .into_iter()
            .map(|p| {
                let m = crs.pixel_to_map(p);
                [m.x, m.y]
            })
            .collect();
        json!({ "type": "Polygon", "coordinates": [ring] })
    }
}

/// Scene-level labels carry no footprint of their own.
impl LabelKey for String {
    fn geometry(&self, _crs: &dyn CrsTransform) -> Value {
        Value::Null
    }

    fn id(&self) -> Option<String> {
        Some(self.clone())
    }
}

/// Writes labels as a GeoJSON `FeatureCollection`, one feature per key.
#[derive(Clone, Debug)]
pub struct GeoJsonLabelStore {
    path: PathBuf,
}

impl GeoJsonLabelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Feature collection for `labels`, in the aggregate's iteration order.
    pub fn to_geojson<K: LabelKey>(
        labels: &LabelAggregate<K>,
        class_config: &ClassConfig,
        crs: &dyn CrsTransform,
    ) -> Value {
        let features: Vec<Value> = labels
            .iter()
            .map(|(key, label)| {
                let mut props = Map::new();
                if let Some(id) = key.id() {
                    props.insert("id".into(), Value::String(id));
                }
                props.insert("class_id".into(), json!(label.class_id));
                props.insert(
                    "class_name".into(),
                    json!(class_config.get_name(label.class_id)),
                );
                if let Some(scores) = &label.scores {
                    props.insert("scores".into(), json!(scores));
                }
                json!({
                    "type": "Feature",
                    "geometry": key.geometry(crs),
                    "properties": props,
                })
            })
            .collect();
        json!({ "type": "FeatureCollection", "features": features })
    }
}

impl<K: LabelKey> LabelStore<K> for GeoJsonLabelStore {
    fn save(
        &self,
        labels: &LabelAggregate<K>,
        class_config: &ClassConfig,
        crs: &dyn CrsTransform,
    ) -> Result<(), LabelStoreError> {
        let doc = Self::to_geojson(labels, class_config, crs);
        fs::write(&self.path, serde_json::to_string_pretty(&doc)?)?;
        info!("wrote {} labels to {}", labels.len(), self.path.display());
        Ok(())
    }
}
