use crate::{Geometry, GeometryKind, Window};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One row of a [`GeometryTable`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelFeature {
    pub geometry: Geometry,
    /// `None` when the row carries no class id attribute.
    #[serde(default)]
    pub class_id: Option<u32>,
    /// Any other attributes, kept as-is.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl LabelFeature {
    pub fn new(geometry: impl Into<Geometry>, class_id: u32) -> Self {
        Self {
            geometry: geometry.into(),
            class_id: Some(class_id),
            properties: BTreeMap::new(),
        }
    }

    /// Row without a class id.
    pub fn unlabeled(geometry: impl Into<Geometry>) -> Self {
        Self {
            geometry: geometry.into(),
            class_id: None,
            properties: BTreeMap::new(),
        }
    }
}

/// Ordered collection of labeled geometries.
///
/// Row order is meaningful: rasterization burns rows in this order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeometryTable {
    features: Vec<LabelFeature>,
}

impl GeometryTable {
    pub fn new(features: Vec<LabelFeature>) -> Self {
        Self { features }
    }

    pub fn push(&mut self, feature: LabelFeature) {
        self.features.push(feature);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[LabelFeature] {
        &self.features
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabelFeature> {
        self.features.iter()
    }

    /// Distinct geometry kinds present in the table.
    pub fn kinds(&self) -> BTreeSet<GeometryKind> {
        self.features.iter().map(|f| f.geometry.kind()).collect()
    }

    /// Rows intersecting `window`, in table order.
    pub fn intersecting<'a>(
        &'a self,
        window: &'a Window,
    ) -> impl Iterator<Item = &'a LabelFeature> + 'a {
        self.features
            .iter()
            .filter(move |f| f.geometry.intersects_window(window))
    }

    /// Same table with every geometry passed through `f`.
    pub fn map_geometries(&self, f: impl Fn(&Geometry) -> Geometry) -> Self {
        Self {
            features: self
                .features
                .iter()
                .map(|feat| LabelFeature {
                    geometry: f(&feat.geometry),
                    class_id: feat.class_id,
                    properties: feat.properties.clone(),
                })
                .collect(),
        }
    }
}

impl FromIterator<LabelFeature> for GeometryTable {
    fn from_iter<I: IntoIterator<Item = LabelFeature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a GeometryTable {
    type Item = &'a LabelFeature;
    type IntoIter = std::slice::Iter<'a, LabelFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
