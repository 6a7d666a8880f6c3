use crate::{ClassificationLabel, LabelKey, LabelStore, LabelStoreError};
use geochip_core::{ClassConfig, CrsTransform, Window};
use indexmap::IndexMap;
use std::hash::Hash;
use std::ops::Index;

/// Errors raised while ingesting model predictions.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum LabelError {
    #[error("got {keys} keys but {predictions} predictions")]
    CountMismatch { keys: usize, predictions: usize },

    #[error("prediction {index} has an empty score vector")]
    EmptyScores { index: usize },

    #[error("prediction {index} contains a NaN score")]
    NanScore { index: usize },
}

/// One label per key, kept in insertion order.
///
/// Writing to a key that already has a label replaces it in place; the key
/// keeps its original position. All queries iterate in that order.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelAggregate<K: Hash + Eq> {
    labels: IndexMap<K, ClassificationLabel>,
}

/// Labels keyed by scene id.
pub type SceneLabels = LabelAggregate<String>;

/// Labels keyed by pixel window.
pub type WindowLabels = LabelAggregate<Window>;

impl<K: Hash + Eq> Default for LabelAggregate<K> {
    fn default() -> Self {
        Self {
            labels: IndexMap::new(),
        }
    }
}

impl<K: Hash + Eq + Clone> LabelAggregate<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `class_id` (and `scores`) for `key`, replacing any earlier label.
    pub fn set(&mut self, key: K, class_id: u32, scores: Option<Vec<f64>>) {
        self.insert(key, ClassificationLabel::new(class_id, scores));
    }

    /// Store a label, returning the one it replaced.
    pub fn insert(&mut self, key: K, label: ClassificationLabel) -> Option<ClassificationLabel> {
        self.labels.insert(key, label)
    }

    /// Build labels from per-class score vectors, one per key.
    ///
    /// The class id is the index of the highest score (the first one on
    /// ties); the full score vector is kept alongside it.
    pub fn from_predictions<P, S>(
        keys: impl IntoIterator<Item = K>,
        predictions: impl IntoIterator<Item = P>,
    ) -> Result<Self, LabelError>
    where
        P: AsRef<[S]>,
        S: Copy + Into<f64>,
    {
        let keys: Vec<K> = keys.into_iter().collect();
        let predictions: Vec<P> = predictions.into_iter().collect();
        if keys.len() != predictions.len() {
            return Err(LabelError::CountMismatch {
                keys: keys.len(),
                predictions: predictions.len(),
            });
        }

        let mut out = Self::new();
        for (index, (key, p)) in keys.into_iter().zip(predictions).enumerate() {
            let scores: Vec<f64> = p.as_ref().iter().map(|&s| s.into()).collect();
            let class_id = argmax(&scores, index)?;
            out.set(key, class_id, Some(scores));
        }
        Ok(out)
    }

    /// Union of both aggregates; on a shared key `other`'s label wins.
    pub fn merge(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.extend(other.clone());
        out
    }

    /// Left fold of [`LabelAggregate::merge`] in iteration order.
    ///
    /// Worker outputs are combined strictly sequentially, so when two parts
    /// label the same key the later part wins.
    pub fn merge_all(parts: impl IntoIterator<Item = Self>) -> Self {
        parts.into_iter().fold(Self::new(), |mut acc, part| {
            acc.extend(part);
            acc
        })
    }

    /// Aggregate holding only `key`'s label, if any.
    pub fn singleton(&self, key: &K) -> Self {
        let mut out = Self::new();
        if let Some(label) = self.labels.get(key) {
            out.insert(key.clone(), label.clone());
        }
        out
    }

    pub fn save<S: LabelStore<K> + ?Sized>(
        &self,
        store: &S,
        class_config: &ClassConfig,
        crs: &dyn CrsTransform,
    ) -> Result<(), LabelStoreError>
    where
        K: LabelKey,
    {
        store.save(self, class_config, crs)
    }
}

impl<K: Hash + Eq> LabelAggregate<K> {
    pub fn get(&self, key: &K) -> Option<&ClassificationLabel> {
        self.labels.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.labels.contains_key(key)
    }

    pub fn class_id(&self, key: &K) -> Option<u32> {
        self.get(key).map(|l| l.class_id)
    }

    pub fn scores(&self, key: &K) -> Option<&[f64]> {
        self.get(key).and_then(|l| l.scores.as_deref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.labels.keys()
    }

    pub fn class_ids(&self) -> Vec<u32> {
        self.labels.values().map(|l| l.class_id).collect()
    }

    pub fn scores_all(&self) -> Vec<Option<&[f64]>> {
        self.labels.values().map(|l| l.scores.as_deref()).collect()
    }

    pub fn labels(&self) -> impl Iterator<Item = &ClassificationLabel> {
        self.labels.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, K, ClassificationLabel> {
        self.labels.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn argmax(scores: &[f64], index: usize) -> Result<u32, LabelError> {
    if scores.is_empty() {
        return Err(LabelError::EmptyScores { index });
    }
    if scores.iter().any(|s| s.is_nan()) {
        return Err(LabelError::NanScore { index });
    }
    let mut best = 0;
    for (i, &s) in scores.iter().enumerate().skip(1) {
        if s > scores[best] {
            best = i;
        }
    }
    Ok(best as u32)
}

/// Panics when `key` has no label; use [`LabelAggregate::get`] otherwise.
impl<K: Hash + Eq> Index<&K> for LabelAggregate<K> {
    type Output = ClassificationLabel;

    fn index(&self, key: &K) -> &ClassificationLabel {
        match self.labels.get(key) {
            Some(label) => label,
            None => panic!("no label stored for the requested key"),
        }
    }
}

impl<K: Hash + Eq> Extend<(K, ClassificationLabel)> for LabelAggregate<K> {
    fn extend<I: IntoIterator<Item = (K, ClassificationLabel)>>(&mut self, iter: I) {
        for (key, label) in iter {
            self.labels.insert(key, label);
        }
    }
}

impl<K: Hash + Eq> FromIterator<(K, ClassificationLabel)> for LabelAggregate<K> {
    fn from_iter<I: IntoIterator<Item = (K, ClassificationLabel)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

impl<K: Hash + Eq> IntoIterator for LabelAggregate<K> {
    type Item = (K, ClassificationLabel);
    type IntoIter = indexmap::map::IntoIter<K, ClassificationLabel>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.into_iter()
    }
}

impl<'a, K: Hash + Eq> IntoIterator for &'a LabelAggregate<K> {
    type Item = (&'a K, &'a ClassificationLabel);
    type IntoIter = indexmap::map::Iter<'a, K, ClassificationLabel>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter()
    }
}
