use crate::{ConfusionAccumulator, ConfusionMatrix, EvalError, Metric};
use geochip_core::ClassConfig;
use log::warn;
use serde::Serialize;
use serde_json::{json, Value};
use std::{fs, path::Path};

/// Ground-truth-weighted mean of per-class metrics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub recall: Metric,
    pub precision: Metric,
    pub f1: Metric,
}

/// The `"average"` entry of an evaluation report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AverageRecord {
    pub class_name: String,
    pub gt_count: u64,
    pub metrics: AverageMetrics,
}

/// Per-class evaluation over a multiclass confusion matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    class_config: ClassConfig,
    matrix: ConfusionMatrix,
    items: Vec<ConfusionAccumulator>,
}

impl Evaluation {
    /// Empty evaluation: every class with zero counts.
    pub fn new(class_config: ClassConfig) -> Self {
        let matrix = ConfusionMatrix::new(class_config.len());
        let items = class_items(&matrix, &class_config);
        Self {
            class_config,
            matrix,
            items,
        }
    }

    pub fn from_confusion_matrix(
        matrix: ConfusionMatrix,
        class_config: ClassConfig,
    ) -> Result<Self, EvalError> {
        if matrix.num_classes() != class_config.len() {
            return Err(EvalError::ClassCountMismatch {
                left: matrix.num_classes(),
                right: class_config.len(),
            });
        }
        let items = class_items(&matrix, &class_config);
        for item in &items {
            if item.gt_count() == 0 {
                warn!(
                    "class `{}` has no ground-truth pixels; recall is undefined",
                    item.class_name()
                );
            }
        }
        Ok(Self {
            class_config,
            matrix,
            items,
        })
    }

    /// Add `other`'s counts; both must cover the same classes.
    pub fn merge(&mut self, other: &Evaluation) -> Result<(), EvalError> {
        if self.class_config.names != other.class_config.names {
            return Err(EvalError::ClassCountMismatch {
                left: self.class_config.len(),
                right: other.class_config.len(),
            });
        }
        self.matrix.merge(&other.matrix)?;
        for (mine, theirs) in self.items.iter_mut().zip(&other.items) {
            mine.merge(theirs)?;
        }
        Ok(())
    }

    pub fn class_config(&self) -> &ClassConfig {
        &self.class_config
    }

    pub fn matrix(&self) -> &ConfusionMatrix {
        &self.matrix
    }

    pub fn items(&self) -> &[ConfusionAccumulator] {
        &self.items
    }

    pub fn item(&self, class_id: u32) -> Option<&ConfusionAccumulator> {
        self.items.get(class_id as usize)
    }

    /// Mean recall, precision and F1 weighted by each class's ground-truth count.
    ///
    /// The null class is left out, as are classes whose metric is undefined.
    pub fn average(&self) -> AverageRecord {
        let null = self.class_config.null_class_id();
        let counted: Vec<&ConfusionAccumulator> = self
            .items
            .iter()
            .filter(|i| Some(i.class_id()) != null)
            .collect();
        let weighted = |metric: fn(&ConfusionAccumulator) -> Metric| {
            let (sum, weight) = counted.iter().fold((0.0, 0.0), |(s, w), item| {
                match metric(item).value() {
                    Some(v) => {
                        let g = item.gt_count() as f64;
                        (s + v * g, w + g)
                    }
                    None => (s, w),
                }
            });
            Metric::ratio(sum, weight)
        };
        AverageRecord {
            class_name: "average".to_string(),
            gt_count: counted.iter().map(|i| i.gt_count()).sum(),
            metrics: AverageMetrics {
                recall: weighted(ConfusionAccumulator::recall),
                precision: weighted(ConfusionAccumulator::precision),
                f1: weighted(ConfusionAccumulator::f1),
            },
        }
    }

    /// `{"overall": [per-class records..., average], "conf_mat": [[...]]}`.
    pub fn to_json(&self) -> Result<Value, EvalError> {
        let mut overall: Vec<Value> = self.items.iter().map(|i| i.to_json()).collect();
        overall.push(serde_json::to_value(self.average())?);
        Ok(json!({
            "overall": overall,
            "conf_mat": self.matrix.to_rows(),
        }))
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), EvalError> {
        let json = serde_json::to_string_pretty(&self.to_json()?)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn class_items(matrix: &ConfusionMatrix, class_config: &ClassConfig) -> Vec<ConfusionAccumulator> {
    class_config
        .names
        .iter()
        .enumerate()
        .filter_map(|(id, name)| {
            ConfusionAccumulator::from_multiclass(matrix, id as u32, name.as_str()).ok()
        })
        .collect()
}
