use crate::{ConfusionMatrix, EvalError, Metric};
use serde_json::{json, Map, Value};

/// Binary confusion counts `[[TN, FP], [FN, TP]]` for one class.
///
/// TN is `None` when it cannot be known, e.g. when only this class's slice of
/// a larger evaluation was observed. Metrics that need it are then
/// [`Metric::Undefined`].
#[derive(Clone, Debug, PartialEq)]
pub struct ConfusionAccumulator {
    class_id: u32,
    class_name: String,
    true_pos: u64,
    false_pos: u64,
    false_neg: u64,
    true_neg: Option<u64>,
    extra: Map<String, Value>,
}

impl ConfusionAccumulator {
    pub fn new(
        class_id: u32,
        class_name: impl Into<String>,
        true_pos: u64,
        false_pos: u64,
        false_neg: u64,
        true_neg: Option<u64>,
    ) -> Self {
        Self {
            class_id,
            class_name: class_name.into(),
            true_pos,
            false_pos,
            false_neg,
            true_neg,
            extra: Map::new(),
        }
    }

    /// Attach a bookkeeping field reported verbatim by [`Self::to_json`].
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// One class's view of a full multiclass matrix; TN is always known here.
    pub fn from_multiclass(
        matrix: &ConfusionMatrix,
        class_id: u32,
        class_name: impl Into<String>,
    ) -> Result<Self, EvalError> {
        let c = class_id as usize;
        if c >= matrix.num_classes() {
            return Err(EvalError::ClassOutOfRange {
                class_id,
                num_classes: matrix.num_classes(),
            });
        }
        let tp = matrix.get(c, c);
        let fp = matrix.col_sum(c) - tp;
        let fn_ = matrix.row_sum(c) - tp;
        let tn = matrix.total() - tp - fp - fn_;
        Ok(Self::new(class_id, class_name, tp, fp, fn_, Some(tn)))
    }

    /// Add `other`'s counts. If either side has unknown TN the result does too.
    pub fn merge(&mut self, other: &ConfusionAccumulator) -> Result<(), EvalError> {
        self.check_class(other)?;
        self.true_neg = match (self.true_neg, other.true_neg) {
            (Some(a), Some(b)) => Some(a + b),
            _ => None,
        };
        self.add_counts(other);
        Ok(())
    }

    /// Like [`Self::merge`], but refuses to mix a known TN with an unknown one.
    pub fn merge_strict(&mut self, other: &ConfusionAccumulator) -> Result<(), EvalError> {
        self.check_class(other)?;
        if self.true_neg.is_some() != other.true_neg.is_some() {
            return Err(EvalError::TrueNegativeMismatch {
                class_id: self.class_id,
            });
        }
        self.merge(other)
    }

    fn check_class(&self, other: &ConfusionAccumulator) -> Result<(), EvalError> {
        if self.class_id != other.class_id {
            return Err(EvalError::ClassMismatch {
                left: self.class_id,
                right: other.class_id,
            });
        }
        Ok(())
    }

    fn add_counts(&mut self, other: &ConfusionAccumulator) {
        self.true_pos += other.true_pos;
        self.false_pos += other.false_pos;
        self.false_neg += other.false_neg;
    }

    #[inline]
    pub fn class_id(&self) -> u32 {
        self.class_id
    }

    #[inline]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    #[inline]
    pub fn true_pos(&self) -> u64 {
        self.true_pos
    }

    #[inline]
    pub fn false_pos(&self) -> u64 {
        self.false_pos
    }

    #[inline]
    pub fn false_neg(&self) -> u64 {
        self.false_neg
    }

    #[inline]
    pub fn true_neg(&self) -> Option<u64> {
        self.true_neg
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// `[[TN, FP], [FN, TP]]`, available only when TN is known.
    pub fn conf_mat(&self) -> Option<[[u64; 2]; 2]> {
        let tn = self.true_neg?;
        Some([[tn, self.false_pos], [self.false_neg, self.true_pos]])
    }

    pub fn gt_count(&self) -> u64 {
        self.true_pos + self.false_neg
    }

    pub fn pred_count(&self) -> u64 {
        self.true_pos + self.false_pos
    }

    pub fn count_error(&self) -> u64 {
        self.gt_count().abs_diff(self.pred_count())
    }

    /// Sum of all four cells; `None` when TN is unknown.
    pub fn total(&self) -> Option<u64> {
        self.true_neg.map(|tn| tn + self.gt_count() + self.false_pos)
    }

    pub fn recall(&self) -> Metric {
        Metric::ratio(self.true_pos as f64, self.gt_count() as f64)
    }

    pub fn sensitivity(&self) -> Metric {
        self.recall()
    }

    pub fn precision(&self) -> Metric {
        Metric::ratio(self.true_pos as f64, self.pred_count() as f64)
    }

    pub fn f1(&self) -> Metric {
        match (self.precision(), self.recall()) {
            (Metric::Defined(p), Metric::Defined(r)) => Metric::ratio(2.0 * p * r, p + r),
            _ => Metric::Undefined,
        }
    }

    pub fn specificity(&self) -> Metric {
        match self.true_neg {
            Some(tn) => Metric::ratio(tn as f64, (tn + self.false_pos) as f64),
            None => Metric::Undefined,
        }
    }

    /// Share of all counted pixels that belong to this class.
    pub fn relative_frequency(&self) -> Metric {
        match self.total() {
            Some(total) => Metric::ratio(self.gt_count() as f64, total as f64),
            None => Metric::Undefined,
        }
    }

    /// Flat result record.
    ///
    /// With TN known the record carries `relative_frequency` and `conf_mat`;
    /// otherwise it carries raw `true_pos`, `false_pos` and `false_neg`.
    /// Extra fields are merged in last and win on key collisions.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("class_id".into(), json!(self.class_id));
        out.insert("class_name".into(), json!(self.class_name));
        out.insert("gt_count".into(), json!(self.gt_count()));
        out.insert("pred_count".into(), json!(self.pred_count()));
        out.insert("count_error".into(), json!(self.count_error()));
        out.insert(
            "metrics".into(),
            json!({
                "recall": self.recall(),
                "precision": self.precision(),
                "f1": self.f1(),
                "sensitivity": self.sensitivity(),
                "specificity": self.specificity(),
            }),
        );
        match self.conf_mat() {
            Some(cm) => {
                out.insert(
                    "relative_frequency".into(),
                    json!(self.relative_frequency()),
                );
                out.insert("conf_mat".into(), json!(cm));
            }
            None => {
                out.insert("true_pos".into(), json!(self.true_pos));
                out.insert("false_pos".into(), json!(self.false_pos));
                out.insert("false_neg".into(), json!(self.false_neg));
            }
        }
        for (k, v) in &self.extra {
            out.insert(k.clone(), v.clone());
        }
        Value::Object(out)
    }
}
