use serde::{Serialize, Serializer};
use std::fmt;

/// Value of a derived metric.
///
/// A ratio with a zero denominator (no ground truth, no predictions, unknown
/// true negatives) is `Undefined` rather than NaN or an error, and
/// serializes as the string `"undefined"`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Metric {
    Defined(f64),
    Undefined,
}

impl Metric {
    pub fn ratio(num: f64, den: f64) -> Self {
        if den == 0.0 {
            Metric::Undefined
        } else {
            Metric::Defined(num / den)
        }
    }

    #[inline]
    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Defined(v) => Some(v),
            Metric::Undefined => None,
        }
    }

    #[inline]
    pub fn is_defined(self) -> bool {
        matches!(self, Metric::Defined(_))
    }
}

impl From<Option<f64>> for Metric {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Metric::Undefined, Metric::Defined)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Defined(v) => write!(f, "{v:.4}"),
            Metric::Undefined => f.write_str("undefined"),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Defined(v) => serializer.serialize_f64(*v),
            Metric::Undefined => serializer.serialize_str("undefined"),
        }
    }
}
