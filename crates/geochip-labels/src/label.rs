use serde::{Deserialize, Serialize};

/// Class id plus the optional per-class score vector it was derived from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationLabel {
    pub class_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<f64>>,
}

impl ClassificationLabel {
    pub fn new(class_id: u32, scores: Option<Vec<f64>>) -> Self {
        Self { class_id, scores }
    }

    /// `(class_id, scores)` for positional destructuring.
    pub fn as_tuple(&self) -> (u32, Option<&[f64]>) {
        (self.class_id, self.scores.as_deref())
    }
}

impl From<u32> for ClassificationLabel {
    fn from(class_id: u32) -> Self {
        Self::new(class_id, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destructures_positionally() {
        let label = ClassificationLabel::new(2, Some(vec![0.1, 0.2, 0.7]));
        let (class_id, scores) = label.as_tuple();
        assert_eq!(class_id, 2);
        assert_eq!(scores, Some(&[0.1, 0.2, 0.7][..]));
    }

    #[test]
    fn scores_are_omitted_when_absent() {
        let json = serde_json::to_value(ClassificationLabel::from(3)).expect("json");
        assert_eq!(json, serde_json::json!({ "class_id": 3 }));
    }
}
