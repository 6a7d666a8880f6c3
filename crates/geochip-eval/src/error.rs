use geochip_core::RasterError;

#[derive(thiserror::Error, Debug)]
pub enum EvalError {
    #[error("cannot merge evaluation of class {left} with class {right}")]
    ClassMismatch { left: u32, right: u32 },

    #[error("class {class_id}: cannot merge a known true-negative count with an unknown one")]
    TrueNegativeMismatch { class_id: u32 },

    #[error("class id {class_id} out of range for {num_classes} classes")]
    ClassOutOfRange { class_id: u32, num_classes: usize },

    #[error("class count mismatch ({left} vs {right})")]
    ClassCountMismatch { left: usize, right: usize },

    #[error("ground truth chip {gt:?} and prediction chip {pred:?} differ in shape")]
    ShapeMismatch {
        gt: (usize, usize, usize),
        pred: (usize, usize, usize),
    },

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
