use crate::{Window, WindowError};

/// Errors raised while reading a chip from a raster source.
#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("storage could not produce {window}: {message}")]
    Storage { window: Window, message: String },

    #[error(
        "transformer `{transformer}` changed chip size from {expected:?} to {got:?} (height, width)"
    )]
    ShapeMismatch {
        transformer: String,
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("channel {channel} requested but only {available} raw channels exist")]
    ChannelOutOfRange { channel: usize, available: usize },

    #[error("pixel buffer length mismatch (expected {expected}, got {got})")]
    BufferLength { expected: usize, got: usize },
}

/// Errors raised while loading or writing JSON configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
