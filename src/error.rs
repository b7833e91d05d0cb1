use std::path::PathBuf;
use thiserror::Error;

/// The main error type for randshear operations.
#[derive(Debug, Error)]
pub enum RandShearError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config from {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Failed to write config to {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse tensor JSON from {path}: {source}")]
    TensorParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write tensor JSON to {path}: {source}")]
    TensorWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "The `{name}` argument should be a number (or a list of two numbers) \
         in the range [0, 1.0]. Received: {name}={message}"
    )]
    InvalidFactor { name: String, message: String },

    #[error(
        "The `{name}` argument should be a number (or a list of two numbers) \
         in the range [0, 1.0]. Received: input_number={value}"
    )]
    FactorOutOfRange { name: String, value: f32 },

    #[error("Unknown `interpolation` {0}. Expected one of (\"nearest\", \"bilinear\").")]
    UnknownInterpolation(String),

    #[error(
        "Unknown `fill_mode` {0}. Expected one of (\"reflect\", \"wrap\", \"constant\", \"nearest\")."
    )]
    UnknownFillMode(String),

    #[error("Unknown `data_format` {0}. Expected one of (\"channels_last\", \"channels_first\").")]
    UnknownDataFormat(String),

    #[error("Expected an image tensor of rank 3 (unbatched) or 4 (batched), got rank {rank}")]
    InvalidRank { rank: usize },

    #[error("Transform shape mismatch: expected {expected}, got {actual}")]
    TransformShape { expected: String, actual: String },

    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Invalid sample parameters: {message}")]
    InvalidSampleParams { message: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
