//! Error types for model loading and inference

use std::path::PathBuf;
use thiserror::Error;

/// Failure while resolving the model artifact at startup.
///
/// Any of these is fatal: the service must not accept requests without a model.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model directory not found at {0}")]
    ModelDirMissing(PathBuf),

    #[error("model artifact not found at {0}")]
    NotFound(PathBuf),

    #[error("model artifact {0} is not a regular file")]
    NotAFile(PathBuf),

    #[error("model artifact {path} is empty or truncated ({size} bytes)")]
    EmptyArtifact { path: PathBuf, size: u64 },

    #[error("model artifact {0} is a Git LFS pointer, not the model (run `git lfs pull`)")]
    LfsPointer(PathBuf),

    #[error("invalid model manifest {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    #[error("model references unregistered transform `{0}`")]
    UnknownTransform(String),

    #[error("model schema mismatch: {0}")]
    Schema(String),

    #[error("inference backend error: {0}")]
    Backend(String),

    #[error("no inference backend compiled in (enable the `onnx` feature)")]
    BackendUnavailable,
}

/// Failure of a single prediction. The service reports it and keeps serving.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("missing required feature `{0}`")]
    MissingFeature(String),

    #[error("feature `{feature}` expected {expected}")]
    TypeMismatch {
        feature: String,
        expected: &'static str,
    },

    #[error("feature `{feature}` has unseen category `{value}`")]
    UnseenCategory { feature: String, value: String },

    #[error("feature `{feature}` = {value} outside [{min}, {max}]")]
    OutOfRange {
        feature: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("inference backend error: {0}")]
    Backend(String),

    #[error("model returned no label")]
    EmptyOutput,

    #[error("model returned class index {0} with no matching label")]
    UnknownClassIndex(i64),
}
