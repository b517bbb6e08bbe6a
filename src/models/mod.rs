//! Classifier pipeline components

pub mod inference;
pub mod loader;
pub mod manifest;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use inference::{Classifier, Pipeline};
pub use loader::ModelLoader;
pub use manifest::ModelManifest;
