//! Feature preprocessing applied before classifier inference.
//!
//! The exported classifier was trained on integer-coded ordinal answers, so
//! the fractional slider values for those questions must be rounded before
//! they reach it. The rounding step is referenced by name from the model
//! manifest and resolved through [`TransformRegistry`] at load time.

use crate::error::ModelLoadError;
use crate::types::record::{FeatureRow, FeatureValue};
use std::collections::HashMap;

/// Ordinal survey answers rounded to integers before inference.
pub const ROUNDED_FEATURES: [&str; 5] = ["FCVC", "NCP", "CH2O", "FAF", "TUE"];

/// Registry name of [`normalize`].
pub const NORMALIZE: &str = "normalize";

/// A named, pure row transform.
pub type Transform = fn(&FeatureRow) -> FeatureRow;

/// Round to the nearest integer, ties to even.
///
/// Matches the rounding used when the model was trained (2.5 -> 2, 3.5 -> 4).
pub fn round_half_even(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Round the ordinal features of `row` to integers.
///
/// Only columns named in [`ROUNDED_FEATURES`] that are present in the row are
/// touched; nothing is added. Integer and text values are left as they are,
/// which makes the transform idempotent.
pub fn normalize(row: &FeatureRow) -> FeatureRow {
    let mut out = row.clone();
    for name in ROUNDED_FEATURES {
        if let Some(value) = out.get_mut(name) {
            if let FeatureValue::Float(v) = *value {
                if v.is_finite() {
                    *value = FeatureValue::Int(round_half_even(v));
                }
            }
        }
    }
    out
}

/// Named transforms a model manifest may reference.
pub struct TransformRegistry {
    transforms: HashMap<String, Transform>,
}

impl TransformRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// Registry holding the built-in transforms.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(NORMALIZE, normalize);
        registry
    }

    pub fn register(&mut self, name: &str, transform: Transform) {
        self.transforms.insert(name.to_string(), transform);
    }

    /// Resolve a transform by the name stored in the manifest.
    pub fn resolve(&self, name: &str) -> Result<Transform, ModelLoadError> {
        self.transforms
            .get(name)
            .copied()
            .ok_or_else(|| ModelLoadError::UnknownTransform(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
