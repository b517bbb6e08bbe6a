//! Classifier pipeline: named transforms, input schema checks and the backend

use crate::error::InferenceError;
use crate::models::manifest::{InputSpec, InputType, ModelManifest};
use crate::preprocessing::Transform;
use crate::types::record::{FeatureRow, FeatureValue};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Single-row classification backend.
///
/// Receives a row that already passed the pipeline's schema checks and
/// returns exactly one raw class label.
pub trait Classifier: Send + Sync {
    fn classify(&self, row: &FeatureRow) -> Result<String, InferenceError>;

    /// Backend name used in logs
    fn backend(&self) -> &str;
}

/// Scalar handed to a `[1, 1]` graph input, already coerced to the input's
/// element type.
#[derive(Debug, Clone, PartialEq)]
pub enum InputElement {
    Text(String),
    F32(f32),
    I64(i64),
}

impl InputElement {
    /// Coerce a row value to the element type a graph input declares.
    ///
    /// `float` inputs take integers and floats, `int64` inputs only integers,
    /// `string` inputs only text.
    pub fn coerce(spec: &InputSpec, value: &FeatureValue) -> Result<Self, InferenceError> {
        match (spec.dtype, value) {
            (InputType::String, FeatureValue::Text(s)) => Ok(InputElement::Text(s.clone())),
            (InputType::Float, FeatureValue::Int(n)) => Ok(InputElement::F32(*n as f32)),
            (InputType::Float, FeatureValue::Float(x)) => Ok(InputElement::F32(*x as f32)),
            (InputType::Int64, FeatureValue::Int(n)) => Ok(InputElement::I64(*n)),
            _ => Err(InferenceError::TypeMismatch {
                feature: spec.name.clone(),
                expected: spec.dtype.describe(),
            }),
        }
    }
}

/// Map a class index emitted by the graph to its label.
pub fn label_for_index(labels: &[String], index: i64) -> Result<String, InferenceError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| labels.get(i))
        .cloned()
        .ok_or(InferenceError::UnknownClassIndex(index))
}

/// Loaded classifier pipeline. Immutable after construction.
pub struct Pipeline {
    name: String,
    transforms: Vec<(String, Transform)>,
    inputs: Vec<InputSpec>,
    categories: BTreeMap<String, BTreeSet<String>>,
    classifier: Box<dyn Classifier>,
}

impl Pipeline {
    /// Assemble a pipeline from a manifest, its resolved transforms and a backend.
    pub fn new(
        manifest: &ModelManifest,
        transforms: Vec<(String, Transform)>,
        classifier: Box<dyn Classifier>,
    ) -> Self {
        let categories = manifest
            .categories
            .iter()
            .map(|(name, values)| (name.clone(), values.iter().cloned().collect()))
            .collect();

        Self {
            name: manifest.name.clone(),
            transforms,
            inputs: manifest.inputs.clone(),
            categories,
            classifier,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> &str {
        self.classifier.backend()
    }

    pub fn transform_names(&self) -> Vec<&str> {
        self.transforms.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|i| i.name.as_str()).collect()
    }

    /// Classify one row and return the raw class label.
    pub fn predict(&self, row: &FeatureRow) -> Result<String, InferenceError> {
        let mut row = row.clone();
        for (_, transform) in &self.transforms {
            row = transform(&row);
        }

        self.check_schema(&row)?;

        let label = self.classifier.classify(&row)?;
        debug!(model = %self.name, label = %label, "Pipeline prediction complete");
        Ok(label)
    }

    /// Run several rows; each succeeds or fails on its own.
    pub fn predict_batch(&self, rows: &[FeatureRow]) -> Vec<Result<String, InferenceError>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    fn check_schema(&self, row: &FeatureRow) -> Result<(), InferenceError> {
        for input in &self.inputs {
            let value = row
                .get(&input.name)
                .ok_or_else(|| InferenceError::MissingFeature(input.name.clone()))?;

            InputElement::coerce(input, value)?;

            if let (Some(vocabulary), FeatureValue::Text(text)) =
                (self.categories.get(&input.name), value)
            {
                if !vocabulary.contains(text) {
                    return Err(InferenceError::UnseenCategory {
                        feature: input.name.clone(),
                        value: text.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
