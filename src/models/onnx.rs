//! ONNX Runtime classifier backend

use crate::error::{InferenceError, ModelLoadError};
use crate::models::inference::{label_for_index, Classifier, InputElement};
use crate::models::manifest::{InputSpec, ModelManifest};
use crate::types::record::{FeatureRow, FeatureValue};
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Classifier backed by an ONNX Runtime session.
///
/// The graph takes one `[1, 1]` tensor per column and emits the predicted
/// class either as a string tensor or as an int64 class index.
pub struct OnnxClassifier {
    /// Session runs need exclusive access
    session: Mutex<Session>,
    inputs: Vec<InputSpec>,
    labels: Vec<String>,
    output_label: String,
}

impl OnnxClassifier {
    /// Build a session from the artifact and check it against the manifest.
    pub fn load<P: AsRef<Path>>(
        path: P,
        manifest: &ModelManifest,
        onnx_threads: usize,
    ) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let backend = |e: ort::Error| ModelLoadError::Backend(format!("{}: {e}", path.display()));

        ort::init().commit().map_err(backend)?;

        let session = Session::builder()
            .map_err(backend)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(backend)?
            .with_intra_threads(onnx_threads)
            .map_err(backend)?
            .commit_from_file(path)
            .map_err(backend)?;

        for input in &manifest.inputs {
            if !session.inputs.iter().any(|i| i.name == input.name) {
                return Err(ModelLoadError::Schema(format!(
                    "graph has no input named `{}`",
                    input.name
                )));
            }
        }
        if !session.outputs.iter().any(|o| o.name == manifest.output_label) {
            return Err(ModelLoadError::Schema(format!(
                "graph has no output named `{}`",
                manifest.output_label
            )));
        }

        info!(
            model = %manifest.name,
            inputs = session.inputs.len(),
            output = %manifest.output_label,
            threads = onnx_threads,
            "ONNX session ready"
        );

        Ok(Self {
            session: Mutex::new(session),
            inputs: manifest.inputs.clone(),
            labels: manifest.labels.clone(),
            output_label: manifest.output_label.clone(),
        })
    }

    fn input_tensor(spec: &InputSpec, value: &FeatureValue) -> Result<DynValue, InferenceError> {
        let shape = vec![1_i64, 1];
        let tensor = match InputElement::coerce(spec, value)? {
            InputElement::Text(s) => Tensor::from_string_array((shape, vec![s])).map(|t| t.into_dyn()),
            InputElement::F32(x) => Tensor::from_array((shape, vec![x])).map(|t| t.into_dyn()),
            InputElement::I64(n) => Tensor::from_array((shape, vec![n])).map(|t| t.into_dyn()),
        };

        tensor.map_err(|e| InferenceError::Backend(format!("input `{}`: {e}", spec.name)))
    }

    fn extract_label(&self, outputs: &SessionOutputs) -> Result<String, InferenceError> {
        let output = outputs
            .get(self.output_label.as_str())
            .ok_or(InferenceError::EmptyOutput)?;

        // String labels (classifier exported with text classes)
        if let Ok((_, labels)) = output.try_extract_strings() {
            return labels.into_iter().next().ok_or(InferenceError::EmptyOutput);
        }

        // Class index into the manifest labels
        let (_, data) = output
            .try_extract_tensor::<i64>()
            .map_err(|e| InferenceError::Backend(e.to_string()))?;
        let index = *data.first().ok_or(InferenceError::EmptyOutput)?;

        label_for_index(&self.labels, index)
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, row: &FeatureRow) -> Result<String, InferenceError> {
        let mut inputs: Vec<(String, DynValue)> = Vec::with_capacity(self.inputs.len());
        for spec in &self.inputs {
            let value = row
                .get(&spec.name)
                .ok_or_else(|| InferenceError::MissingFeature(spec.name.clone()))?;
            inputs.push((spec.name.clone(), Self::input_tensor(spec, value)?));
        }

        let mut session = self
            .session
            .lock()
            .map_err(|e| InferenceError::Backend(format!("Lock error: {e}")))?;

        let outputs = session
            .run(inputs)
            .map_err(|e| InferenceError::Backend(e.to_string()))?;

        let label = self.extract_label(&outputs)?;
        debug!(label = %label, "ONNX inference complete");
        Ok(label)
    }

    fn backend(&self) -> &str {
        "onnxruntime"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::manifest::InputType;
    use ort::tensor::TensorElementType;
    use ort::value::ValueType;

    fn spec(name: &str, dtype: InputType) -> InputSpec {
        InputSpec {
            name: name.to_string(),
            dtype,
        }
    }

    fn element_type(value: &DynValue) -> Option<TensorElementType> {
        match &value.dtype() {
            ValueType::Tensor { ty, .. } => Some(*ty),
            _ => None,
        }
    }

    #[test]
    fn test_input_tensor_element_types() {
        let text = OnnxClassifier::input_tensor(
            &spec("Gender", InputType::String),
            &FeatureValue::Text("Male".to_string()),
        )
        .unwrap();
        assert_eq!(element_type(&text), Some(TensorElementType::String));

        let float =
            OnnxClassifier::input_tensor(&spec("Height", InputType::Float), &FeatureValue::Int(2))
                .unwrap();
        assert_eq!(element_type(&float), Some(TensorElementType::Float32));
        let (shape, data) = float.try_extract_tensor::<f32>().unwrap();
        assert_eq!(&shape[..], &[1, 1]);
        assert_eq!(data, &[2.0]);

        let int = OnnxClassifier::input_tensor(&spec("FCVC", InputType::Int64), &FeatureValue::Int(3))
            .unwrap();
        assert_eq!(element_type(&int), Some(TensorElementType::Int64));
        let (_, data) = int.try_extract_tensor::<i64>().unwrap();
        assert_eq!(data, &[3]);
    }

    #[test]
    fn test_input_tensor_rejects_unrounded_ordinal() {
        let result =
            OnnxClassifier::input_tensor(&spec("FCVC", InputType::Int64), &FeatureValue::Float(2.4));
        assert!(matches!(result, Err(InferenceError::TypeMismatch { .. })));
    }
}
