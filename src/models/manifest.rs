//! Model manifest: the JSON sidecar shipped next to the ONNX artifact

use crate::error::ModelLoadError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Element type of a graph input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    String,
    Float,
    Int64,
}

impl InputType {
    pub fn describe(&self) -> &'static str {
        match self {
            InputType::String => "a text value",
            InputType::Float => "a numeric value",
            InputType::Int64 => "an integer value",
        }
    }
}

/// One named graph input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,
    pub dtype: InputType,
}

/// Description of an exported classifier pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Model name used in logs
    pub name: String,
    /// Named preprocessing steps applied before the graph, in order
    #[serde(default)]
    pub transforms: Vec<String>,
    /// Graph inputs, one per column
    pub inputs: Vec<InputSpec>,
    /// Vocabularies the categorical encoder was fit on
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
    /// Class labels, indexed by class id
    #[serde(default)]
    pub labels: Vec<String>,
    /// Name of the graph output holding the predicted label
    #[serde(default = "default_output_label")]
    pub output_label: String,
}

fn default_output_label() -> String {
    "output_label".to_string()
}

impl ModelManifest {
    /// Read and check a manifest file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelLoadError::NotFound(path.to_path_buf()));
        }

        let invalid = |reason: String| ModelLoadError::Manifest {
            path: path.to_path_buf(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let manifest: Self = serde_json::from_str(&raw).map_err(|e| invalid(e.to_string()))?;
        manifest.check().map_err(invalid)?;
        Ok(manifest)
    }

    /// Structural consistency checks.
    pub fn check(&self) -> Result<(), String> {
        if self.inputs.is_empty() {
            return Err("manifest declares no inputs".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for input in &self.inputs {
            if !seen.insert(input.name.as_str()) {
                return Err(format!("input `{}` declared twice", input.name));
            }
        }

        for (feature, values) in &self.categories {
            match self.input(feature) {
                Some(spec) if spec.dtype == InputType::String => {}
                Some(_) => return Err(format!("categories given for non-text input `{feature}`")),
                None => return Err(format!("categories given for unknown input `{feature}`")),
            }
            if values.is_empty() {
                return Err(format!("empty vocabulary for `{feature}`"));
            }
        }

        Ok(())
    }

    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.name == name)
    }

    /// Manifest path that accompanies a model file by default.
    pub fn default_path_for<P: AsRef<Path>>(model_path: P) -> PathBuf {
        model_path.as_ref().with_extension("json")
    }
}
