//! Model store: resolves the manifest and artifact into a ready pipeline

use crate::config::ModelConfig;
use crate::error::ModelLoadError;
use crate::models::inference::{Classifier, Pipeline};
use crate::models::manifest::ModelManifest;
use crate::preprocessing::{Transform, TransformRegistry};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

/// Artifacts smaller than this cannot be a serialized model
pub const MIN_ARTIFACT_BYTES: u64 = 5;

const LFS_POINTER_PREFIX: &[u8] = b"version https://git-lfs";

/// Check the artifact on disk before handing it to the backend.
///
/// Distinguishes a missing model directory, a missing file, a directory in
/// place of the file, an empty upload and a Git LFS pointer checked out
/// without its object.
pub fn inspect_artifact(path: &Path) -> Result<u64, ModelLoadError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.is_dir() {
            return Err(ModelLoadError::ModelDirMissing(dir.to_path_buf()));
        }
    }

    let metadata = std::fs::metadata(path).map_err(|_| ModelLoadError::NotFound(path.to_path_buf()))?;
    if !metadata.is_file() {
        return Err(ModelLoadError::NotAFile(path.to_path_buf()));
    }

    let size = metadata.len();
    if size < MIN_ARTIFACT_BYTES {
        return Err(ModelLoadError::EmptyArtifact {
            path: path.to_path_buf(),
            size,
        });
    }

    let mut head = Vec::with_capacity(LFS_POINTER_PREFIX.len());
    std::fs::File::open(path)
        .and_then(|f| f.take(LFS_POINTER_PREFIX.len() as u64).read_to_end(&mut head))
        .map_err(|e| ModelLoadError::Backend(format!("{}: {e}", path.display())))?;
    if head == LFS_POINTER_PREFIX {
        return Err(ModelLoadError::LfsPointer(path.to_path_buf()));
    }

    Ok(size)
}

/// Loader for the classifier pipeline
pub struct ModelLoader {
    registry: TransformRegistry,
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a loader with the built-in transforms and 1 inference thread
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            registry: TransformRegistry::builtin(),
            onnx_threads,
        }
    }

    /// Replace the transform registry
    pub fn with_registry(mut self, registry: TransformRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Load the pipeline described by the model configuration
    pub fn load(&self, config: &ModelConfig) -> Result<Pipeline, ModelLoadError> {
        let manifest_path = config
            .manifest_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| ModelManifest::default_path_for(&config.model_path));
        self.load_from_paths(&config.model_path, manifest_path)
    }

    /// Load a pipeline from an artifact and its manifest
    pub fn load_from_paths<P: AsRef<Path>, M: AsRef<Path>>(
        &self,
        model_path: P,
        manifest_path: M,
    ) -> Result<Pipeline, ModelLoadError> {
        let model_path = model_path.as_ref();
        let size = inspect_artifact(model_path)?;

        let manifest = ModelManifest::load(manifest_path.as_ref())?;
        let transforms = self.resolve_transforms(&manifest)?;

        info!(
            model = %manifest.name,
            path = %model_path.display(),
            size_kb = format!("{:.2}", size as f64 / 1024.0),
            transforms = ?manifest.transforms,
            "Loading classifier pipeline"
        );

        let classifier = self.open_backend(model_path, &manifest)?;
        Ok(Pipeline::new(&manifest, transforms, classifier))
    }

    /// Build a pipeline around an already constructed backend
    pub fn assemble(
        &self,
        manifest: &ModelManifest,
        classifier: Box<dyn Classifier>,
    ) -> Result<Pipeline, ModelLoadError> {
        manifest.check().map_err(ModelLoadError::Schema)?;
        let transforms = self.resolve_transforms(manifest)?;
        Ok(Pipeline::new(manifest, transforms, classifier))
    }

    fn resolve_transforms(
        &self,
        manifest: &ModelManifest,
    ) -> Result<Vec<(String, Transform)>, ModelLoadError> {
        manifest
            .transforms
            .iter()
            .map(|name| self.registry.resolve(name).map(|t| (name.clone(), t)))
            .collect()
    }

    #[cfg(feature = "onnx")]
    fn open_backend(
        &self,
        model_path: &Path,
        manifest: &ModelManifest,
    ) -> Result<Box<dyn Classifier>, ModelLoadError> {
        let classifier =
            crate::models::onnx::OnnxClassifier::load(model_path, manifest, self.onnx_threads)?;
        Ok(Box::new(classifier))
    }

    #[cfg(not(feature = "onnx"))]
    fn open_backend(
        &self,
        _model_path: &Path,
        _manifest: &ModelManifest,
    ) -> Result<Box<dyn Classifier>, ModelLoadError> {
        tracing::error!(threads = self.onnx_threads, "Built without an inference backend");
        Err(ModelLoadError::BackendUnavailable)
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inference::tests::FixedClassifier;
    use crate::models::manifest::tests::{shipped_manifest, SHIPPED_MANIFEST};

    const FAKE_GRAPH: &[u8] = b"\x08\x07\x12\x07skl2onnx fake graph bytes";

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("risk-sim-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_model_fails() {
        let config = ModelConfig {
            model_path: "/nonexistent/obesity_classifier.onnx".to_string(),
            manifest_path: None,
            onnx_threads: 1,
        };

        let result = ModelLoader::new().load(&config);
        assert!(matches!(result, Err(ModelLoadError::ModelDirMissing(_))));

        let dir = scratch_dir();
        let result = ModelLoader::new().load_from_paths(dir.join("model.onnx"), dir.join("model.json"));
        std::fs::remove_dir_all(&dir).ok();
        assert!(matches!(result, Err(ModelLoadError::NotFound(_))));
    }

    #[test]
    fn test_missing_model_dir_fails() {
        let path = std::env::temp_dir()
            .join(format!("no-models-{}", uuid::Uuid::new_v4()))
            .join("obesity_classifier.onnx");

        assert!(matches!(
            inspect_artifact(&path),
            Err(ModelLoadError::ModelDirMissing(_))
        ));
    }

    #[test]
    fn test_empty_artifact_fails() {
        let dir = scratch_dir();
        let model = dir.join("model.onnx");
        std::fs::write(&model, b"").unwrap();
        std::fs::write(dir.join("model.json"), SHIPPED_MANIFEST).unwrap();

        let result = ModelLoader::new().load_from_paths(&model, dir.join("model.json"));
        let truncated = {
            std::fs::write(&model, b"\x08\x07").unwrap();
            inspect_artifact(&model)
        };
        std::fs::remove_dir_all(&dir).ok();

        assert!(matches!(result, Err(ModelLoadError::EmptyArtifact { size: 0, .. })));
        assert!(matches!(truncated, Err(ModelLoadError::EmptyArtifact { size: 2, .. })));
    }

    #[test]
    fn test_lfs_pointer_fails() {
        let dir = scratch_dir();
        let model = dir.join("model.onnx");
        let pointer = "version https://git-lfs.github.com/spec/v1\n\
                       oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393\n\
                       size 2048331\n";
        std::fs::write(&model, pointer).unwrap();
        std::fs::write(dir.join("model.json"), SHIPPED_MANIFEST).unwrap();

        let result = ModelLoader::new().load_from_paths(&model, dir.join("model.json"));
        std::fs::remove_dir_all(&dir).ok();

        assert!(matches!(result, Err(ModelLoadError::LfsPointer(p)) if p == model));
    }

    #[test]
    fn test_directory_in_place_of_artifact_fails() {
        let dir = scratch_dir();
        let model = dir.join("model.onnx");
        std::fs::create_dir_all(&model).unwrap();

        let result = ModelLoader::new().load_from_paths(&model, dir.join("model.json"));
        std::fs::remove_dir_all(&dir).ok();

        assert!(matches!(result, Err(ModelLoadError::NotAFile(_))));
    }

    #[test]
    fn test_inspect_accepts_real_bytes() {
        let dir = scratch_dir();
        let model = dir.join("model.onnx");
        std::fs::write(&model, FAKE_GRAPH).unwrap();

        let result = inspect_artifact(&model);
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(result.ok(), Some(FAKE_GRAPH.len() as u64));
    }

    #[test]
    fn test_missing_manifest_fails() {
        let dir = scratch_dir();
        let model = dir.join("model.onnx");
        std::fs::write(&model, FAKE_GRAPH).unwrap();

        let result = ModelLoader::new().load_from_paths(&model, dir.join("absent.json"));
        std::fs::remove_dir_all(&dir).ok();

        assert!(matches!(result, Err(ModelLoadError::NotFound(p)) if p.ends_with("absent.json")));
    }

    #[test]
    fn test_unknown_transform_fails_before_backend() {
        let dir = scratch_dir();
        let model = dir.join("model.onnx");
        std::fs::write(&model, FAKE_GRAPH).unwrap();
        let manifest = SHIPPED_MANIFEST.replace("\"normalize\"", "\"arredondar\"");
        std::fs::write(dir.join("model.json"), manifest).unwrap();

        let result = ModelLoader::new().load_from_paths(&model, dir.join("model.json"));
        std::fs::remove_dir_all(&dir).ok();

        assert!(matches!(result, Err(ModelLoadError::UnknownTransform(name)) if name == "arredondar"));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_backend_unavailable_without_onnx() {
        let dir = scratch_dir();
        let model = dir.join("model.onnx");
        std::fs::write(&model, FAKE_GRAPH).unwrap();
        std::fs::write(dir.join("model.json"), SHIPPED_MANIFEST).unwrap();

        let config = ModelConfig {
            model_path: model.to_string_lossy().into_owned(),
            manifest_path: None,
            onnx_threads: 1,
        };
        let result = ModelLoader::new().load(&config);
        std::fs::remove_dir_all(&dir).ok();

        assert!(matches!(result, Err(ModelLoadError::BackendUnavailable)));
    }

    #[test]
    fn test_assemble_with_custom_registry() {
        fn identity(row: &crate::types::record::FeatureRow) -> crate::types::record::FeatureRow {
            row.clone()
        }

        let mut registry = TransformRegistry::builtin();
        registry.register("identity", identity);
        let mut manifest = shipped_manifest();
        manifest.transforms.push("identity".to_string());

        let pipeline = ModelLoader::new()
            .with_registry(registry)
            .assemble(&manifest, Box::new(FixedClassifier("Normal_Weight")))
            .unwrap();

        assert_eq!(pipeline.transform_names(), vec!["normalize", "identity"]);
        assert_eq!(pipeline.backend(), "fixed");
    }
}
