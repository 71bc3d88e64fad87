//! Process-wide slot for the loaded classifier.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::{info, warn};

use super::{Classifier, KeywordClassifier, TfidfNbPipeline};
use crate::error::ModelError;

/// Empty until a classifier is installed; installed at most once.
///
/// Cloning shares the same slot.
#[derive(Clone, Default)]
pub struct ModelHandle {
    slot: Arc<OnceLock<Arc<dyn Classifier>>>,
}

/// What the health check reports about the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub model_loaded: bool,
    pub model_type: Option<String>,
}

impl ModelHandle {
    /// An empty handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that already holds `classifier`.
    pub fn with_classifier(classifier: Arc<dyn Classifier>) -> Self {
        let handle = Self::new();
        // A fresh slot is always empty.
        let _ = handle.slot.set(classifier);
        handle
    }

    /// Install the classifier. Fails if one is already present.
    pub fn install(&self, classifier: Arc<dyn Classifier>) -> Result<(), ModelError> {
        let model_type = classifier.model_type().to_string();
        self.slot
            .set(classifier)
            .map_err(|_| ModelError::AlreadyInstalled)?;
        info!(model_type = %model_type, "Model installed");
        Ok(())
    }

    pub fn get(&self) -> Option<&Arc<dyn Classifier>> {
        self.slot.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn info(&self) -> ModelInfo {
        match self.slot.get() {
            Some(model) => ModelInfo {
                model_loaded: true,
                model_type: Some(model.model_type().to_string()),
            },
            None => ModelInfo {
                model_loaded: false,
                model_type: None,
            },
        }
    }

    /// Load the artifact at `path` and install it.
    ///
    /// With `allow_fallback`, a missing artifact installs the keyword
    /// classifier instead. Any other failure is returned.
    pub fn load_from(&self, path: &Path, allow_fallback: bool) -> Result<(), ModelError> {
        match TfidfNbPipeline::load(path) {
            Ok(pipeline) => self.install(Arc::new(pipeline)),
            Err(ModelError::ArtifactMissing { path }) if allow_fallback => {
                warn!(
                    path = %path.display(),
                    "Model artifact not found; serving keyword fallback classifier"
                );
                self.install(Arc::new(KeywordClassifier::new()))
            }
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("info", &self.info())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fallback;

    #[test]
    fn empty_handle_reports_not_loaded() {
        let handle = ModelHandle::new();
        assert!(!handle.is_loaded());
        assert_eq!(
            handle.info(),
            ModelInfo {
                model_loaded: false,
                model_type: None
            }
        );
    }

    #[test]
    fn install_is_visible_through_clones() {
        let handle = ModelHandle::new();
        let shared = handle.clone();
        handle.install(Arc::new(KeywordClassifier::new())).unwrap();
        assert!(shared.is_loaded());
        assert_eq!(
            shared.info().model_type.as_deref(),
            Some(fallback::MODEL_TYPE)
        );
    }

    #[test]
    fn second_install_fails() {
        let handle = ModelHandle::with_classifier(Arc::new(KeywordClassifier::new()));
        let err = handle
            .install(Arc::new(KeywordClassifier::new()))
            .unwrap_err();
        assert!(matches!(err, ModelError::AlreadyInstalled));
    }

    #[test]
    fn missing_artifact_is_fatal_without_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let handle = ModelHandle::new();
        let err = handle
            .load_from(&dir.path().join("missing.json"), false)
            .unwrap_err();
        assert!(matches!(err, ModelError::ArtifactMissing { .. }));
        assert!(!handle.is_loaded());
    }

    #[test]
    fn missing_artifact_uses_fallback_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let handle = ModelHandle::new();
        handle
            .load_from(&dir.path().join("missing.json"), true)
            .unwrap();
        assert_eq!(handle.info().model_type.as_deref(), Some(fallback::MODEL_TYPE));
    }

    #[test]
    fn malformed_artifact_is_fatal_even_with_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{").unwrap();
        let handle = ModelHandle::new();
        assert!(handle.load_from(&path, true).is_err());
        assert!(!handle.is_loaded());
    }
}
