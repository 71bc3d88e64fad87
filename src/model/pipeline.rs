//! TF-IDF + multinomial Naive Bayes pipeline and its on-disk artifact.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::naive_bayes::MultinomialNb;
use super::vectorizer::TfidfVectorizer;
use super::{Classifier, Label, Prediction};
use crate::error::ModelError;
use crate::preprocess::{Preprocessor, PreprocessorOptions};
use crate::training::Evaluation;

/// Artifact layout version this build reads and writes.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

pub const MODEL_TYPE: &str = "TfidfMultinomialNB";

/// Hyperparameters for [`TfidfNbPipeline::fit`].
#[derive(Debug, Clone, Copy)]
pub struct TrainingOptions {
    pub preprocessor: PreprocessorOptions,
    /// Cap on vocabulary size; `None` keeps every token.
    pub max_features: Option<usize>,
    /// Naive Bayes smoothing.
    pub alpha: f64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            preprocessor: PreprocessorOptions::default(),
            max_features: None,
            alpha: 1.0,
        }
    }
}

/// Statistics recorded alongside a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub documents: usize,
    pub scam: usize,
    pub not_scam: usize,
    pub vocabulary_size: usize,
    /// Accuracy on the held-out split, when one was used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holdout: Option<Evaluation>,
}

/// Serialized form of a trained pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model_type: String,
    pub trained_at: DateTime<Utc>,
    pub preprocessor: PreprocessorOptions,
    pub vectorizer: TfidfVectorizer,
    pub classifier: MultinomialNb,
    pub summary: TrainingSummary,
}

#[derive(Deserialize)]
struct VersionProbe {
    format_version: u32,
}

/// Fitted preprocess → TF-IDF → Naive Bayes pipeline.
#[derive(Debug, Clone)]
pub struct TfidfNbPipeline {
    preprocessor: Preprocessor,
    vectorizer: TfidfVectorizer,
    classifier: MultinomialNb,
    trained_at: DateTime<Utc>,
    summary: TrainingSummary,
}

impl TfidfNbPipeline {
    /// Fit on raw email texts.
    pub fn fit<S: AsRef<str>>(
        texts: &[S],
        labels: &[Label],
        options: TrainingOptions,
    ) -> Result<Self, ModelError> {
        if texts.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if options.max_features == Some(0) {
            return Err(ModelError::InvalidParameter {
                name: "max_features",
                message: "must be at least 1".into(),
            });
        }

        let preprocessor = Preprocessor::new(options.preprocessor);
        let normalized: Vec<String> = texts
            .iter()
            .map(|t| preprocessor.normalize(t.as_ref()))
            .collect();

        let vectorizer = TfidfVectorizer::fit(&normalized, options.max_features);
        let rows: Vec<_> = normalized.iter().map(|d| vectorizer.transform(d)).collect();
        let classifier = MultinomialNb::fit(&rows, labels, vectorizer.len(), options.alpha)?;

        let [not_scam, scam] = classifier.class_count();
        let summary = TrainingSummary {
            documents: texts.len(),
            scam: scam as usize,
            not_scam: not_scam as usize,
            vocabulary_size: vectorizer.len(),
            holdout: None,
        };
        debug!(
            documents = summary.documents,
            vocabulary = summary.vocabulary_size,
            "Pipeline fitted"
        );

        Ok(Self {
            preprocessor,
            vectorizer,
            classifier,
            trained_at: Utc::now(),
            summary,
        })
    }

    pub fn summary(&self) -> &TrainingSummary {
        &self.summary
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn set_holdout(&mut self, evaluation: Evaluation) {
        self.summary.holdout = Some(evaluation);
    }

    /// Normalize and classify raw text in one step.
    pub fn predict_raw(&self, text: &str) -> Prediction {
        self.predict_normalized(&self.preprocessor.normalize(text))
    }

    /// Probabilities per class for normalized text, indexed by [`Label::index`].
    pub fn predict_proba(&self, normalized: &str) -> [f64; 2] {
        self.classifier.predict_proba(&self.vectorizer.transform(normalized))
    }

    fn predict_normalized(&self, normalized: &str) -> Prediction {
        let (label, confidence) = self.classifier.predict(&self.vectorizer.transform(normalized));
        Prediction { label, confidence }
    }

    pub fn to_artifact(&self) -> ModelArtifact {
        ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_type: MODEL_TYPE.to_string(),
            trained_at: self.trained_at,
            preprocessor: self.preprocessor.options(),
            vectorizer: self.vectorizer.clone(),
            classifier: self.classifier.clone(),
            summary: self.summary.clone(),
        }
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::IncompatibleVersion {
                found: artifact.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }
        if artifact.model_type != MODEL_TYPE {
            return Err(ModelError::Inconsistent(format!(
                "unsupported model type {:?}",
                artifact.model_type
            )));
        }
        artifact.vectorizer.validate()?;
        artifact.classifier.validate(artifact.vectorizer.len())?;

        Ok(Self {
            preprocessor: Preprocessor::new(artifact.preprocessor),
            vectorizer: artifact.vectorizer,
            classifier: artifact.classifier,
            trained_at: artifact.trained_at,
            summary: artifact.summary,
        })
    }

    /// Write the artifact, replacing any existing file atomically.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec(&self.to_artifact())?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, path)?;
        info!(path = %path.display(), "Model artifact written");
        Ok(())
    }

    /// Load and validate an artifact written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ModelError::ArtifactMissing {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(ModelError::ArtifactUnreadable {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let malformed = |source| ModelError::ArtifactMalformed {
            path: path.to_path_buf(),
            source,
        };

        // Check the version first so an old or future layout reports as
        // incompatible rather than as a parse failure.
        let probe: VersionProbe = serde_json::from_slice(&bytes).map_err(malformed)?;
        if probe.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::IncompatibleVersion {
                found: probe.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }

        let artifact: ModelArtifact = serde_json::from_slice(&bytes).map_err(malformed)?;
        let pipeline = Self::from_artifact(artifact)?;
        info!(
            path = %path.display(),
            vocabulary = pipeline.vectorizer.len(),
            trained_at = %pipeline.trained_at,
            "Model artifact loaded"
        );
        Ok(pipeline)
    }
}

impl Classifier for TfidfNbPipeline {
    fn model_type(&self) -> &str {
        MODEL_TYPE
    }

    fn preprocessor(&self) -> Preprocessor {
        self.preprocessor
    }

    fn predict(&self, normalized: &str) -> Result<Prediction, ModelError> {
        let prediction = self.predict_normalized(normalized);
        if !(0.0..=1.0).contains(&prediction.confidence) {
            return Err(ModelError::Prediction(format!(
                "confidence {} out of range",
                prediction.confidence
            )));
        }
        Ok(prediction)
    }
}
