//! Classification models.
//!
//! A [`Classifier`] takes text that has already been through its own
//! [`Preprocessor`] and returns a [`Prediction`]. The HTTP layer only sees
//! this trait; [`TfidfNbPipeline`] is the real model and
//! [`KeywordClassifier`] is the opt-in fallback used when no artifact is
//! available.

pub mod fallback;
pub mod handle;
pub mod naive_bayes;
pub mod pipeline;
pub mod vectorizer;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::preprocess::Preprocessor;

pub use fallback::KeywordClassifier;
pub use handle::{ModelHandle, ModelInfo};
pub use naive_bayes::MultinomialNb;
pub use pipeline::{
    ARTIFACT_FORMAT_VERSION, ModelArtifact, TfidfNbPipeline, TrainingOptions, TrainingSummary,
};
pub use vectorizer::TfidfVectorizer;

/// Canonical classification labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "Not Scam")]
    NotScam,
    #[serde(rename = "Scam")]
    Scam,
}

impl Label {
    pub const ALL: [Label; 2] = [Label::NotScam, Label::Scam];

    /// Class index used by per-class arrays in the models.
    pub fn index(self) -> usize {
        match self {
            Self::NotScam => 0,
            Self::Scam => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotScam => "Not Scam",
            Self::Scam => "Scam",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label plus the classifier's probability for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "prediction")]
    pub label: Label,
    /// Always within `[0, 1]`.
    pub confidence: f64,
}

/// A loaded, read-only text classifier.
pub trait Classifier: Send + Sync {
    /// Short model family name reported by the health check.
    fn model_type(&self) -> &str;

    /// The normalizer this model expects its input to have gone through.
    fn preprocessor(&self) -> Preprocessor;

    /// Classify normalized text.
    fn predict(&self, normalized: &str) -> Result<Prediction, ModelError>;
}
