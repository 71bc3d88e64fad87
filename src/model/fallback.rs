//! Keyword-count fallback classifier.
//!
//! Used only when the server is explicitly allowed to run without a trained
//! artifact. Flags text that contains at least [`SCAM_THRESHOLD`] distinct
//! scam phrases and reports a fixed confidence.

use tracing::debug;

use super::{Classifier, Label, Prediction};
use crate::error::ModelError;
use crate::preprocess::Preprocessor;

pub const MODEL_TYPE: &str = "KeywordFallback";

/// Distinct phrases needed for a `Scam` verdict.
pub const SCAM_THRESHOLD: usize = 3;

/// Confidence reported for every fallback verdict.
pub const FALLBACK_CONFIDENCE: f64 = 0.85;

/// Phrases in normalized form (lowercase, punctuation removed).
const SCAM_PHRASES: &[&str] = &[
    "urgent",
    "verify",
    "suspended",
    "click here",
    "prize",
    "winner",
    "congratulations",
    "bank account",
    "password",
    "confirm identity",
    "act now",
    "limited time",
    "free money",
    "nigerian prince",
    "inheritance",
    "tax refund",
    "claim now",
    "account locked",
    "unusual activity",
    "expires today",
    "verify your account",
    "confirm your identity",
    "update payment",
];

/// Phrase-matching classifier with no trained state.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    preprocessor: Preprocessor,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scam phrases present in normalized text.
    ///
    /// Phrases match anywhere, including inside longer words, so "winners"
    /// counts for "winner".
    pub fn score(&self, normalized: &str) -> usize {
        SCAM_PHRASES
            .iter()
            .filter(|phrase| normalized.contains(*phrase))
            .count()
    }
}

impl Classifier for KeywordClassifier {
    fn model_type(&self) -> &str {
        MODEL_TYPE
    }

    fn preprocessor(&self) -> Preprocessor {
        self.preprocessor
    }

    fn predict(&self, normalized: &str) -> Result<Prediction, ModelError> {
        let score = self.score(normalized);
        debug!(score, "Keyword fallback scored text");
        let label = if score >= SCAM_THRESHOLD {
            Label::Scam
        } else {
            Label::NotScam
        };
        Ok(Prediction {
            label,
            confidence: FALLBACK_CONFIDENCE,
        })
    }
}
