//! TF-IDF vectorizer over normalized email text.
//!
//! Smooth IDF (`ln((1 + n) / (1 + df)) + 1`), raw term counts, and L2 row
//! normalization. Tokens are runs of two or more word characters.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Sparse feature row: `(feature index, weight)` pairs sorted by index.
pub type SparseVector = Vec<(usize, f64)>;

/// Split normalized text into vectorizer tokens.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    TOKEN.find_iter(text).map(|m| m.as_str())
}

/// Fitted TF-IDF vectorizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Token → feature index. Indices follow sorted token order.
    vocabulary: BTreeMap<String, usize>,
    /// IDF weight per feature index.
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Fit on already-normalized documents.
    ///
    /// With `max_features`, only the most frequent tokens across the corpus
    /// are kept (ties broken alphabetically).
    pub fn fit<S: AsRef<str>>(documents: &[S], max_features: Option<usize>) -> Self {
        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        let mut term_frequency: HashMap<&str, usize> = HashMap::new();

        for doc in documents {
            let mut seen = HashSet::new();
            for token in tokenize(doc.as_ref()) {
                *term_frequency.entry(token).or_insert(0) += 1;
                if seen.insert(token) {
                    *document_frequency.entry(token).or_insert(0) += 1;
                }
            }
        }

        let mut kept: Vec<&str> = document_frequency.keys().copied().collect();
        if let Some(limit) = max_features {
            kept.sort_by(|a, b| term_frequency[b].cmp(&term_frequency[a]).then(a.cmp(b)));
            kept.truncate(limit);
        }
        kept.sort_unstable();

        let n = documents.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(kept.len());
        for (idx, token) in kept.into_iter().enumerate() {
            let df = document_frequency[token] as f64;
            idf.push(((1.0 + n) / (1.0 + df)).ln() + 1.0);
            vocabulary.insert(token.to_string(), idx);
        }

        Self { vocabulary, idf }
    }

    /// Number of features (vocabulary size).
    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    /// Transform one normalized document. Unknown tokens are ignored; a
    /// document with no known tokens yields an empty row.
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokenize(document) {
            if let Some(&idx) = self.vocabulary.get(token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut row: SparseVector = counts
            .into_iter()
            .map(|(idx, count)| (idx, count * self.idf[idx]))
            .collect();

        let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut row {
                *w /= norm;
            }
        }
        row
    }

    /// Check internal consistency after deserialization.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.vocabulary.len() != self.idf.len() {
            return Err(ModelError::Inconsistent(format!(
                "vocabulary has {} entries but idf has {}",
                self.vocabulary.len(),
                self.idf.len()
            )));
        }
        let mut seen = vec![false; self.idf.len()];
        for (token, &idx) in &self.vocabulary {
            if idx >= seen.len() || std::mem::replace(&mut seen[idx], true) {
                return Err(ModelError::Inconsistent(format!(
                    "token {token:?} has invalid feature index {idx}"
                )));
            }
        }
        if self.idf.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(ModelError::Inconsistent("non-positive idf weight".into()));
        }
        Ok(())
    }
}
