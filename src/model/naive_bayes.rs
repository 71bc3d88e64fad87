//! Multinomial Naive Bayes over TF-IDF rows.

use serde::{Deserialize, Serialize};

use super::Label;
use super::vectorizer::SparseVector;
use crate::error::ModelError;

/// Fitted two-class multinomial Naive Bayes model.
///
/// Per-class vectors are indexed by [`Label::index`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    /// Additive (Laplace/Lidstone) smoothing.
    alpha: f64,
    class_count: [u64; 2],
    class_log_prior: [f64; 2],
    feature_log_prob: [Vec<f64>; 2],
}

impl MultinomialNb {
    pub fn fit(
        rows: &[SparseVector],
        labels: &[Label],
        n_features: usize,
        alpha: f64,
    ) -> Result<Self, ModelError> {
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(ModelError::InvalidParameter {
                name: "alpha",
                message: format!("must be a positive number, got {alpha}"),
            });
        }
        if rows.len() != labels.len() {
            return Err(ModelError::Inconsistent(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        let mut class_count = [0u64; 2];
        let mut feature_count = [vec![0.0; n_features], vec![0.0; n_features]];
        for (row, label) in rows.iter().zip(labels) {
            let c = label.index();
            class_count[c] += 1;
            for &(idx, weight) in row {
                feature_count[c][idx] += weight;
            }
        }

        let [not_scam, scam] = class_count;
        if not_scam == 0 || scam == 0 {
            return Err(ModelError::SingleClass {
                scam: scam as usize,
                not_scam: not_scam as usize,
            });
        }

        let total = rows.len() as f64;
        let class_log_prior = class_count.map(|count| (count as f64 / total).ln());
        let feature_log_prob = feature_count.map(|counts| {
            let denom = (counts.iter().sum::<f64>() + alpha * n_features as f64).ln();
            counts.iter().map(|c| (c + alpha).ln() - denom).collect::<Vec<f64>>()
        });

        Ok(Self {
            alpha,
            class_count,
            class_log_prior,
            feature_log_prob,
        })
    }

    pub fn n_features(&self) -> usize {
        self.feature_log_prob[0].len()
    }

    pub fn class_count(&self) -> [u64; 2] {
        self.class_count
    }

    /// Posterior probability per class, indexed by [`Label::index`].
    pub fn predict_proba(&self, row: &SparseVector) -> [f64; 2] {
        let jll: [f64; 2] = std::array::from_fn(|c| {
            let log_prob = &self.feature_log_prob[c];
            self.class_log_prior[c] + row.iter().map(|&(i, w)| w * log_prob[i]).sum::<f64>()
        });

        let max = jll[0].max(jll[1]);
        let log_norm = max + jll.iter().map(|j| (j - max).exp()).sum::<f64>().ln();
        jll.map(|j| (j - log_norm).exp())
    }

    /// Most probable label with its probability. Ties go to `NotScam`.
    pub fn predict(&self, row: &SparseVector) -> (Label, f64) {
        let proba = self.predict_proba(row);
        let label = if proba[Label::Scam.index()] > proba[Label::NotScam.index()] {
            Label::Scam
        } else {
            Label::NotScam
        };
        (label, proba[label.index()].clamp(0.0, 1.0))
    }

    /// Check internal consistency after deserialization.
    pub fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        if self.feature_log_prob.iter().any(|v| v.len() != n_features) {
            return Err(ModelError::Inconsistent(format!(
                "classifier expects {} features, vectorizer has {n_features}",
                self.n_features()
            )));
        }
        let finite = self.class_log_prior.iter().all(|p| p.is_finite())
            && self.feature_log_prob.iter().flatten().all(|p| p.is_finite());
        if !finite {
            return Err(ModelError::Inconsistent("non-finite log probability".into()));
        }
        Ok(())
    }
}
