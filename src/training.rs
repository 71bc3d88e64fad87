//! Offline training: labelled dataset loading, hold-out split, evaluation.
//!
//! Datasets are JSON Lines, one `{"text": ..., "label": ...}` object per
//! line. Labels may be `"scam"`/`"spam"`/`1` or `"not_scam"`/`"ham"`/`0`.

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{DatasetError, ModelError, Result};
use crate::model::{Label, TfidfNbPipeline, TrainingOptions};

/// One labelled training example.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledEmail {
    pub text: String,
    pub label: Label,
}

impl LabeledEmail {
    pub fn new(text: impl Into<String>, label: Label) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(alias = "email_text")]
    text: String,
    label: RawLabel,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLabel {
    Number(i64),
    Text(String),
}

fn parse_label(raw: RawLabel) -> std::result::Result<Label, String> {
    match raw {
        RawLabel::Number(1) => Ok(Label::Scam),
        RawLabel::Number(0) => Ok(Label::NotScam),
        RawLabel::Number(n) => Err(format!("unknown numeric label {n}")),
        RawLabel::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "scam" | "spam" | "1" => Ok(Label::Scam),
            "not_scam" | "not scam" | "ham" | "legit" | "0" => Ok(Label::NotScam),
            other => Err(format!("unknown label {other:?}")),
        },
    }
}

/// Parse JSON Lines dataset content. Blank lines are skipped.
pub fn parse_jsonl(content: &str) -> std::result::Result<Vec<LabeledEmail>, DatasetError> {
    let mut records = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let invalid = |message: String| DatasetError::InvalidRecord {
            line: i + 1,
            message,
        };
        let raw: RawRecord = serde_json::from_str(line).map_err(|e| invalid(e.to_string()))?;
        let label = parse_label(raw.label).map_err(invalid)?;
        records.push(LabeledEmail::new(raw.text, label));
    }
    Ok(records)
}

/// Read a JSON Lines dataset from disk.
pub fn load_jsonl(path: &Path) -> Result<Vec<LabeledEmail>> {
    let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_jsonl(&content)?;
    if records.is_empty() {
        return Err(DatasetError::Empty {
            path: path.to_path_buf(),
        }
        .into());
    }
    info!(path = %path.display(), records = records.len(), "Dataset loaded");
    Ok(records)
}

/// Stratified shuffle split: `fraction` of each class goes to the test set.
///
/// Deterministic for a given `seed`. Returns `(train, test)`.
pub fn split_holdout(
    records: Vec<LabeledEmail>,
    fraction: f64,
    seed: u64,
) -> std::result::Result<(Vec<LabeledEmail>, Vec<LabeledEmail>), ModelError> {
    if !(0.0..1.0).contains(&fraction) {
        return Err(ModelError::InvalidParameter {
            name: "holdout",
            message: format!("must be in [0, 1), got {fraction}"),
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for label in Label::ALL {
        let mut class: Vec<_> = records.iter().filter(|r| r.label == label).cloned().collect();
        class.shuffle(&mut rng);
        let n_test = (class.len() as f64 * fraction).round() as usize;
        // Keep at least one example of each class for fitting.
        let n_test = n_test.min(class.len().saturating_sub(1));
        let rest = class.split_off(n_test);
        test.extend(class);
        train.extend(rest);
    }

    Ok((train, test))
}

/// Binary classification metrics with `Scam` as the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub samples: usize,
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
}

impl Evaluation {
    fn from_counts(tp: usize, fp: usize, tn: usize, fn_: usize) -> Self {
        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        let samples = tp + fp + tn + fn_;
        Self {
            samples,
            true_positive: tp,
            false_positive: fp,
            true_negative: tn,
            false_negative: fn_,
            accuracy: ratio(tp + tn, samples),
            precision: ratio(tp, tp + fp),
            recall: ratio(tp, tp + fn_),
        }
    }
}

/// Score `pipeline` on labelled records.
pub fn evaluate(pipeline: &TfidfNbPipeline, records: &[LabeledEmail]) -> Evaluation {
    let (mut tp, mut fp, mut tn, mut fn_) = (0, 0, 0, 0);
    for record in records {
        match (pipeline.predict_raw(&record.text).label, record.label) {
            (Label::Scam, Label::Scam) => tp += 1,
            (Label::Scam, Label::NotScam) => fp += 1,
            (Label::NotScam, Label::NotScam) => tn += 1,
            (Label::NotScam, Label::Scam) => fn_ += 1,
        }
    }
    Evaluation::from_counts(tp, fp, tn, fn_)
}

/// Settings for [`train`].
#[derive(Debug, Clone, Copy)]
pub struct TrainConfig {
    pub options: TrainingOptions,
    /// Fraction of each class held out for evaluation; `0.0` trains on all.
    pub holdout: f64,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            options: TrainingOptions::default(),
            holdout: 0.2,
            seed: 42,
        }
    }
}

/// Split, fit, and evaluate. The returned pipeline is fitted on the
/// training split only and carries the hold-out metrics in its summary.
pub fn train(records: Vec<LabeledEmail>, config: TrainConfig) -> Result<TfidfNbPipeline> {
    let (train_set, test_set) = split_holdout(records, config.holdout, config.seed)?;

    let texts: Vec<&str> = train_set.iter().map(|r| r.text.as_str()).collect();
    let labels: Vec<Label> = train_set.iter().map(|r| r.label).collect();
    let mut pipeline = TfidfNbPipeline::fit(&texts, &labels, config.options)?;

    if !test_set.is_empty() {
        let evaluation = evaluate(&pipeline, &test_set);
        info!(
            samples = evaluation.samples,
            accuracy = evaluation.accuracy,
            precision = evaluation.precision,
            recall = evaluation.recall,
            "Hold-out evaluation"
        );
        pipeline.set_holdout(evaluation);
    }

    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn records(n_scam: usize, n_ham: usize) -> Vec<LabeledEmail> {
        let scam = (0..n_scam).map(|i| (format!("claim prize {i}"), Label::Scam));
        let ham = (0..n_ham).map(|i| (format!("lunch plans {i}"), Label::NotScam));
        scam.chain(ham)
            .map(|(text, label)| LabeledEmail::new(text, label))
            .collect()
    }

    #[test]
    fn parses_all_label_spellings() {
        let content = r#"
{"text": "a", "label": "scam"}
{"text": "b", "label": "Not Scam"}
{"text": "c", "label": 1}
{"text": "d", "label": 0}
{"email_text": "e", "label": "ham"}
{"text": "f", "label": "SPAM"}
"#;
        let parsed = parse_jsonl(content).unwrap();
        let labels: Vec<_> = parsed.iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            vec![
                Label::Scam,
                Label::NotScam,
                Label::Scam,
                Label::NotScam,
                Label::NotScam,
                Label::Scam
            ]
        );
        assert_eq!(parsed[4].text, "e");
    }

    #[test]
    fn reports_line_number_of_bad_record() {
        let content = "{\"text\": \"a\", \"label\": \"scam\"}\n{\"text\": \"b\", \"label\": \"maybe\"}\n";
        let err = parse_jsonl(content).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidRecord { line: 2, .. }));
    }

    #[test]
    fn reports_malformed_json() {
        let err = parse_jsonl("{not json}").unwrap_err();
        assert!(matches!(err, DatasetError::InvalidRecord { line: 1, .. }));
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.jsonl");
        std::fs::write(&path, "\n\n").unwrap();
        assert!(matches!(
            load_jsonl(&path),
            Err(Error::Dataset(DatasetError::Empty { .. }))
        ));
    }

    #[test]
    fn missing_file_is_a_dataset_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_jsonl(&dir.path().join("absent.jsonl")).unwrap_err();
        assert!(matches!(err, Error::Dataset(DatasetError::Read { .. })));
        assert!(err.to_string().starts_with("Dataset error:"));
    }

    #[test]
    fn split_is_stratified_and_reproducible() {
        let (train_a, test_a) = split_holdout(records(10, 20), 0.2, 7).unwrap();
        let (train_b, test_b) = split_holdout(records(10, 20), 0.2, 7).unwrap();
        assert_eq!(test_a, test_b);
        assert_eq!(train_a, train_b);

        let scam_test = test_a.iter().filter(|r| r.label == Label::Scam).count();
        let ham_test = test_a.len() - scam_test;
        assert_eq!((scam_test, ham_test), (2, 4));
        assert_eq!(train_a.len(), 24);
    }

    #[test]
    fn split_keeps_one_example_per_class_for_training() {
        let (train, test) = split_holdout(records(1, 1), 0.9, 1).unwrap();
        assert_eq!(train.len(), 2);
        assert!(test.is_empty());
    }

    #[test]
    fn split_rejects_out_of_range_fraction() {
        assert!(split_holdout(records(2, 2), 1.0, 0).is_err());
        assert!(split_holdout(records(2, 2), -0.1, 0).is_err());
    }

    #[test]
    fn evaluation_metrics() {
        let e = Evaluation::from_counts(3, 1, 4, 2);
        assert_eq!(e.samples, 10);
        assert!((e.accuracy - 0.7).abs() < 1e-12);
        assert!((e.precision - 0.75).abs() < 1e-12);
        assert!((e.recall - 0.6).abs() < 1e-12);
    }

    #[test]
    fn evaluation_with_no_positive_predictions() {
        let e = Evaluation::from_counts(0, 0, 5, 0);
        assert_eq!(e.precision, 0.0);
        assert_eq!(e.recall, 0.0);
        assert_eq!(e.accuracy, 1.0);
    }

    #[test]
    fn train_records_holdout_metrics() {
        let config = TrainConfig {
            holdout: 0.2,
            ..Default::default()
        };
        let pipeline = train(records(10, 10), config).unwrap();
        let holdout = pipeline.summary().holdout.unwrap();
        assert_eq!(holdout.samples, 4);
        assert_eq!(pipeline.summary().documents, 16);
        assert_eq!(holdout.accuracy, 1.0);
    }

    #[test]
    fn train_without_holdout_uses_everything() {
        let config = TrainConfig {
            holdout: 0.0,
            ..Default::default()
        };
        let pipeline = train(records(3, 4), config).unwrap();
        assert_eq!(pipeline.summary().documents, 7);
        assert!(pipeline.summary().holdout.is_none());
    }
}
