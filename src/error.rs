//! Error types for the scam classifier.

use std::path::PathBuf;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors loading, saving, fitting or running the classification pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model artifact not found at {}", path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("Failed to read model artifact {}: {source}", path.display())]
    ArtifactUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Model artifact {} is malformed: {source}", path.display())]
    ArtifactMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model artifact format version {found} is incompatible (expected {expected})")]
    IncompatibleVersion { found: u32, expected: u32 },

    #[error("Model artifact is inconsistent: {0}")]
    Inconsistent(String),

    #[error("Cannot train on an empty dataset")]
    EmptyTrainingSet,

    #[error("Training data must contain both classes (scam: {scam}, not scam: {not_scam})")]
    SingleClass { scam: usize, not_scam: usize },

    #[error("Invalid hyperparameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("A model is already installed")]
    AlreadyInstalled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reading a labelled training dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to read dataset {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: {message}")]
    InvalidRecord { line: usize, message: String },

    #[error("Dataset {} contains no records", path.display())]
    Empty { path: PathBuf },
}

/// Client-facing request failures.
///
/// Each variant maps onto one HTTP status in `server::routes`. Only the
/// validation variants carry their message to the client.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("No data provided")]
    NoData,

    #[error("Email text is required")]
    EmptyText,

    #[error("Email text must be a string")]
    NotText,

    #[error("Email text is too short. Please provide at least {min_chars} characters.")]
    TooShort { min_chars: usize },

    #[error("Request body is too large (limit {limit_bytes} bytes)")]
    TooLarge { limit_bytes: usize },

    #[error("Model is not loaded")]
    ModelUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
