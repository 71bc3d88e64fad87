//! Scam Classifier: labels email text as "Scam" or "Not Scam".

pub mod config;
pub mod error;
pub mod model;
pub mod preprocess;
pub mod server;
pub mod training;
