//! Token-level information metrics
//!
//! - **distribution.rs**: surprisal, entropy and S₂ for one predictive distribution
//! - **token.rs**: per-sequence `TokenMetrics` built from the inference output
//! - **series.rs**: normalized, labelled series ready for plotting

pub mod distribution;
pub mod series;
pub mod token;

use thiserror::Error;

pub use distribution::{log_softmax, Prediction};
pub use series::{create_all_series, create_series, MetricKind, Series};
pub use token::{clean_token_for_display, TokenMetrics};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("Invalid distribution at position {position}: {reason}")]
    InvalidDistribution { position: usize, reason: String },

    #[error("Invalid logits: {0}")]
    InvalidLogits(String),

    #[error("Expected one prediction per token after the first: {tokens} tokens, {predictions} predictions")]
    PredictionCount { tokens: usize, predictions: usize },

    #[error("{metric} has {values} values for {tokens} tokens")]
    LengthMismatch {
        metric: &'static str,
        tokens: usize,
        values: usize,
    },

    #[error("Non-finite {metric} value {value} at token {index}")]
    NonFiniteMetric {
        metric: &'static str,
        index: usize,
        value: f64,
    },

    #[error("Vocabulary size {0} is too small to normalize against")]
    VocabularyTooSmall(usize),

    #[error("Unknown metric: {0} (expected surprisal, entropy or s2)")]
    UnknownMetric(String),
}
