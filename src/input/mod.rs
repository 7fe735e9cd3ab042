//! Loading token metrics produced by the inference collaborator
//!
//! Two JSON shapes are accepted:
//! - precomputed metrics: `tokens`, `surprisal`, `entropy`, `vocab_size`
//! - raw predictions: `tokens`, `vocab_size`, `predictions` (each with either
//!   `probs` or `logits`, plus `next_token`)
//!
//! A file may hold a single document or an array of documents (a batch).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::metrics::{MetricsError, Prediction, TokenMetrics};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sequence {index}: {source}")]
    Document {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid input shape: {0}")]
    Shape(String),

    #[error("Invalid metrics: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Input contains no sequences")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    probs: Option<Vec<f64>>,
    logits: Option<Vec<f64>>,
    next_token: usize,
}

impl RawPrediction {
    fn into_prediction(self, position: usize) -> Result<Prediction, LoadError> {
        match (self.probs, self.logits) {
            (Some(probs), None) => Ok(Prediction::new(probs, self.next_token)),
            (None, Some(logits)) => Ok(Prediction::from_logits(&logits, self.next_token)?),
            _ => Err(LoadError::Shape(format!(
                "prediction {} needs exactly one of `probs` or `logits`",
                position
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PredictionsDocument {
    tokens: Vec<String>,
    vocab_size: usize,
    predictions: Vec<RawPrediction>,
}

impl PredictionsDocument {
    fn into_metrics(self) -> Result<TokenMetrics, LoadError> {
        let predictions = self
            .predictions
            .into_iter()
            .enumerate()
            .map(|(i, p)| p.into_prediction(i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TokenMetrics::from_predictions(
            &self.tokens,
            &predictions,
            self.vocab_size,
        )?)
    }
}

/// Documents carrying a `predictions` key are raw predictions; anything else
/// must be precomputed metrics
fn parse_document(index: usize, value: Value) -> Result<TokenMetrics, LoadError> {
    let document_err = |source| LoadError::Document { index, source };
    let is_predictions = value
        .as_object()
        .is_some_and(|object| object.contains_key("predictions"));

    if is_predictions {
        let document: PredictionsDocument =
            serde_json::from_value(value).map_err(document_err)?;
        document.into_metrics()
    } else {
        let metrics: TokenMetrics = serde_json::from_value(value).map_err(document_err)?;
        metrics.validate()?;
        Ok(metrics)
    }
}

/// Parse one or more sequences from a JSON string
pub fn parse_token_metrics(json: &str) -> Result<Vec<TokenMetrics>, LoadError> {
    let documents = match serde_json::from_str::<Value>(json)? {
        Value::Array(documents) => documents,
        document @ Value::Object(_) => vec![document],
        _ => {
            return Err(LoadError::Shape(
                "expected a JSON object or an array of objects".to_string(),
            ))
        }
    };
    if documents.is_empty() {
        return Err(LoadError::Empty);
    }

    documents
        .into_iter()
        .enumerate()
        .map(|(index, document)| parse_document(index, document))
        .collect()
}

pub fn load_token_metrics<P: AsRef<Path>>(path: P) -> Result<Vec<TokenMetrics>, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let batch = parse_token_metrics(&content)?;
    tracing::info!(path = %path.display(), sequences = batch.len(), "loaded token metrics");
    Ok(batch)
}
