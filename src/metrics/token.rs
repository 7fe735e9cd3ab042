use serde::Deserialize;

use super::distribution::Prediction;
use super::MetricsError;

/// Per-token metrics for one text sequence
///
/// `surprisal[i]` and `entropy[i]` describe token `i` as predicted from the
/// tokens before it, so the first token has no value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenMetrics {
    pub tokens: Vec<String>,
    pub surprisal: Vec<Option<f64>>,
    pub entropy: Vec<Option<f64>>,
    pub vocab_size: usize,
}

impl TokenMetrics {
    /// Compute metrics from the inference collaborator's output
    ///
    /// `predictions[i]` is the distribution after seeing tokens `0..=i`, so it
    /// describes token `i + 1`.
    pub fn from_predictions<S: AsRef<str>>(
        tokens: &[S],
        predictions: &[Prediction],
        vocab_size: usize,
    ) -> Result<Self, MetricsError> {
        let expected = tokens.len().saturating_sub(1);
        if predictions.len() != expected {
            return Err(MetricsError::PredictionCount {
                tokens: tokens.len(),
                predictions: predictions.len(),
            });
        }

        let mut surprisal = Vec::with_capacity(tokens.len());
        let mut entropy = Vec::with_capacity(tokens.len());
        if !tokens.is_empty() {
            surprisal.push(None);
            entropy.push(None);
        }

        for (position, prediction) in predictions.iter().enumerate() {
            prediction.validate(position + 1)?;
            if prediction.vocab_size() != vocab_size {
                return Err(MetricsError::InvalidDistribution {
                    position: position + 1,
                    reason: format!(
                        "distribution over {} entries, vocabulary is {}",
                        prediction.vocab_size(),
                        vocab_size
                    ),
                });
            }
            surprisal.push(Some(prediction.surprisal()));
            entropy.push(Some(prediction.entropy()));
        }

        let metrics = Self {
            tokens: tokens
                .iter()
                .map(|t| clean_token_for_display(t.as_ref()))
                .collect(),
            surprisal,
            entropy,
            vocab_size,
        };
        tracing::debug!(
            tokens = metrics.len(),
            vocab_size,
            "computed token metrics"
        );
        Ok(metrics)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Check shapes and values of metrics that came from outside
    pub fn validate(&self) -> Result<(), MetricsError> {
        for (name, values) in [("surprisal", &self.surprisal), ("entropy", &self.entropy)] {
            if values.len() != self.tokens.len() {
                return Err(MetricsError::LengthMismatch {
                    metric: name,
                    tokens: self.tokens.len(),
                    values: values.len(),
                });
            }
            if let Some((index, v)) = values
                .iter()
                .enumerate()
                .find_map(|(i, v)| v.filter(|v| !v.is_finite()).map(|v| (i, v)))
            {
                return Err(MetricsError::NonFiniteMetric {
                    metric: name,
                    index,
                    value: v,
                });
            }
        }
        if self.vocab_size < 2 {
            return Err(MetricsError::VocabularyTooSmall(self.vocab_size));
        }
        Ok(())
    }

    /// S₂ per token: surprisal minus entropy, where both are present
    pub fn s2(&self) -> Vec<Option<f64>> {
        self.surprisal
            .iter()
            .zip(&self.entropy)
            .map(|(s, h)| Some((*s)? - (*h)?))
            .collect()
    }

    /// Mean entropy over tokens that have one
    pub fn sequence_entropy(&self) -> Option<f64> {
        mean(&self.entropy)
    }

    /// `exp` of the mean surprisal
    pub fn sequence_perplexity(&self) -> Option<f64> {
        mean(&self.surprisal).map(f64::exp)
    }
}

fn mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Make whitespace control characters visible
pub fn clean_token_for_display(token: &str) -> String {
    token.replace('\n', "↵").replace('\t', "→")
}
