//! Per-position information metrics from a predictive distribution
//!
//! The inference collaborator hands us, for every position after the first,
//! a probability distribution over the vocabulary plus the token that was
//! actually observed next. Everything here is in nats.

use serde::Deserialize;

use super::MetricsError;

/// Probabilities are floored here before taking logs for entropy
const PROB_FLOOR: f64 = 1e-10;

/// Allowed deviation of a distribution's total mass from 1
const MASS_TOLERANCE: f64 = 1e-3;

/// One position's predictive distribution and the realized next token
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    pub probs: Vec<f64>,
    pub next_token: usize,
}

impl Prediction {
    pub fn new(probs: Vec<f64>, next_token: usize) -> Self {
        Self { probs, next_token }
    }

    /// Build from raw logits using a numerically stable softmax
    pub fn from_logits(logits: &[f64], next_token: usize) -> Result<Self, MetricsError> {
        let log_probs = log_softmax(logits)?;
        Ok(Self {
            probs: log_probs.into_iter().map(f64::exp).collect(),
            next_token,
        })
    }

    pub fn vocab_size(&self) -> usize {
        self.probs.len()
    }

    /// Check that this is a proper distribution with an in-range next token
    pub fn validate(&self, position: usize) -> Result<(), MetricsError> {
        let invalid = |reason: String| MetricsError::InvalidDistribution { position, reason };

        if self.probs.is_empty() {
            return Err(invalid("empty distribution".to_string()));
        }
        if self.next_token >= self.probs.len() {
            return Err(invalid(format!(
                "next token {} outside vocabulary of {}",
                self.next_token,
                self.probs.len()
            )));
        }
        if let Some((i, p)) = self
            .probs
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p < 0.0)
        {
            return Err(invalid(format!("probability {} at index {}", p, i)));
        }
        let mass: f64 = self.probs.iter().sum();
        if (mass - 1.0).abs() > MASS_TOLERANCE {
            return Err(invalid(format!("probabilities sum to {}", mass)));
        }
        Ok(())
    }

    /// Negative log-probability of the realized token
    pub fn surprisal(&self) -> f64 {
        -self.probs[self.next_token].max(PROB_FLOOR).ln()
    }

    /// Expected surprisal of the distribution
    pub fn entropy(&self) -> f64 {
        -self
            .probs
            .iter()
            .map(|&p| {
                let p = p.max(PROB_FLOOR);
                p * p.ln()
            })
            .sum::<f64>()
    }

    /// Surprise about the surprise: observed minus expected surprisal
    pub fn s2(&self) -> f64 {
        self.surprisal() - self.entropy()
    }
}

/// `log(softmax(logits))`, shifted by the max logit for stability
pub fn log_softmax(logits: &[f64]) -> Result<Vec<f64>, MetricsError> {
    if logits.is_empty() {
        return Err(MetricsError::InvalidLogits("empty logits".to_string()));
    }
    if let Some((i, v)) = logits.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(MetricsError::InvalidLogits(format!(
            "non-finite logit {} at index {}",
            v, i
        )));
    }

    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let log_sum = logits.iter().map(|&v| (v - max).exp()).sum::<f64>().ln();
    Ok(logits.iter().map(|&v| v - max - log_sum).collect())
}
