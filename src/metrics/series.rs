use std::fmt;
use std::str::FromStr;

use super::token::TokenMetrics;
use super::MetricsError;

/// Metrics that can be drawn under the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Surprisal,
    Entropy,
    S2,
}

impl FromStr for MetricKind {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "surprisal" => Ok(Self::Surprisal),
            "entropy" => Ok(Self::Entropy),
            "s2" => Ok(Self::S2),
            other => Err(MetricsError::UnknownMetric(other.to_string())),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surprisal => write!(f, "surprisal"),
            Self::Entropy => write!(f, "entropy"),
            Self::S2 => write!(f, "s2"),
        }
    }
}

/// A labelled, styled sequence of values, one per token
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub values: Vec<Option<f64>>,
    /// Explicit color; palette color is used when `None`
    pub color: Option<String>,
    /// SVG stroke-dasharray, empty for a solid line
    pub dasharray: String,
}

impl Series {
    pub fn new(label: &str, values: Vec<Option<f64>>) -> Self {
        Self {
            label: label.to_string(),
            values,
            color: None,
            dasharray: String::new(),
        }
    }

    pub fn with_dasharray(mut self, dasharray: &str) -> Self {
        self.dasharray = dasharray.to_string();
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Build the series for one metric, normalized by the maximum possible
/// entropy `ln(vocab_size)` so values land roughly in `[0, 1]`
///
/// S₂ yields two series: `+S₂` and its dashed mirror `-S₂`, so that both
/// more- and less-surprising-than-expected tokens show above the baseline.
pub fn create_series(metrics: &TokenMetrics, kind: MetricKind) -> Result<Vec<Series>, MetricsError> {
    metrics.validate()?;
    let max_entropy = (metrics.vocab_size as f64).ln();
    let normalize = |values: &[Option<f64>]| -> Vec<Option<f64>> {
        values.iter().map(|v| v.map(|v| v / max_entropy)).collect()
    };

    let series = match kind {
        MetricKind::Surprisal => vec![Series::new("Surprisal", normalize(&metrics.surprisal))],
        MetricKind::Entropy => vec![Series::new("Entropy", normalize(&metrics.entropy))],
        MetricKind::S2 => {
            let s2 = normalize(&metrics.s2());
            let negated = s2.iter().map(|v| v.map(|v| -v)).collect();
            vec![
                Series::new("+S₂", s2),
                Series::new("-S₂", negated).with_dasharray("3"),
            ]
        }
    };
    Ok(series)
}

/// Series for every requested metric, in order; duplicates are kept
pub fn create_all_series(
    metrics: &TokenMetrics,
    kinds: &[MetricKind],
) -> Result<Vec<Series>, MetricsError> {
    let mut all = Vec::new();
    for &kind in kinds {
        all.extend(create_series(metrics, kind)?);
    }
    Ok(all)
}
