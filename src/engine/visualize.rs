use crate::engine::config::Config;
use crate::engine::error::SublineError;
use crate::metrics::{create_all_series, MetricKind, TokenMetrics};
use crate::rendering::{Plot, PlotRenderer, SvgRenderer};

/// Lay out one sequence with the requested metrics, in order
pub fn build_plot(
    metrics: &TokenMetrics,
    kinds: &[MetricKind],
    config: &Config,
) -> Result<Plot, SublineError> {
    let series = create_all_series(metrics, kinds)?;
    let plot = Plot::new(&metrics.tokens, series, config)?;
    tracing::debug!(
        tokens = metrics.len(),
        lines = plot.line_count(),
        series = plot.series.len(),
        "built plot"
    );
    Ok(plot)
}

/// Render every sequence of a batch with `renderer`
pub fn render_batch(
    batch: &[TokenMetrics],
    kinds: &[MetricKind],
    config: &Config,
    renderer: &dyn PlotRenderer,
) -> Result<Vec<Vec<u8>>, SublineError> {
    batch
        .iter()
        .map(|metrics| {
            let plot = build_plot(metrics, kinds, config)?;
            Ok(renderer.render(&plot)?)
        })
        .collect()
}

/// One SVG document per sequence; each gets its own id prefix so the
/// documents can share a page
pub fn visualize_batch(
    batch: &[TokenMetrics],
    kinds: &[MetricKind],
    config: &Config,
) -> Result<Vec<String>, SublineError> {
    batch
        .iter()
        .enumerate()
        .map(|(i, metrics)| {
            let plot = build_plot(metrics, kinds, config)?;
            Ok(SvgRenderer::with_id_prefix(&format!("subline-{}", i)).render_string(&plot))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::RasterRenderer;

    fn sample() -> TokenMetrics {
        TokenMetrics {
            tokens: vec!["I".into(), " am".into(), " a".into(), " model".into()],
            surprisal: vec![None, Some(3.0), Some(1.0), Some(6.0)],
            entropy: vec![None, Some(4.0), Some(2.0), Some(3.0)],
            vocab_size: 50257,
        }
    }

    #[test]
    fn test_build_plot_series_per_metric() {
        let plot = build_plot(&sample(), &[MetricKind::Entropy, MetricKind::S2], &Config::default())
            .unwrap();
        assert_eq!(plot.series.len(), 3);
        assert_eq!(plot.line_count(), 1);
    }

    #[test]
    fn test_visualize_batch_unique_prefixes() {
        let batch = vec![sample(), sample()];
        let svgs = visualize_batch(&batch, &[MetricKind::S2], &Config::default()).unwrap();
        assert_eq!(svgs.len(), 2);
        assert!(svgs[0].contains("subline-0-clip-0"));
        assert!(svgs[1].contains("subline-1-clip-0"));
    }

    #[test]
    fn test_render_batch_png() {
        let batch = vec![sample()];
        let renderer = RasterRenderer::new();
        let images = render_batch(&batch, &[MetricKind::Surprisal], &Config::default(), &renderer)
            .unwrap();
        assert_eq!(images.len(), 1);
        assert!(images[0].starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_invalid_metrics_fail() {
        let mut metrics = sample();
        metrics.entropy[2] = Some(f64::NAN);
        let result = build_plot(&metrics, &[MetricKind::Entropy], &Config::default());
        assert!(matches!(result, Err(SublineError::Metrics(_))));
    }
}
