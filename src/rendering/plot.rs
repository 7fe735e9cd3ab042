//! Plot model shared by the SVG and raster backends
//!
//! A `Plot` is fully laid out: tokens are measured and wrapped, every line
//! knows where its text baseline and sparkline band sit, and every
//! (line, series) pair has its sparkline path. Backends only translate this
//! geometry into their output format.

use std::ops::Range;

use super::font::{measure_for, TextMeasure};
use super::layout::{token_boxes, wrap_lines, TokenBox};
use super::renderer::RenderError;
use super::sparkline::{build_sparkline_boxes, SparklineOptions, SparklinePath};
use crate::engine::config::Config;
use crate::metrics::Series;

/// Width reserved per legend entry before its label
const LEGEND_SAMPLE_WIDTH: f32 = 20.0;
const LEGEND_ITEM_SPACING: f32 = 40.0;
/// Approximate label glyph advance at the legend font size
const LEGEND_CHAR_WIDTH: f32 = 5.0;
pub const LEGEND_FONT_SIZE: f32 = 10.0;

/// One wrapped line of text with its sparklines
#[derive(Debug, Clone)]
pub struct PlotLine {
    /// Token indices on this line
    pub range: Range<usize>,
    /// Text baseline, in plot coordinates
    pub baseline_y: f32,
    /// Top edge of the sparkline band
    pub band_top: f32,
    /// Sum of token widths on this line
    pub width: f32,
    /// One path per series. Paths start one token early and end one token
    /// late where neighbours exist, so curves enter and leave the line
    /// smoothly; backends clip them to `[0, width]`.
    pub paths: Vec<SparklinePath>,
    /// Per-token start offsets relative to the line start
    pub token_offsets: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct LegendEntry {
    pub label: String,
    pub x: f32,
    pub dasharray: String,
    pub series_index: usize,
}

#[derive(Debug, Clone)]
pub struct Plot {
    pub tokens: Vec<String>,
    pub boxes: Vec<TokenBox>,
    pub lines: Vec<PlotLine>,
    pub series: Vec<Series>,
    pub legend: Vec<LegendEntry>,
    /// Vertical center of the legend row
    pub legend_y: f32,
    pub width: f32,
    pub height: f32,
    pub config: Config,
    pub measure: TextMeasure,
}

impl Plot {
    /// Lay out `tokens` with `series`, measuring text per `config.layout`
    pub fn new<S: AsRef<str>>(
        tokens: &[S],
        series: Vec<Series>,
        config: &Config,
    ) -> Result<Self, RenderError> {
        let layout = &config.layout;
        let measure = measure_for(layout.font_path.as_deref(), layout.font_size, layout.char_width);
        Self::with_measure(tokens, series, config, measure)
    }

    pub fn with_measure<S: AsRef<str>>(
        tokens: &[S],
        series: Vec<Series>,
        config: &Config,
        measure: TextMeasure,
    ) -> Result<Self, RenderError> {
        for s in &series {
            if s.len() != tokens.len() {
                return Err(RenderError::SeriesLength {
                    label: s.label.clone(),
                    tokens: tokens.len(),
                    values: s.len(),
                });
            }
        }

        let layout = &config.layout;
        let spark = &config.sparkline;
        let boxes = token_boxes(tokens, &measure);
        let widths: Vec<f32> = boxes.iter().map(|b| b.width).collect();
        let ranges = wrap_lines(&boxes, layout.max_line_width());

        let options = SparklineOptions {
            scale: spark.scale,
            overflow: spark.overflow,
            interpolation: spark.interpolation,
            anchor: spark.anchor,
            gaps: spark.gap_policy,
            plateaus: spark.plateaus,
        };
        let full_line_height = layout.font_size + spark.height + layout.line_gap;

        let mut lines = Vec::with_capacity(ranges.len());
        for (i, range) in ranges.into_iter().enumerate() {
            let top = layout.margin + i as f32 * full_line_height;
            let baseline_y = top + layout.font_size + 1.0;

            let peek = range.start.saturating_sub(1)..(range.end + 1).min(tokens.len());
            let lead = if peek.start < range.start {
                widths[peek.start]
            } else {
                0.0
            };

            let mut paths = Vec::with_capacity(series.len());
            for s in &series {
                let mut path = build_sparkline_boxes(
                    &boxes[peek.clone()],
                    &s.values[peek.clone()],
                    spark.height,
                    options,
                )?;
                shift_path(&mut path, -lead);
                paths.push(path);
            }

            let mut offset = 0.0;
            let token_offsets = widths[range.clone()]
                .iter()
                .map(|w| {
                    let start = offset;
                    offset += w;
                    start
                })
                .collect();

            tracing::debug!(line = i, tokens = range.len(), width = offset, "laid out line");
            lines.push(PlotLine {
                range,
                baseline_y,
                band_top: baseline_y + 1.0,
                width: offset,
                paths,
                token_offsets,
            });
        }

        let mut legend = Vec::with_capacity(series.len());
        let mut legend_x = 0.0;
        for (index, s) in series.iter().enumerate() {
            legend.push(LegendEntry {
                label: s.label.clone(),
                x: legend_x,
                dasharray: s.dasharray.clone(),
                series_index: index,
            });
            legend_x += LEGEND_ITEM_SPACING + s.label.chars().count() as f32 * LEGEND_CHAR_WIDTH;
        }

        let content_height = lines.len() as f32 * full_line_height;
        let legend_height = layout.font_size;
        let legend_y = layout.margin + content_height + legend_height / 2.0;
        let height = content_height + legend_height + 2.0 * layout.margin;

        let widest_line = lines.iter().map(|l| l.width).fold(0.0, f32::max);
        let text_width = layout.max_line_width().max(widest_line);
        let width = text_width.max(legend_x + LEGEND_SAMPLE_WIDTH) + 2.0 * layout.margin;

        Ok(Self {
            tokens: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
            boxes,
            lines,
            series,
            legend,
            legend_y,
            width,
            height,
            config: config.clone(),
            measure,
        })
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Token baseline segments for a line: first to last glyph midpoint of
    /// each token, relative to the line start
    pub fn baseline_segments(&self, line: &PlotLine) -> Vec<(f32, f32)> {
        self.boxes[line.range.clone()]
            .iter()
            .zip(&line.token_offsets)
            .map(|(b, x)| (x + b.first_char, x + b.last_char))
            .collect()
    }
}

fn shift_path(path: &mut SparklinePath, dx: f32) {
    if dx == 0.0 {
        return;
    }
    for point in path.segments.iter_mut().flatten() {
        point.x += dx;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_columns(chars_per_line: usize) -> Config {
        let mut config = Config::default();
        config.layout.chars_per_line = chars_per_line;
        config.layout.char_width = 10.0;
        config
    }

    fn flat(label: &str, n: usize) -> Series {
        Series::new(label, (0..n).map(|i| Some(i as f64 / n as f64)).collect())
    }

    #[test]
    fn test_single_line_plot() {
        let tokens = ["The", " cat", " sat"];
        let plot = Plot::new(&tokens, vec![flat("a", 3)], &config_with_columns(80)).unwrap();

        assert_eq!(plot.line_count(), 1);
        let line = &plot.lines[0];
        assert_eq!(line.range, 0..3);
        assert_eq!(line.width, 110.0);
        assert_eq!(line.token_offsets, vec![0.0, 30.0, 70.0]);
        // no neighbours to peek at: one point per token
        assert_eq!(line.paths[0].point_count(), 3);
    }

    #[test]
    fn test_wrapped_lines_peek_at_neighbours() {
        let tokens = ["aaaa", "bbbb", "cccc", "dddd", "eeee", "ffff"];
        let plot = Plot::new(&tokens, vec![flat("a", 6)], &config_with_columns(8)).unwrap();

        assert_eq!(plot.line_count(), 3);
        let middle = &plot.lines[1];
        assert_eq!(middle.range, 2..4);
        let path = &middle.paths[0];
        assert_eq!(path.point_count(), 4);

        // centered anchors shifted back by the leading context token
        let xs: Vec<f32> = path.points().map(|p| p.x).collect();
        assert_eq!(xs, vec![-20.0, 20.0, 60.0, 100.0]);

        let last = &plot.lines[2];
        assert_eq!(last.paths[0].point_count(), 3);
    }

    #[test]
    fn test_line_geometry_advances() {
        let tokens = ["aaaa", "bbbb", "cccc"];
        let config = config_with_columns(4);
        let plot = Plot::new(&tokens, vec![], &config).unwrap();

        let step = config.layout.font_size + config.sparkline.height + config.layout.line_gap;
        assert_eq!(plot.lines[0].baseline_y, config.layout.margin + config.layout.font_size + 1.0);
        assert!((plot.lines[1].baseline_y - plot.lines[0].baseline_y - step).abs() < 1e-4);
        assert_eq!(plot.lines[0].band_top, plot.lines[0].baseline_y + 1.0);
        assert!(plot.height > 3.0 * step);
    }

    #[test]
    fn test_series_length_mismatch() {
        let tokens = ["a", "b"];
        let result = Plot::new(&tokens, vec![flat("short", 1)], &Config::default());
        match result {
            Err(RenderError::SeriesLength { label, tokens, values }) => {
                assert_eq!(label, "short");
                assert_eq!(tokens, 2);
                assert_eq!(values, 1);
            }
            other => panic!("Expected SeriesLength, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_non_finite_value_fails() {
        let tokens = ["a", "b"];
        let series = Series::new("bad", vec![Some(0.1), Some(f64::NAN)]);
        let result = Plot::new(&tokens, vec![series], &Config::default());
        assert!(matches!(result, Err(RenderError::Sparkline(_))));
    }

    #[test]
    fn test_leading_gap_is_allowed() {
        let tokens = ["a", "b", "c"];
        let series = Series::new("s", vec![None, Some(0.2), Some(0.8)]);
        let plot = Plot::new(&tokens, vec![series], &Config::default()).unwrap();
        assert_eq!(plot.lines[0].paths[0].point_count(), 2);
    }

    #[test]
    fn test_empty_tokens() {
        let tokens: [&str; 0] = [];
        let plot = Plot::new(&tokens, vec![Series::new("s", vec![])], &Config::default()).unwrap();
        assert_eq!(plot.line_count(), 0);
        assert!(plot.width > 0.0 && plot.height > 0.0);
    }

    #[test]
    fn test_legend_entries_advance() {
        let tokens = ["a"];
        let series = vec![flat("+S₂", 1), flat("-S₂", 1).with_dasharray("3")];
        let plot = Plot::new(&tokens, series, &Config::default()).unwrap();
        assert_eq!(plot.legend.len(), 2);
        assert_eq!(plot.legend[0].x, 0.0);
        assert_eq!(plot.legend[1].x, 40.0 + 3.0 * 5.0);
        assert_eq!(plot.legend[1].dasharray, "3");
    }

    #[test]
    fn test_baseline_segments() {
        let tokens = ["ab", "c"];
        let plot = Plot::new(&tokens, vec![], &config_with_columns(80)).unwrap();
        let segments = plot.baseline_segments(&plot.lines[0]);
        assert_eq!(segments, vec![(5.0, 15.0), (25.0, 25.0)]);
    }

    #[test]
    fn test_s2_pair_is_not_flattened_at_band_edges() {
        use crate::metrics::{create_series, MetricKind, TokenMetrics};

        let metrics = TokenMetrics {
            tokens: vec!["a".into(), " b".into(), " c".into(), " d".into()],
            surprisal: vec![None, Some(5.0), Some(6.0), Some(7.0)],
            entropy: vec![None, Some(1.0), Some(1.0), Some(1.0)],
            vocab_size: 100,
        };
        let series = create_series(&metrics, MetricKind::S2).unwrap();
        let plot = Plot::new(&metrics.tokens[..], series, &Config::default()).unwrap();
        let line = &plot.lines[0];
        let height = plot.config.sparkline.height;

        let plus: Vec<f32> = line.paths[0].points().map(|p| p.y).collect();
        assert_eq!(plus.len(), 3);
        assert!(plus.windows(2).all(|w| w[1] > w[0]));
        assert!(plus[2] > height);

        // -S₂ is below the band floor wherever S₂ > 0, so nothing is drawn
        assert!(line.paths[1].points().all(|p| p.y < 0.0));
    }

    #[test]
    fn test_plateaus_for_wide_tokens() {
        let mut config = config_with_columns(80);
        config.sparkline.plateaus = true;
        let tokens = ["a", " bcd"];
        let series = Series::new("s", vec![Some(0.25), Some(0.75)]);
        let plot = Plot::new(&tokens, vec![series], &config).unwrap();

        let points: Vec<(f32, f32)> = plot.lines[0].paths[0].points().map(|p| (p.x, p.y)).collect();
        assert_eq!(points, vec![(5.0, 5.0), (15.0, 15.0), (45.0, 15.0)]);
    }
}
