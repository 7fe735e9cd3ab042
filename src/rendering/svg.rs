//! SvgRenderer - vector output embeddable inline with text
//!
//! Colors are CSS variables so the host page (or the viewer's color scheme)
//! can restyle the plot without re-rendering. Output is deterministic:
//! element ids come from a configurable prefix plus the line index, and all
//! numbers are formatted with fixed precision.

use std::fmt::Write;

use super::plot::{Plot, PlotLine, LEGEND_FONT_SIZE};
use super::renderer::{PlotRenderer, RenderError};
use crate::engine::config::ThemeConfig;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Offset of the text baseline relative to the line's nominal baseline
const TEXT_BASELINE_SHIFT: f32 = -0.2;

/// Half-length added to each end of a token baseline segment
const BASELINE_OVERHANG: f32 = 0.2;

pub struct SvgRenderer {
    id_prefix: String,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self {
            id_prefix: "subline".to_string(),
        }
    }

    /// Use a distinct prefix when several plots share one HTML page
    pub fn with_id_prefix(prefix: &str) -> Self {
        Self {
            id_prefix: prefix.to_string(),
        }
    }

    /// Render straight to a `String`
    pub fn render_string(&self, plot: &Plot) -> String {
        let mut doc = SvgWriter::default();

        doc.open(
            "svg",
            &[
                ("xmlns", SVG_NS.to_string()),
                ("class", self.id_prefix.clone()),
                ("viewBox", format!("0 0 {} {}", num(plot.width), num(plot.height))),
                ("width", num(plot.width)),
                ("height", num(plot.height)),
            ],
        );
        doc.element_with_text(
            "style",
            &[],
            &theme_css(&self.id_prefix, &plot.config.theme, &plot.config.layout.font_family),
        );
        doc.empty(
            "rect",
            &[
                ("width", "100%".to_string()),
                ("height", "100%".to_string()),
                ("fill", "var(--bg-color)".to_string()),
            ],
        );

        for (i, line) in plot.lines.iter().enumerate() {
            self.write_text_line(&mut doc, plot, line);
            self.write_sparklines(&mut doc, plot, line, i);
        }
        self.write_legend(&mut doc, plot);

        doc.close("svg");
        doc.finish()
    }

    fn write_text_line(&self, doc: &mut SvgWriter, plot: &Plot, line: &PlotLine) {
        let layout = &plot.config.layout;
        doc.open(
            "g",
            &[(
                "transform",
                format!("translate({}, {})", num(layout.margin), num(line.baseline_y)),
            )],
        );
        doc.open(
            "text",
            &[
                ("font-size", num(layout.font_size)),
                ("y", num(layout.font_size * TEXT_BASELINE_SHIFT)),
                ("text-anchor", "middle".to_string()),
                ("fill", "var(--col-text)".to_string()),
            ],
        );
        for (index, offset) in line.range.clone().zip(&line.token_offsets) {
            let mid = offset + plot.boxes[index].mid;
            doc.element_with_text("tspan", &[("x", num(mid))], &plot.tokens[index]);
        }
        doc.close("text");
        doc.close("g");
    }

    fn write_sparklines(&self, doc: &mut SvgWriter, plot: &Plot, line: &PlotLine, index: usize) {
        let layout = &plot.config.layout;
        let spark = &plot.config.sparkline;
        let h = spark.height;
        let clip_id = format!("{}-clip-{}", self.id_prefix, index);

        doc.open(
            "g",
            &[(
                "transform",
                format!("translate({}, {})", num(layout.margin), num(line.band_top)),
            )],
        );
        // Visible window: band floor up to one band height above the band
        doc.open("clipPath", &[("id", clip_id.clone())]);
        doc.empty(
            "rect",
            &[
                ("x", "0".to_string()),
                ("y", num(-h - spark.stroke_width)),
                ("width", num(line.width)),
                ("height", num(2.0 * h + 2.0 * spark.stroke_width)),
            ],
        );
        doc.close("clipPath");

        for (series_index, (series, path)) in plot.series.iter().zip(&line.paths).enumerate() {
            if path.is_empty() {
                continue;
            }
            let color = series
                .color
                .clone()
                .unwrap_or_else(|| series_var(series_index, &plot.config.theme));

            let mut attrs = vec![
                ("d", path.to_path_data()),
                ("fill", "none".to_string()),
                ("stroke", color.clone()),
                ("stroke-width", num(spark.stroke_width)),
            ];
            if !series.dasharray.is_empty() {
                attrs.push(("stroke-dasharray", series.dasharray.clone()));
            }
            attrs.push(("clip-path", format!("url(#{})", clip_id)));
            attrs.push(("style", "mix-blend-mode: var(--blend-mode);".to_string()));
            doc.empty("path", &attrs);

            for point in path.isolated_points() {
                if point.x < 0.0 || point.x > line.width {
                    continue;
                }
                doc.empty(
                    "circle",
                    &[
                        ("cx", num(point.x)),
                        ("cy", num(h - point.y)),
                        ("r", num(spark.stroke_width)),
                        ("fill", color.clone()),
                        ("clip-path", format!("url(#{})", clip_id)),
                    ],
                );
            }
        }

        let baseline: Vec<String> = plot
            .baseline_segments(line)
            .into_iter()
            .map(|(first, last)| {
                format!(
                    "M{},{} L{},{}",
                    num(first - BASELINE_OVERHANG),
                    num(h),
                    num(last + BASELINE_OVERHANG),
                    num(h)
                )
            })
            .collect();
        if !baseline.is_empty() {
            doc.empty(
                "path",
                &[
                    ("d", baseline.join(" ")),
                    ("fill", "none".to_string()),
                    ("stroke", "var(--col-baseline)".to_string()),
                    ("stroke-width", num(spark.baseline_width)),
                    ("stroke-linecap", "round".to_string()),
                    ("style", "mix-blend-mode: var(--blend-mode);".to_string()),
                ],
            );
        }
        doc.close("g");
    }

    fn write_legend(&self, doc: &mut SvgWriter, plot: &Plot) {
        if plot.legend.is_empty() {
            return;
        }
        doc.open(
            "g",
            &[(
                "transform",
                format!(
                    "translate({}, {})",
                    num(plot.config.layout.margin),
                    num(plot.legend_y)
                ),
            )],
        );
        for entry in &plot.legend {
            let color = plot.series[entry.series_index]
                .color
                .clone()
                .unwrap_or_else(|| series_var(entry.series_index, &plot.config.theme));
            let mut attrs = vec![
                ("x1", num(entry.x)),
                ("y1", "0".to_string()),
                ("x2", num(entry.x + 20.0)),
                ("y2", "0".to_string()),
                ("stroke", color),
                ("stroke-width", "1".to_string()),
            ];
            if !entry.dasharray.is_empty() {
                attrs.push(("stroke-dasharray", entry.dasharray.clone()));
            }
            attrs.push(("shape-rendering", "crispEdges".to_string()));
            doc.empty("line", &attrs);
            doc.element_with_text(
                "text",
                &[
                    ("x", num(entry.x + 25.0)),
                    ("y", "4".to_string()),
                    ("font-family", "system-ui".to_string()),
                    ("font-size", num(LEGEND_FONT_SIZE)),
                    ("fill", "var(--col-text)".to_string()),
                ],
                &entry.label,
            );
        }
        doc.close("g");
    }
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlotRenderer for SvgRenderer {
    fn render(&self, plot: &Plot) -> Result<Vec<u8>, RenderError> {
        Ok(self.render_string(plot).into_bytes())
    }

    fn media_type(&self) -> &'static str {
        "image/svg+xml"
    }

    fn extension(&self) -> &'static str {
        "svg"
    }
}

/// Series colors cycle through the palette, like the raster backend
fn series_var(index: usize, theme: &ThemeConfig) -> String {
    format!("var(--col-series-{})", index % theme.series.len().max(1) + 1)
}

/// CSS variables for light mode, overridden for dark color schemes
fn theme_css(class: &str, theme: &ThemeConfig, font_family: &str) -> String {
    let mut vars: Vec<(String, &str, &str)> = vec![
        (
            "bg-color".to_string(),
            theme.background.light.as_str(),
            theme.background.dark.as_str(),
        ),
        (
            "col-text".to_string(),
            theme.text.light.as_str(),
            theme.text.dark.as_str(),
        ),
        (
            "col-baseline".to_string(),
            theme.baseline.light.as_str(),
            theme.baseline.dark.as_str(),
        ),
        ("blend-mode".to_string(), "multiply", "screen"),
    ];
    for (i, color) in theme.series.iter().enumerate() {
        vars.push((
            format!("col-series-{}", i + 1),
            color.light.as_str(),
            color.dark.as_str(),
        ));
    }

    let mut css = String::new();
    let _ = writeln!(css, "svg.{} {{", class);
    for (name, light, _) in &vars {
        let _ = writeln!(css, "  --{}: {};", name, light);
    }
    let _ = writeln!(css, "}}");
    let _ = writeln!(css, "@media (prefers-color-scheme: dark) {{");
    let _ = writeln!(css, "  svg.{} {{", class);
    for (name, _, dark) in &vars {
        let _ = writeln!(css, "    --{}: {};", name, dark);
    }
    let _ = writeln!(css, "  }}");
    let _ = writeln!(css, "}}");
    let _ = writeln!(
        css,
        "svg.{} text {{ font-family: {}; white-space: pre; }}",
        class, font_family
    );
    css
}

/// Fixed-precision number formatting with trailing zeros trimmed
fn num(value: f32) -> String {
    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Minimal streaming XML writer
#[derive(Default)]
struct SvgWriter {
    out: String,
}

impl SvgWriter {
    fn start_tag(&mut self, tag: &str, attrs: &[(&str, String)]) {
        let _ = write!(self.out, "<{}", tag);
        for (name, value) in attrs {
            let _ = write!(self.out, " {}=\"{}\"", name, escape_xml(value));
        }
    }

    fn open(&mut self, tag: &str, attrs: &[(&str, String)]) {
        self.start_tag(tag, attrs);
        self.out.push('>');
    }

    fn empty(&mut self, tag: &str, attrs: &[(&str, String)]) {
        self.start_tag(tag, attrs);
        self.out.push_str("/>");
    }

    fn element_with_text(&mut self, tag: &str, attrs: &[(&str, String)], text: &str) {
        self.open(tag, attrs);
        self.out.push_str(&escape_xml(text));
        self.close(tag);
    }

    fn close(&mut self, tag: &str) {
        let _ = write!(self.out, "</{}>", tag);
    }

    fn finish(self) -> String {
        self.out
    }
}
