//! RasterRenderer - standalone PNG export of a plot
//!
//! Rasterizes the same geometry as the SVG backend with imageproc. Smooth
//! segments are flattened into short line segments so dashed series can
//! share one stroking routine. Sparklines are drawn into a per-line band
//! image and composited, which clips them to the line like the SVG
//! clipPath does. Token text is only drawn when the plot was measured
//! with a real font.

use std::io::Cursor;

use ab_glyph::PxScale;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_antialiased_line_segment_mut, draw_filled_circle_mut, draw_filled_rect_mut, draw_text_mut,
};
use imageproc::pixelops::interpolate;
use imageproc::rect::Rect;

use super::font::get_font_metrics;
use super::plot::{Plot, PlotLine, LEGEND_FONT_SIZE};
use super::renderer::{PlotRenderer, RenderError};
use super::sparkline::{Interpolation, SparklinePath};

/// Line segments per smooth (cubic) segment
const CURVE_STEPS: usize = 16;

/// Fallback when a theme color is not a hex literal
const FALLBACK_COLOR: Rgba<u8> = Rgba([128, 128, 128, 255]);

pub struct RasterRenderer;

impl RasterRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Rasterize without encoding
    pub fn render_image(&self, plot: &Plot) -> Result<RgbaImage, RenderError> {
        let config = &plot.config;
        let scale = config.export.raster_scale;
        let width = (plot.width * scale).ceil() as u32;
        let height = (plot.height * scale).ceil() as u32;
        if width == 0 || height == 0 {
            return Err(RenderError::CanvasSize { width, height });
        }

        let background = if config.export.opaque_background {
            parse_color(&config.theme.background.light)
        } else {
            Rgba([0, 0, 0, 0])
        };
        let mut image = RgbaImage::from_pixel(width, height, background);

        for line in &plot.lines {
            self.draw_text_line(&mut image, plot, line);
            self.draw_sparklines(&mut image, plot, line);
            self.draw_baselines(&mut image, plot, line);
        }
        self.draw_legend(&mut image, plot);

        tracing::debug!(width, height, lines = plot.lines.len(), "rasterized plot");
        Ok(image)
    }

    fn draw_text_line(&self, image: &mut RgbaImage, plot: &Plot, line: &PlotLine) {
        let Some(font) = plot.measure.font() else {
            return;
        };
        let layout = &plot.config.layout;
        let scale = plot.config.export.raster_scale;
        let ascent = get_font_metrics(font, layout.font_size).ascent;
        let color = parse_color(&plot.config.theme.text.light);
        let top = ((line.baseline_y - ascent) * scale).round() as i32;

        for (index, offset) in line.range.clone().zip(&line.token_offsets) {
            let x = ((layout.margin + offset) * scale).round() as i32;
            draw_text_mut(
                image,
                color,
                x,
                top,
                PxScale::from(layout.font_size * scale),
                font,
                &plot.tokens[index],
            );
        }
    }

    fn draw_sparklines(&self, image: &mut RgbaImage, plot: &Plot, line: &PlotLine) {
        let spark = &plot.config.sparkline;
        let scale = plot.config.export.raster_scale;
        let pad = spark.stroke_width;
        // Visible window: band floor up to one band height above the band
        let above = spark.height;
        let band_width = (line.width * scale).ceil() as u32;
        let band_height = ((above + spark.height + 2.0 * pad) * scale).ceil() as u32;
        if band_width == 0 || band_height == 0 {
            return;
        }

        let mut band = RgbaImage::new(band_width, band_height);
        let thickness = (spark.stroke_width * scale).round().max(1.0) as i32;

        for (series_index, (series, path)) in plot.series.iter().zip(&line.paths).enumerate() {
            let color = match &series.color {
                Some(color) => parse_color(color),
                None => parse_color(&plot.config.theme.series_color(series_index).light),
            };
            let dash = parse_dasharray(&series.dasharray, scale);
            let to_band = |x: f32, y: f32| (x * scale, (pad + above + path.height - y) * scale);

            for polyline in flatten(path) {
                let points: Vec<(f32, f32)> =
                    polyline.iter().map(|&(x, y)| to_band(x, y)).collect();
                if points.len() == 1 {
                    let (x, y) = points[0];
                    let center = (x.round() as i32, y.round() as i32);
                    draw_filled_circle_mut(&mut band, center, thickness, color);
                } else {
                    stroke_polyline(&mut band, &points, color, thickness, dash.as_deref());
                }
            }
        }

        let x = ((plot.config.layout.margin) * scale).round() as i64;
        let y = ((line.band_top - above - pad) * scale).round() as i64;
        imageops::overlay(image, &band, x, y);
    }

    fn draw_baselines(&self, image: &mut RgbaImage, plot: &Plot, line: &PlotLine) {
        let spark = &plot.config.sparkline;
        let scale = plot.config.export.raster_scale;
        let color = parse_color(&plot.config.theme.baseline.light);
        let thickness = (spark.baseline_width * scale).round().max(1.0) as u32;
        let center_y = (line.band_top + spark.height) * scale;
        let top = (center_y - thickness as f32 / 2.0).round() as i32;

        for (first, last) in plot.baseline_segments(line) {
            let x0 = ((plot.config.layout.margin + first - 0.2) * scale).round() as i32;
            let x1 = ((plot.config.layout.margin + last + 0.2) * scale).round() as i32;
            let width = (x1 - x0).max(1) as u32;
            draw_filled_rect_mut(image, Rect::at(x0, top).of_size(width, thickness), color);
        }
    }

    fn draw_legend(&self, image: &mut RgbaImage, plot: &Plot) {
        let config = &plot.config;
        let scale = config.export.raster_scale;
        let y = (plot.legend_y * scale).round() as i32;

        for entry in &plot.legend {
            let series = &plot.series[entry.series_index];
            let color = match &series.color {
                Some(color) => parse_color(color),
                None => parse_color(&config.theme.series_color(entry.series_index).light),
            };
            let x0 = (config.layout.margin + entry.x) * scale;
            let points = [(x0, y as f32), (x0 + 20.0 * scale, y as f32)];
            let dash = parse_dasharray(&entry.dasharray, scale);
            stroke_polyline(image, &points, color, 1, dash.as_deref());

            if let Some(font) = plot.measure.font() {
                let size = LEGEND_FONT_SIZE * scale;
                draw_text_mut(
                    image,
                    parse_color(&config.theme.text.light),
                    (x0 + 25.0 * scale).round() as i32,
                    y - (size / 2.0).round() as i32,
                    PxScale::from(size),
                    font,
                    &entry.label,
                );
            }
        }
    }
}

impl Default for RasterRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlotRenderer for RasterRenderer {
    fn render(&self, plot: &Plot) -> Result<Vec<u8>, RenderError> {
        let image = self.render_image(plot)?;
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    fn media_type(&self) -> &'static str {
        "image/png"
    }

    fn extension(&self) -> &'static str {
        "png"
    }
}

/// Wrap rendered bytes as a `data:` URI for inline embedding
pub fn to_data_uri(bytes: &[u8], media_type: &str) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
}

/// Subpaths as polylines in band space, with smooth segments sampled
fn flatten(path: &SparklinePath) -> Vec<Vec<(f32, f32)>> {
    path.segments
        .iter()
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut points = vec![(segment[0].x, segment[0].y)];
            for pair in segment.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                match path.interpolation {
                    Interpolation::Linear => points.push((b.x, b.y)),
                    Interpolation::Smooth => {
                        let mid = a.x + (b.x - a.x) / 2.0;
                        for step in 1..=CURVE_STEPS {
                            let t = step as f32 / CURVE_STEPS as f32;
                            points.push(cubic((a.x, a.y), (mid, a.y), (mid, b.y), (b.x, b.y), t));
                        }
                    }
                }
            }
            points
        })
        .collect()
}

fn cubic(p0: (f32, f32), p1: (f32, f32), p2: (f32, f32), p3: (f32, f32), t: f32) -> (f32, f32) {
    let u = 1.0 - t;
    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    (
        a * p0.0 + b * p1.0 + c * p2.0 + d * p3.0,
        a * p0.1 + b * p1.1 + c * p2.1 + d * p3.1,
    )
}

/// Stroke a polyline, optionally dashed. Dash lengths are in pixels.
fn stroke_polyline(
    image: &mut RgbaImage,
    points: &[(f32, f32)],
    color: Rgba<u8>,
    thickness: i32,
    dash: Option<&[f32]>,
) {
    let mut pattern = DashState::new(dash);
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        let length = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
        for (t0, t1) in pattern.advance(length) {
            let start = (x0 + (x1 - x0) * t0, y0 + (y1 - y0) * t0);
            let end = (x0 + (x1 - x0) * t1, y0 + (y1 - y0) * t1);
            for dy in 0..thickness {
                let offset = dy as f32 - (thickness - 1) as f32 / 2.0;
                draw_antialiased_line_segment_mut(
                    image,
                    (start.0.round() as i32, (start.1 + offset).round() as i32),
                    (end.0.round() as i32, (end.1 + offset).round() as i32),
                    color,
                    interpolate,
                );
            }
        }
    }
}

/// Walks a dash pattern along consecutive segments
struct DashState {
    pattern: Vec<f32>,
    index: usize,
    remaining: f32,
}

impl DashState {
    fn new(dash: Option<&[f32]>) -> Self {
        let pattern: Vec<f32> = dash.map(<[f32]>::to_vec).unwrap_or_default();
        let remaining = pattern.first().copied().unwrap_or(f32::INFINITY);
        Self {
            pattern,
            index: 0,
            remaining,
        }
    }

    /// Visible parameter ranges `(t0, t1)` of a segment of `length`
    fn advance(&mut self, length: f32) -> Vec<(f32, f32)> {
        if self.pattern.is_empty() || length <= 0.0 {
            return vec![(0.0, 1.0)];
        }
        let mut visible = Vec::new();
        let mut position = 0.0;
        while position < length {
            let step = self.remaining.min(length - position);
            if self.index % 2 == 0 {
                visible.push((position / length, (position + step) / length));
            }
            position += step;
            self.remaining -= step;
            if self.remaining <= 0.0 {
                self.index = (self.index + 1) % self.pattern.len();
                self.remaining = self.pattern[self.index];
            }
        }
        visible
    }
}

/// SVG dasharray ("3" or "4 2") scaled to pixels; odd lists repeat
fn parse_dasharray(dasharray: &str, scale: f32) -> Option<Vec<f32>> {
    let mut values: Vec<f32> = dasharray
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<f32>())
        .collect::<Result<_, _>>()
        .ok()?;
    if values.is_empty() || values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return None;
    }
    if values.len() % 2 == 1 {
        values.extend(values.clone());
    }
    Some(values.into_iter().map(|v| v * scale).collect())
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`
fn parse_color(color: &str) -> Rgba<u8> {
    parse_hex_color(color).unwrap_or_else(|| {
        tracing::warn!("Unsupported color '{}' in raster output, using gray", color);
        FALLBACK_COLOR
    })
}

fn parse_hex_color(color: &str) -> Option<Rgba<u8>> {
    let hex = color.trim().strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = channel(&c.to_string())?;
                rgb[i] = v * 17;
            }
            Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
        }
        6 | 8 if hex.is_ascii() => {
            let r = channel(&hex[0..2])?;
            let g = channel(&hex[2..4])?;
            let b = channel(&hex[4..6])?;
            let a = if hex.len() == 8 { channel(&hex[6..8])? } else { 255 };
            Some(Rgba([r, g, b, a]))
        }
        _ => None,
    }
}
