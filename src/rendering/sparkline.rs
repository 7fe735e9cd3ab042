//! Sparkline path generation
//!
//! Turns an ordered series of `(token_width, value)` pairs into a path whose
//! horizontal extent matches the summed token widths and whose values are
//! mapped linearly into a fixed-height band.
//!
//! Coordinates are produced in "band space": `x` grows to the right from the
//! start of the first token, `y` is the height above the bottom edge of the
//! band (0 = bottom, `height` = top). Backends flip `y` into screen space
//! when they emit drawing instructions.

use std::fmt::Write;

use serde::Deserialize;
use thiserror::Error;

use super::layout::TokenBox;

/// Bounds on `t` under `Overflow::Extend`. Both lie outside the window
/// backends draw (band floor up to one band height above it), so
/// coordinates stay finite without visibly flattening anything.
const EXTEND_MIN: f64 = -1.0;
const EXTEND_MAX: f64 = 3.0;

/// Errors raised while validating sparkline input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SparklineError {
    #[error("length mismatch: {widths} token widths but {values} values")]
    LengthMismatch { widths: usize, values: usize },

    #[error("non-finite value {value} at token {index}")]
    NonFiniteValue { index: usize, value: f64 },

    #[error("missing value at token {index}")]
    MissingValue { index: usize },

    #[error("invalid width {width} at token {index}")]
    InvalidWidth { index: usize, width: f32 },

    #[error("invalid height {0}: must be finite and positive")]
    InvalidHeight(f32),

    #[error("invalid range [{min}, {max}]: bounds must be finite with min < max")]
    InvalidRange { min: f64, max: f64 },
}

/// Vertical scaling policy
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    /// Scale to the series' own min/max
    #[default]
    Auto,
    /// Scale to a configured range; see `Overflow` for values outside it
    Fixed { min: f64, max: f64 },
}

/// What happens to values outside a fixed range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    /// Pin to the nearest band edge
    #[default]
    Clamp,
    /// Keep mapping linearly past the band edges. Backends clip to a window
    /// from the band floor up to one band height above the band, so values
    /// below the range disappear and values up to twice the range overflow
    /// upward.
    Extend,
}

/// How consecutive points are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Linear,
    /// Cubic Bézier with horizontal tangents at every point
    Smooth,
}

/// Where along a token its point sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointAnchor {
    /// Left edge of the token (sum of preceding widths)
    Start,
    /// Middle of the token
    Center,
    /// Right edge of the token (sum of widths up to and including it)
    #[default]
    End,
}

/// What to do with tokens that have no value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapPolicy {
    /// Fail with `SparklineError::MissingValue`
    #[default]
    Reject,
    /// Skip the token and start a new subpath at the next value
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SparklineOptions {
    pub scale: Scale,
    pub overflow: Overflow,
    pub interpolation: Interpolation,
    pub anchor: PointAnchor,
    pub gaps: GapPolicy,
    /// Hold a wide token's value from its first to its last glyph: the token
    /// gets two points at the same height instead of one anchored point
    pub plateaus: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// A rendered sparkline: one or more subpaths in band space
#[derive(Debug, Clone, PartialEq)]
pub struct SparklinePath {
    pub segments: Vec<Vec<Point>>,
    /// Total width of the token sequence
    pub width: f32,
    pub height: f32,
    pub interpolation: Interpolation,
}

impl SparklinePath {
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|segment| segment.is_empty())
    }

    /// All points in token order, across subpaths
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.segments.iter().flatten()
    }

    pub fn point_count(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    /// Subpaths with exactly one point; backends draw these as dots
    pub fn isolated_points(&self) -> impl Iterator<Item = &Point> {
        self.segments
            .iter()
            .filter(|segment| segment.len() == 1)
            .map(|segment| &segment[0])
    }

    /// SVG path data with `y` flipped so the band's top edge is at 0
    pub fn to_path_data(&self) -> String {
        let mut data = String::new();
        for segment in &self.segments {
            let mut previous: Option<(f32, f32)> = None;
            for point in segment {
                let (x, y) = (point.x, self.height - point.y);
                if !data.is_empty() {
                    data.push(' ');
                }
                match (previous, self.interpolation) {
                    (None, _) => {
                        let _ = write!(data, "M {:.2},{:.2}", x, y);
                    }
                    (Some(_), Interpolation::Linear) => {
                        let _ = write!(data, "L {:.2},{:.2}", x, y);
                    }
                    (Some((px, py)), Interpolation::Smooth) => {
                        let mid = px + (x - px) / 2.0;
                        let _ = write!(
                            data,
                            "C {:.2},{:.2} {:.2},{:.2} {:.2},{:.2}",
                            mid, py, mid, y, x, y
                        );
                    }
                }
                previous = Some((x, y));
            }
        }
        data
    }
}

/// Build a sparkline from token widths and (possibly missing) values
///
/// Every token is treated as a single glyph position, so `plateaus` has no
/// effect here; use [`build_sparkline_boxes`] for that.
///
/// # Errors
/// Fails fast on mismatched lengths, invalid widths or height, an invalid
/// fixed range, non-finite values, and (under `GapPolicy::Reject`) missing
/// values. Non-finite values are never clamped.
pub fn build_sparkline(
    widths: &[f32],
    values: &[Option<f64>],
    height: f32,
    options: SparklineOptions,
) -> Result<SparklinePath, SparklineError> {
    let boxes: Vec<TokenBox> = widths.iter().map(|&w| TokenBox::from_width(w)).collect();
    build_sparkline_boxes(&boxes, values, height, options)
}

/// Same as [`build_sparkline`], but with full token boxes so wide tokens can
/// be drawn as plateaus
pub fn build_sparkline_boxes(
    boxes: &[TokenBox],
    values: &[Option<f64>],
    height: f32,
    options: SparklineOptions,
) -> Result<SparklinePath, SparklineError> {
    if boxes.len() != values.len() {
        return Err(SparklineError::LengthMismatch {
            widths: boxes.len(),
            values: values.len(),
        });
    }
    if !height.is_finite() || height <= 0.0 {
        return Err(SparklineError::InvalidHeight(height));
    }
    if let Some((index, b)) = boxes
        .iter()
        .enumerate()
        .find(|(_, b)| !b.width.is_finite() || b.width < 0.0)
    {
        return Err(SparklineError::InvalidWidth {
            index,
            width: b.width,
        });
    }
    for (index, value) in values.iter().enumerate() {
        match value {
            Some(v) if !v.is_finite() => {
                return Err(SparklineError::NonFiniteValue { index, value: *v })
            }
            None if options.gaps == GapPolicy::Reject => {
                return Err(SparklineError::MissingValue { index })
            }
            _ => {}
        }
    }

    let (min, max) = value_range(values, options.scale)?;

    let mut segments: Vec<Vec<Point>> = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let mut offset = 0.0f32;

    for (b, value) in boxes.iter().zip(values) {
        let start = offset;
        offset += b.width;

        match value {
            Some(v) => {
                let y = map_value(*v, min, max, height, options.overflow);
                if options.plateaus && b.is_wide() {
                    current.push(Point {
                        x: start + b.first_char,
                        y,
                    });
                    current.push(Point {
                        x: start + b.last_char,
                        y,
                    });
                } else {
                    let x = match options.anchor {
                        PointAnchor::Start => start,
                        PointAnchor::Center => start + b.width / 2.0,
                        PointAnchor::End => offset,
                    };
                    current.push(Point { x, y });
                }
            }
            None => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    Ok(SparklinePath {
        segments,
        width: offset,
        height,
        interpolation: options.interpolation,
    })
}

/// Range used for vertical scaling. `Auto` over no values yields an
/// inverted range, which is never consulted.
fn value_range(values: &[Option<f64>], scale: Scale) -> Result<(f64, f64), SparklineError> {
    match scale {
        Scale::Fixed { min, max } => {
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(SparklineError::InvalidRange { min, max });
            }
            Ok((min, max))
        }
        Scale::Auto => {
            let (min, max) = values
                .iter()
                .flatten()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            Ok((min, max))
        }
    }
}

fn map_value(value: f64, min: f64, max: f64, height: f32, overflow: Overflow) -> f32 {
    // Halved operands keep the span finite even for bounds near f64::MAX
    let span = max / 2.0 - min / 2.0;
    // Flat series (or a single value) sits on the midline
    if span <= 0.0 {
        return height / 2.0;
    }
    let t = (value / 2.0 - min / 2.0) / span;
    let t = match overflow {
        Overflow::Clamp => t.clamp(0.0, 1.0),
        Overflow::Extend => t.clamp(EXTEND_MIN, EXTEND_MAX),
    };
    (t * height as f64) as f32
}
