//! Text measurement for token alignment
//!
//! Two strategies, matching the two ways the plot can be displayed:
//! - **Monospace**: the viewer's font is a monospace face we do not control,
//!   so widths are display columns (via unicode-width, CJK and emoji count
//!   as two) times a fixed cell width.
//! - **Glyph**: a concrete font is loaded and widths are summed horizontal
//!   advances from ab_glyph. The same font is used for raster text.

use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use thiserror::Error;
use unicode_width::UnicodeWidthStr;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("Failed to read font {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid font data in {0}")]
    InvalidFont(String),
}

#[derive(Clone)]
pub enum TextMeasure {
    Monospace { char_width: f32 },
    Glyph { font: FontArc, size: f32 },
}

impl std::fmt::Debug for TextMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monospace { char_width } => f
                .debug_struct("Monospace")
                .field("char_width", char_width)
                .finish(),
            Self::Glyph { size, .. } => f.debug_struct("Glyph").field("size", size).finish(),
        }
    }
}

impl TextMeasure {
    pub fn monospace(char_width: f32) -> Self {
        Self::Monospace { char_width }
    }

    pub fn glyph(font: FontArc, size: f32) -> Self {
        Self::Glyph { font, size }
    }

    /// Width of `text` in plot units
    pub fn text_width(&self, text: &str) -> f32 {
        match self {
            Self::Monospace { char_width } => text.width() as f32 * char_width,
            Self::Glyph { font, size } => calculate_string_width(font, text, *size),
        }
    }

    /// The loaded font, if measuring with glyph advances
    pub fn font(&self) -> Option<&FontArc> {
        match self {
            Self::Monospace { .. } => None,
            Self::Glyph { font, .. } => Some(font),
        }
    }
}

pub fn calculate_char_width<F: Font>(font: &F, c: char, font_size: f32) -> f32 {
    let scaled_font = font.as_scaled(PxScale::from(font_size));
    scaled_font.h_advance(font.glyph_id(c))
}

pub fn calculate_string_width<F: Font>(font: &F, text: &str, font_size: f32) -> f32 {
    text.chars()
        .map(|c| calculate_char_width(font, c, font_size))
        .sum()
}

#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
    pub height: f32,
}

pub fn get_font_metrics<F: Font>(font: &F, font_size: f32) -> FontMetrics {
    let metrics = font.as_scaled(PxScale::from(font_size));

    FontMetrics {
        ascent: metrics.ascent(),
        descent: metrics.descent(),
        line_gap: metrics.line_gap(),
        height: metrics.height(),
    }
}

pub fn load_font_from_path<P: AsRef<Path>>(path: P) -> Result<FontArc, FontError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| FontError::Io {
        path: path.display().to_string(),
        source,
    })?;
    FontArc::try_from_vec(bytes).map_err(|_| FontError::InvalidFont(path.display().to_string()))
}

/// Measure for a layout: glyph advances when a usable font is configured,
/// monospace cells otherwise
pub fn measure_for(font_path: Option<&str>, font_size: f32, char_width: f32) -> TextMeasure {
    match font_path.map(load_font_from_path) {
        Some(Ok(font)) => TextMeasure::glyph(font, font_size),
        Some(Err(e)) => {
            tracing::warn!("Font unavailable, using monospace widths: {}", e);
            TextMeasure::monospace(char_width)
        }
        None => TextMeasure::monospace(char_width),
    }
}
