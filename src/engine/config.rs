// Configuration for subline layout, sparklines, theme and export
// Defaults match the reference notebook rendering (monospace 14px, 80 columns)

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::rendering::sparkline::{GapPolicy, Interpolation, Overflow, PointAnchor, Scale};

/// Text layout configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Maximum characters per wrapped line (default 80)
    pub chars_per_line: usize,

    /// Font size in SVG units (default 14)
    pub font_size: f32,

    /// Width of a single monospace cell in SVG units (default 8.4)
    pub char_width: f32,

    /// Vertical gap between a sparkline and the next text line (default 14)
    pub line_gap: f32,

    /// Margin around the whole plot (default 10)
    pub margin: f32,

    /// Optional TTF/OTF font used for glyph-accurate widths and raster text
    pub font_path: Option<String>,

    /// CSS font-family for SVG text. Should name the face in `font_path`
    /// when one is set, otherwise text drifts from the measured positions.
    pub font_family: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            chars_per_line: 80,
            font_size: 14.0,
            char_width: 8.4,
            line_gap: 14.0,
            margin: 10.0,
            font_path: None,
            font_family: "\"Source Code Pro\", \"Noto Sans Mono\", monospace".to_string(),
        }
    }
}

impl LayoutConfig {
    /// Maximum line width in SVG units
    pub fn max_line_width(&self) -> f32 {
        self.chars_per_line as f32 * self.char_width
    }
}

/// Sparkline drawing configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SparklineConfig {
    /// Height of the sparkline band under each text line (default 20)
    pub height: f32,

    /// Series stroke width (default 1.0)
    pub stroke_width: f32,

    /// Token baseline stroke width (default 3.0)
    pub baseline_width: f32,

    /// Vertical scaling. Series are pre-normalized, so plots use [0, 1]
    pub scale: Scale,

    /// Values outside the fixed range run past the band (default `extend`)
    pub overflow: Overflow,

    pub interpolation: Interpolation,
    pub anchor: PointAnchor,
    pub gap_policy: GapPolicy,

    /// Hold values flat across wide tokens (default false)
    pub plateaus: bool,
}

impl Default for SparklineConfig {
    fn default() -> Self {
        Self {
            height: 20.0,
            stroke_width: 1.0,
            baseline_width: 3.0,
            scale: Scale::Fixed { min: 0.0, max: 1.0 },
            overflow: Overflow::Extend,
            interpolation: Interpolation::Smooth,
            anchor: PointAnchor::Center,
            gap_policy: GapPolicy::Break,
            plateaus: false,
        }
    }
}

/// Light/dark color pair for a themed element
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThemeColor {
    pub light: String,
    pub dark: String,
}

impl ThemeColor {
    pub fn new(light: &str, dark: &str) -> Self {
        Self {
            light: light.to_string(),
            dark: dark.to_string(),
        }
    }
}

/// Theme colors, emitted as CSS variables in SVG output
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub background: ThemeColor,
    pub text: ThemeColor,
    pub baseline: ThemeColor,

    /// Series colors, cycled when there are more series than entries
    pub series: Vec<ThemeColor>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            background: ThemeColor::new("#ffffff", "#2a2a2a"),
            text: ThemeColor::new("#666666", "#dddddd"),
            baseline: ThemeColor::new("#cccccc", "#666666"),
            series: vec![
                ThemeColor::new("#ef4444", "#ff7878"),
                ThemeColor::new("#3b82f6", "#3b82f6"),
                ThemeColor::new("#22c55e", "#45e881"),
                ThemeColor::new("#f97316", "#ffa261"),
                ThemeColor::new("#a855f7", "#d9b1ff"),
            ],
        }
    }
}

impl ThemeConfig {
    /// Color for the series at `index`, cycling through the palette
    pub fn series_color(&self, index: usize) -> &ThemeColor {
        &self.series[index % self.series.len()]
    }
}

/// Raster export configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Pixels per SVG unit for PNG output (default 2)
    pub raster_scale: f32,

    /// Whether the PNG gets an opaque background (default true)
    pub opaque_background: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            raster_scale: 2.0,
            opaque_background: true,
        }
    }
}

/// Master configuration combining all subline settings
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub sparkline: SparklineConfig,
    pub theme: ThemeConfig,
    pub export: ExportConfig,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

impl Config {
    /// Parse a TOML document; missing sections and fields keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.chars_per_line == 0 {
            return Err(ConfigError::Invalid(
                "layout.chars_per_line must be at least 1".to_string(),
            ));
        }
        let positive = [
            ("layout.font_size", self.layout.font_size),
            ("layout.char_width", self.layout.char_width),
            ("sparkline.height", self.sparkline.height),
            ("export.raster_scale", self.export.raster_scale),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        let non_negative = [
            ("layout.margin", self.layout.margin),
            ("layout.line_gap", self.layout.line_gap),
            ("sparkline.stroke_width", self.sparkline.stroke_width),
            ("sparkline.baseline_width", self.sparkline.baseline_width),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be zero or positive, got {}",
                    name, value
                )));
            }
        }
        if let Scale::Fixed { min, max } = self.sparkline.scale {
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(ConfigError::Invalid(format!(
                    "sparkline.scale needs finite bounds with min < max, got [{}, {}]",
                    min, max
                )));
            }
        }
        if self.theme.series.is_empty() {
            return Err(ConfigError::Invalid(
                "theme.series needs at least one color".to_string(),
            ));
        }
        Ok(())
    }
}
