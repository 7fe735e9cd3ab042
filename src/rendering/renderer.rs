//! PlotRenderer trait for pluggable output backends
//!
//! Both backends consume the same laid-out `Plot`: the SVG backend produces
//! an inline-embeddable vector document, the raster backend a standalone
//! PNG artifact.

use thiserror::Error;

use super::plot::Plot;
use super::sparkline::SparklineError;

/// Errors that can occur while building or rendering a plot
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Series '{label}' has {values} values for {tokens} tokens")]
    SeriesLength {
        label: String,
        tokens: usize,
        values: usize,
    },

    #[error("Invalid sparkline input: {0}")]
    Sparkline(#[from] SparklineError),

    #[error("Invalid canvas size {width}x{height}")]
    CanvasSize { width: u32, height: u32 },

    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Core trait for plot output backends
pub trait PlotRenderer {
    /// Render a laid-out plot to the backend's byte format
    fn render(&self, plot: &Plot) -> Result<Vec<u8>, RenderError>;

    /// MIME type of the rendered bytes
    fn media_type(&self) -> &'static str;

    /// Conventional file extension, without the dot
    fn extension(&self) -> &'static str;
}
