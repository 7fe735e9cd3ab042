//! Per-token surprisal, entropy and S₂ sparklines aligned with text
//!
//! ## Module Structure
//!
//! - **metrics**: information metrics from predictive distributions, and series
//! - **rendering**: measurement, layout, the sparkline path core, SVG and PNG backends
//! - **input**: JSON loading of metrics or raw predictions
//! - **engine**: configuration, errors and the load → plot → render pipeline
//!
//! ```rust,ignore
//! use subline::engine::{build_plot, Config};
//! use subline::metrics::MetricKind;
//! use subline::rendering::{PlotRenderer, SvgRenderer};
//!
//! let batch = subline::input::load_token_metrics("metrics.json")?;
//! let plot = build_plot(&batch[0], &[MetricKind::S2], &Config::default())?;
//! let svg = SvgRenderer::new().render(&plot)?;
//! ```

pub mod engine;
pub mod input;
pub mod metrics;
pub mod rendering;
