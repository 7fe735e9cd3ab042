use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use subline::engine::{build_plot, write_artifact, Config};
use subline::input::load_token_metrics;
use subline::metrics::MetricKind;
use subline::rendering::{to_data_uri, PlotRenderer, RasterRenderer, SvgRenderer};

/// Draw per-token surprisal, entropy and S₂ sparklines under text
#[derive(Parser, Debug)]
#[command(name = "subline", version)]
struct Cli {
    /// JSON file with token metrics or raw predictions
    input: PathBuf,

    /// Metric to draw (surprisal, entropy, s2); repeat for several
    #[arg(short, long = "metric", default_values = ["s2"])]
    metrics: Vec<MetricKind>,

    /// Write SVG here (one file per sequence for batches)
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write PNG here (one file per sequence for batches)
    #[arg(long)]
    png: Option<PathBuf>,

    /// Print the PNG as a base64 data URI instead of SVG on stdout
    #[arg(long)]
    data_uri: bool,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override characters per line
    #[arg(long)]
    line_width: Option<usize>,

    /// Font file for glyph-accurate widths and PNG text
    #[arg(long)]
    font: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(width) = cli.line_width {
        config.layout.chars_per_line = width;
    }
    if let Some(font) = &cli.font {
        config.layout.font_path = Some(font.display().to_string());
    }
    config.validate()?;

    let batch = load_token_metrics(&cli.input)?;
    let count = batch.len();

    for (i, metrics) in batch.iter().enumerate() {
        let plot = build_plot(metrics, &cli.metrics, &config)?;
        let svg = SvgRenderer::with_id_prefix(&format!("subline-{}", i));
        let png = RasterRenderer::new();

        if let Some(path) = &cli.svg {
            write_artifact(&indexed_path(path, i, count), &svg.render(&plot)?)?;
        }
        if let Some(path) = &cli.png {
            write_artifact(&indexed_path(path, i, count), &png.render(&plot)?)?;
        }

        if cli.data_uri {
            println!("{}", to_data_uri(&png.render(&plot)?, png.media_type()));
        } else if cli.svg.is_none() && cli.png.is_none() {
            println!("{}", svg.render_string(&plot));
        }

        if let (Some(entropy), Some(perplexity)) =
            (metrics.sequence_entropy(), metrics.sequence_perplexity())
        {
            tracing::info!(sequence = i, entropy, perplexity, "sequence summary");
        }
    }

    Ok(())
}

/// `plot.svg` → `plot-2.svg` when rendering more than one sequence
fn indexed_path(path: &Path, index: usize, count: usize) -> PathBuf {
    if count <= 1 {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}-{}", stem, index),
    };
    path.with_file_name(name)
}
