use std::fs;

use subline::engine::{build_plot, visualize_batch, write_artifact, Config};
use subline::input::load_token_metrics;
use subline::metrics::MetricKind;
use subline::rendering::{to_data_uri, PlotRenderer, RasterRenderer, SvgRenderer};

const PREDICTIONS: &str = r#"{
    "tokens": ["The", " cat", " sat", " on", " the", " mat", "."],
    "vocab_size": 4,
    "predictions": [
        {"probs": [0.25, 0.25, 0.25, 0.25], "next_token": 1},
        {"probs": [0.7, 0.1, 0.1, 0.1], "next_token": 0},
        {"logits": [2.0, 0.5, 0.5, -1.0], "next_token": 3},
        {"probs": [0.97, 0.01, 0.01, 0.01], "next_token": 0},
        {"probs": [0.4, 0.4, 0.1, 0.1], "next_token": 1},
        {"logits": [0.0, 0.0, 0.0, 5.0], "next_token": 3}
    ]
}"#;

#[test]
fn predictions_to_svg_and_png() {
    let dir = std::env::temp_dir().join("subline_end_to_end");
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    let input = dir.join("predictions.json");
    fs::write(&input, PREDICTIONS).unwrap();

    let batch = load_token_metrics(&input).expect("Should load predictions");
    assert_eq!(batch.len(), 1);
    let metrics = &batch[0];
    assert_eq!(metrics.len(), 7);
    assert_eq!(metrics.surprisal[0], None);
    assert!(metrics.surprisal[1..].iter().all(|s| s.is_some()));

    let config = Config::default();
    let plot = build_plot(
        metrics,
        &[MetricKind::Surprisal, MetricKind::Entropy, MetricKind::S2],
        &config,
    )
    .unwrap();
    assert_eq!(plot.series.len(), 4);
    assert_eq!(plot.legend.len(), 4);

    let svg = SvgRenderer::new();
    let svg_bytes = svg.render(&plot).unwrap();
    let text = String::from_utf8(svg_bytes.clone()).unwrap();
    assert!(text.starts_with("<svg"));
    assert!(text.contains(" cat"));
    assert!(text.contains("stroke-dasharray=\"3\""));
    assert!(text.contains("prefers-color-scheme: dark"));

    let png = RasterRenderer::new();
    let png_bytes = png.render(&plot).unwrap();
    assert!(png_bytes.starts_with(b"\x89PNG"));
    assert!(to_data_uri(&png_bytes, png.media_type()).starts_with("data:image/png;base64,"));

    let svg_path = dir.join("out").join("plot.svg");
    write_artifact(&svg_path, &svg_bytes).unwrap();
    assert_eq!(fs::read(&svg_path).unwrap(), svg_bytes);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn long_text_wraps_and_batch_documents_stay_separate() {
    let tokens: Vec<String> = (0..40).map(|i| format!(" word{}", i)).collect();
    let surprisal: Vec<Option<f64>> = (0..40)
        .map(|i| if i == 0 { None } else { Some((i % 5) as f64) })
        .collect();
    let doc = serde_json::json!({
        "tokens": tokens,
        "surprisal": surprisal,
        "entropy": surprisal,
        "vocab_size": 1000,
    });
    let json = serde_json::to_string(&vec![doc.clone(), doc]).unwrap();
    let batch = subline::input::parse_token_metrics(&json).unwrap();

    let mut config = Config::default();
    config.layout.chars_per_line = 30;

    let plot = build_plot(&batch[0], &[MetricKind::Surprisal], &config).unwrap();
    assert!(plot.line_count() > 1);
    let covered: usize = plot.lines.iter().map(|l| l.range.len()).sum();
    assert_eq!(covered, 40);

    let svgs = visualize_batch(&batch, &[MetricKind::S2], &config).unwrap();
    assert_eq!(svgs.len(), 2);
    assert!(svgs[0].contains("id=\"subline-0-clip-1\""));
    assert!(!svgs[0].contains("subline-1-clip"));
    assert!(svgs[1].contains("id=\"subline-1-clip-0\""));
}
