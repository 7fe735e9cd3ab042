use subline::rendering::{
    build_sparkline, GapPolicy, Interpolation, PointAnchor, Scale, SparklineError,
    SparklineOptions,
};

const HEIGHT: f32 = 20.0;

fn values(raw: &[f64]) -> Vec<Option<f64>> {
    raw.iter().copied().map(Some).collect()
}

#[test]
fn peak_in_the_middle() {
    let path = build_sparkline(
        &[10.0, 10.0, 10.0],
        &values(&[0.1, 0.9, 0.1]),
        HEIGHT,
        SparklineOptions::default(),
    )
    .unwrap();

    let points: Vec<_> = path.points().copied().collect();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0].x, 10.0);
    assert_eq!(points[1].x, 20.0);
    assert_eq!(points[2].x, 30.0);
    assert!(points[1].y > points[0].y);
    assert!(points[1].y > points[2].y);
    assert_eq!(points[0].y, points[2].y);
    assert_eq!(path.width, 30.0);
}

#[test]
fn one_point_per_token_with_monotonic_x() {
    let widths = [3.0, 0.0, 7.5, 12.0, 1.25];
    let path = build_sparkline(
        &widths,
        &values(&[5.0, -2.0, 8.0, 8.0, 0.0]),
        HEIGHT,
        SparklineOptions::default(),
    )
    .unwrap();

    assert_eq!(path.point_count(), widths.len());
    let xs: Vec<f32> = path.points().map(|p| p.x).collect();
    assert!(xs.windows(2).all(|pair| pair[0] <= pair[1]));
    let total: f32 = widths.iter().sum();
    assert!((xs[xs.len() - 1] - total).abs() < 1e-4);
}

#[test]
fn every_anchor_stays_inside_total_width() {
    let widths = [4.0, 6.0, 2.0];
    for anchor in [PointAnchor::Start, PointAnchor::Center, PointAnchor::End] {
        let options = SparklineOptions {
            anchor,
            ..SparklineOptions::default()
        };
        let path = build_sparkline(&widths, &values(&[1.0, 2.0, 3.0]), HEIGHT, options).unwrap();
        assert_eq!(path.width, 12.0);
        assert!(path.points().all(|p| p.x >= 0.0 && p.x <= 12.0));
        assert!(path.points().all(|p| p.y >= 0.0 && p.y <= HEIGHT));
    }
}

#[test]
fn constant_series_is_flat() {
    let path = build_sparkline(
        &[5.0; 4],
        &values(&[2.5; 4]),
        HEIGHT,
        SparklineOptions::default(),
    )
    .unwrap();
    assert!(path.points().all(|p| p.y == HEIGHT / 2.0));
}

#[test]
fn building_twice_gives_identical_output() {
    let widths = [8.4, 16.8, 25.2];
    let vals = values(&[0.3, 0.7, 0.5]);
    let options = SparklineOptions {
        interpolation: Interpolation::Smooth,
        ..SparklineOptions::default()
    };
    let a = build_sparkline(&widths, &vals, HEIGHT, options).unwrap();
    let b = build_sparkline(&widths, &vals, HEIGHT, options).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_path_data(), b.to_path_data());
}

#[test]
fn fixed_scale_clamps_out_of_range_values() {
    let options = SparklineOptions {
        scale: Scale::Fixed { min: 0.0, max: 1.0 },
        ..SparklineOptions::default()
    };
    let path = build_sparkline(&[1.0, 1.0], &values(&[-3.0, 4.0]), HEIGHT, options).unwrap();
    let ys: Vec<f32> = path.points().map(|p| p.y).collect();
    assert_eq!(ys, vec![0.0, HEIGHT]);
}

#[test]
fn non_finite_values_are_rejected() {
    let result = build_sparkline(
        &[1.0, 1.0],
        &values(&[1.0, f64::INFINITY]),
        HEIGHT,
        SparklineOptions::default(),
    );
    assert!(matches!(
        result,
        Err(SparklineError::NonFiniteValue { index: 1, .. })
    ));
}

#[test]
fn gaps_split_the_path_when_allowed() {
    let vals = vec![Some(1.0), Some(2.0), None, Some(3.0)];

    let rejected = build_sparkline(&[1.0; 4], &vals, HEIGHT, SparklineOptions::default());
    assert_eq!(rejected, Err(SparklineError::MissingValue { index: 2 }));

    let options = SparklineOptions {
        gaps: GapPolicy::Break,
        ..SparklineOptions::default()
    };
    let path = build_sparkline(&[1.0; 4], &vals, HEIGHT, options).unwrap();
    assert_eq!(path.segments.len(), 2);
    assert_eq!(path.isolated_points().count(), 1);
    assert_eq!(path.to_path_data().matches('M').count(), 2);
}

#[test]
fn empty_input_gives_empty_path() {
    let path = build_sparkline(&[], &[], HEIGHT, SparklineOptions::default()).unwrap();
    assert!(path.is_empty());
    assert_eq!(path.to_path_data(), "");
}

#[test]
fn extreme_but_finite_values_give_finite_path_data() {
    let path = build_sparkline(
        &[1.0, 1.0],
        &values(&[-1e308, 1e308]),
        HEIGHT,
        SparklineOptions::default(),
    )
    .unwrap();
    assert_eq!(path.to_path_data(), "M 1.00,20.00 L 2.00,0.00");
}
