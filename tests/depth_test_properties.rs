use peakscan::{
    DepthMode, ExtremumKind, FieldView, LocalExtremums, PlateauPolicy, Point,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn points(
    values: &[f32],
    width: usize,
    height: usize,
    config: LocalExtremums,
) -> Vec<Point> {
    let field = FieldView::from_slice(values, width, height).unwrap();
    let mut points = config.analyse(field, None, None).unwrap().points;
    points.sort();
    points
}

fn is_subset(smaller: &[Point], larger: &[Point]) -> bool {
    smaller.iter().all(|p| larger.binary_search(p).is_ok())
}

#[test]
fn raising_minimal_depth_never_adds_extremums() {
    let mut rng = StdRng::seed_from_u64(23);
    let values: Vec<f32> = (0..30 * 30).map(|_| rng.random_range(0.0f32..50.0)).collect();
    for kind in [ExtremumKind::Maximums, ExtremumKind::Minimums] {
        let mut previous: Option<Vec<Point>> = None;
        for minimal_depth in [0.0, 1.0, 5.0, 20.0, 100.0] {
            let accepted = points(
                &values,
                30,
                30,
                LocalExtremums {
                    kind,
                    aperture_size: 2,
                    plateau: PlateauPolicy::AllPixels,
                    block_len: 0,
                    minimal_depth,
                    ..LocalExtremums::default()
                },
            );
            if let Some(previous) = &previous {
                assert!(
                    is_subset(&accepted, previous),
                    "depth {minimal_depth} accepted a point the looser threshold rejected"
                );
            }
            previous = Some(accepted);
        }
    }
}

#[test]
fn percentile_reference_is_less_strict_than_the_opposite_extremum() {
    // Peak of 10 whose neighbors are 0, 2, 4, 6. The strict opposite is 0
    // (depth 10); the median neighbor is 4 (depth 6).
    let mut values = vec![0.0f32; 49];
    values[3 * 7 + 3] = 10.0;
    values[3 * 7 + 2] = 2.0;
    values[3 * 7 + 4] = 4.0;
    values[2 * 7 + 3] = 6.0;
    let base = LocalExtremums {
        aperture_size: 1,
        plateau: PlateauPolicy::AllPixels,
        block_len: 0,
        minimal_depth: 7.0,
        ..LocalExtremums::default()
    };

    let strict = points(&values, 7, 7, base.clone());
    assert!(strict.contains(&Point { x: 3, y: 3 }));

    let median = points(
        &values,
        7,
        7,
        LocalExtremums {
            depth_percentile_level: 0.5,
            ..base
        },
    );
    assert!(!median.contains(&Point { x: 3, y: 3 }));
}

#[test]
fn mean_reference_includes_the_center() {
    // Peak of 10 over four zero neighbors: mean is 10/5 = 2, depth 8.
    let mut values = vec![0.0f32; 49];
    values[3 * 7 + 3] = 10.0;
    let base = LocalExtremums {
        aperture_size: 1,
        depth_mode: DepthMode::Mean,
        plateau: PlateauPolicy::AllPixels,
        block_len: 0,
        ..LocalExtremums::default()
    };

    let accepted = points(
        &values,
        7,
        7,
        LocalExtremums {
            minimal_depth: 7.5,
            ..base.clone()
        },
    );
    assert!(accepted.contains(&Point { x: 3, y: 3 }));

    let rejected = points(
        &values,
        7,
        7,
        LocalExtremums {
            minimal_depth: 8.5,
            ..base
        },
    );
    assert!(!rejected.contains(&Point { x: 3, y: 3 }));
}

#[test]
fn ring_depth_aperture_measures_against_the_boundary() {
    // A cone: the ring at radius 2 around the apex holds strictly smaller
    // values, so the depth against the ring minimum accepts the apex.
    let mut values = vec![5.0f32; 81];
    values[4 * 9 + 4] = 10.0;
    for &(x, y) in &[(3, 4), (5, 4), (4, 3), (4, 5)] {
        values[y * 9 + x] = 8.0;
    }
    let accepted = points(
        &values,
        9,
        9,
        LocalExtremums {
            aperture_size: 1,
            depth_aperture_size: 2,
            depth_aperture_ring: true,
            minimal_depth: 4.0,
            plateau: PlateauPolicy::AllPixels,
            block_len: 0,
            ..LocalExtremums::default()
        },
    );
    assert!(accepted.contains(&Point { x: 4, y: 4 }));

    // The same configuration with a stricter threshold rejects it: the
    // ring minimum is 5, so the depth is exactly 5.
    let rejected = points(
        &values,
        9,
        9,
        LocalExtremums {
            aperture_size: 1,
            depth_aperture_size: 2,
            depth_aperture_ring: true,
            minimal_depth: 5.5,
            plateau: PlateauPolicy::AllPixels,
            block_len: 0,
            ..LocalExtremums::default()
        },
    );
    assert!(!rejected.contains(&Point { x: 4, y: 4 }));
}
