#![cfg(feature = "rayon")]

//! Row-block parallel scanning must produce exactly the same bitmap and
//! point set as the sequential path, for any block height.

use peakscan::{ExtremumKind, FieldView, LocalExtremums, PlateauPolicy, Point};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const WIDTH: usize = 257;
const HEIGHT: usize = 257;

fn random_input(seed: u64) -> (Vec<f32>, Vec<bool>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let values = (0..WIDTH * HEIGHT)
        .map(|_| rng.random_range(-1.0f32..1.0))
        .collect();
    let mask = (0..WIDTH * HEIGHT).map(|_| rng.random_bool(0.7)).collect();
    (values, mask)
}

fn sorted_points(
    values: &[f32],
    mask: Option<&[bool]>,
    config: &LocalExtremums,
) -> (Vec<Point>, peakscan::BitMatrix) {
    let field = FieldView::from_slice(values, WIDTH, HEIGHT).unwrap();
    let analysis = config.analyse(field, mask, None).unwrap();
    let mut points = analysis.points;
    points.sort();
    (points, analysis.extremums)
}

#[test]
fn parallel_and_sequential_agree() {
    let (values, mask) = random_input(31);
    for kind in [ExtremumKind::Maximums, ExtremumKind::Minimums] {
        for mask in [None, Some(mask.as_slice())] {
            let base = LocalExtremums {
                kind,
                aperture_size: 5,
                minimal_depth: 0.05,
                plateau: PlateauPolicy::AllPixels,
                ..LocalExtremums::default()
            };
            let sequential = sorted_points(
                &values,
                mask,
                &LocalExtremums {
                    block_len: 0,
                    ..base.clone()
                },
            );
            for block_len in [4, 8, 64, HEIGHT + 1] {
                let parallel = sorted_points(
                    &values,
                    mask,
                    &LocalExtremums {
                        block_len,
                        ..base.clone()
                    },
                );
                assert_eq!(parallel.0, sequential.0, "block_len {block_len}");
                assert_eq!(parallel.1, sequential.1, "block_len {block_len}");
            }
        }
    }
}

#[test]
fn parallel_centroid_reduction_matches_sequential() {
    let (values, _) = random_input(37);
    let base = LocalExtremums {
        aperture_size: 3,
        plateau: PlateauPolicy::Centroid,
        ..LocalExtremums::default()
    };
    let sequential = sorted_points(
        &values,
        None,
        &LocalExtremums {
            block_len: 0,
            ..base.clone()
        },
    );
    let parallel = sorted_points(&values, None, &base);
    assert_eq!(parallel.0, sequential.0);
    assert_eq!(parallel.1, sequential.1);
}
