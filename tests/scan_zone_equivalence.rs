//! The three-zone scan is a performance optimization, not a behavior
//! change: on small random fields its output must match a brute-force
//! bounds-checked classification of every pixel.

use peakscan::{ExtremumKind, FieldView, LocalExtremums, PlateauPolicy, Point};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_field(rng: &mut StdRng, len: usize, nan_share: f64) -> Vec<f32> {
    (0..len)
        .map(|_| {
            if rng.random_bool(nan_share) {
                f32::NAN
            } else {
                rng.random_range(0.0f32..100.0)
            }
        })
        .collect()
}

fn disc_offsets(radius: i32) -> Vec<(i32, i32)> {
    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if (dx != 0 || dy != 0) && dx * dx + dy * dy <= radius * radius {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

/// Bounds-checked classification of every pixel, no zoning.
fn brute_force(
    values: &[f32],
    mask: Option<&[bool]>,
    width: usize,
    height: usize,
    radius: i32,
    maximums: bool,
) -> Vec<Point> {
    let offsets = disc_offsets(radius);
    let mut accepted = Vec::new();
    for y in 0..height {
        'pixel: for x in 0..width {
            let index = y * width + x;
            if mask.is_some_and(|m| !m[index]) {
                continue;
            }
            let v0 = values[index];
            if v0.is_nan() {
                continue;
            }
            for &(dx, dy) in &offsets {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                    continue;
                }
                let n_index = ny as usize * width + nx as usize;
                if mask.is_some_and(|m| !m[n_index]) {
                    continue;
                }
                let v = values[n_index];
                if (maximums && v > v0) || (!maximums && v < v0) {
                    continue 'pixel;
                }
            }
            accepted.push(Point { x, y });
        }
    }
    accepted
}

fn engine_points(
    values: &[f32],
    mask: Option<&[bool]>,
    width: usize,
    height: usize,
    radius: usize,
    kind: ExtremumKind,
) -> Vec<Point> {
    let field = FieldView::from_slice(values, width, height).unwrap();
    let config = LocalExtremums {
        kind,
        aperture_size: radius,
        plateau: PlateauPolicy::AllPixels,
        block_len: 0,
        ..LocalExtremums::default()
    };
    let analysis = config.analyse(field, mask, None).unwrap();
    let mut points = analysis.points;
    points.sort();
    // The bitmap and the coordinate list must agree.
    let mut from_bitmap = analysis.extremums.set_positions();
    from_bitmap.sort();
    assert_eq!(points, from_bitmap);
    points
}

#[test]
fn unmasked_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(7);
    for radius in 1..=3usize {
        for _ in 0..20 {
            let values = random_field(&mut rng, 20 * 20, 0.05);
            let mut expected = brute_force(&values, None, 20, 20, radius as i32, true);
            expected.sort();
            let actual = engine_points(&values, None, 20, 20, radius, ExtremumKind::Maximums);
            assert_eq!(actual, expected, "radius {radius}");
        }
    }
}

#[test]
fn masked_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(11);
    for radius in 1..=3usize {
        for _ in 0..20 {
            let values = random_field(&mut rng, 20 * 20, 0.05);
            let mask: Vec<bool> = (0..20 * 20).map(|_| rng.random_bool(0.7)).collect();
            let mut expected = brute_force(&values, Some(&mask), 20, 20, radius as i32, true);
            expected.sort();
            let actual = engine_points(
                &values,
                Some(&mask),
                20,
                20,
                radius,
                ExtremumKind::Maximums,
            );
            assert_eq!(actual, expected, "radius {radius}");
        }
    }
}

#[test]
fn minima_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(13);
    for radius in 1..=3usize {
        for _ in 0..10 {
            let values = random_field(&mut rng, 20 * 20, 0.0);
            let mut expected = brute_force(&values, None, 20, 20, radius as i32, false);
            expected.sort();
            let actual = engine_points(&values, None, 20, 20, radius, ExtremumKind::Minimums);
            assert_eq!(actual, expected, "radius {radius}");
        }
    }
}

#[test]
fn narrow_fields_are_handled_by_the_detailed_zone() {
    // Width or height smaller than the aperture leaves no quick zone.
    let mut rng = StdRng::seed_from_u64(17);
    for (width, height, radius) in [(3usize, 30usize, 3usize), (30, 3, 3), (4, 4, 5)] {
        let values = random_field(&mut rng, width * height, 0.0);
        let mut expected = brute_force(&values, None, width, height, radius as i32, true);
        expected.sort();
        let actual = engine_points(&values, None, width, height, radius, ExtremumKind::Maximums);
        assert_eq!(actual, expected, "{width}x{height} radius {radius}");
    }
}
