use peakscan::{PeakScanError, SortedRoundAperture};

fn points_of(aperture: &SortedRoundAperture) -> Vec<(i32, i32)> {
    aperture
        .dx()
        .iter()
        .zip(aperture.dy())
        .map(|(&dx, &dy)| (dx, dy))
        .collect()
}

#[test]
fn all_variants_are_point_symmetric() {
    for radius in 0..8usize {
        let variants = [
            SortedRoundAperture::circle(radius, 1000).unwrap(),
            SortedRoundAperture::ring(radius, 1000).unwrap(),
            SortedRoundAperture::circle_axis_ordered(radius, 1000).unwrap(),
        ];
        for aperture in &variants {
            let mut points = points_of(aperture);
            points.sort_unstable();
            for &(dx, dy) in &points {
                assert!(
                    points.binary_search(&(-dx, dy)).is_ok(),
                    "missing x-mirror of ({dx},{dy}) at radius {radius}"
                );
                assert!(
                    points.binary_search(&(dx, -dy)).is_ok(),
                    "missing y-mirror of ({dx},{dy}) at radius {radius}"
                );
            }
        }
    }
}

#[test]
fn axis_ordered_count_conservation() {
    for radius in 0..8usize {
        let aperture = SortedRoundAperture::circle_axis_ordered(radius, 1000).unwrap();
        assert_eq!(
            aperture.count_without_line() + 2 * aperture.max_radius(),
            aperture.count(),
            "count conservation broken at radius {radius}"
        );
    }
}

#[test]
fn circle_and_axis_ordered_hold_the_same_point_set() {
    for radius in 1..6usize {
        let circle = SortedRoundAperture::circle(radius, 640).unwrap();
        let ordered = SortedRoundAperture::circle_axis_ordered(radius, 640).unwrap();
        let mut a = points_of(&circle);
        let mut b = points_of(&ordered);
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
    }
}

#[test]
fn ring_is_subset_of_circle_with_full_line_extent() {
    for radius in 1..6usize {
        let circle = SortedRoundAperture::circle(radius, 640).unwrap();
        let ring = SortedRoundAperture::ring(radius, 640).unwrap();
        let mut disc = points_of(&circle);
        disc.sort_unstable();
        for point in points_of(&ring) {
            assert!(disc.binary_search(&point).is_ok());
        }
        assert!(ring.count() < circle.count() || radius == 1);
        assert_eq!(ring.max_radius(), radius);
    }
}

#[test]
fn radius_and_stride_limits_are_enforced() {
    assert!(matches!(
        SortedRoundAperture::circle(10_000, 10),
        Err(PeakScanError::RadiusOutOfRange { .. })
    ));
    assert!(SortedRoundAperture::circle(3, 0).is_ok());
    let max_stride = (i32::MAX - 2 * SortedRoundAperture::MAX_SIZE) as usize;
    assert!(matches!(
        SortedRoundAperture::circle(1, max_stride + 1),
        Err(PeakScanError::StrideOutOfRange { .. })
    ));
}
