//! Sorted round 2D apertures.
//!
//! An aperture is the fixed set of relative neighbor offsets used to test
//! local extremality. Points are generated on a discrete disc (or its
//! one-pixel boundary ring) and stored with precomputed flat offsets
//! `dy * row_stride + dx`, so the scanning engine can address neighbors
//! with a single integer addition. The origin is never included.
//!
//! Ordering variants:
//! - [`SortedRoundAperture::circle`] / [`SortedRoundAperture::ring`]:
//!   non-decreasing Euclidean radius.
//! - [`SortedRoundAperture::circle_axis_ordered`]: all `dx == 0` points
//!   first, all `dy == 0` points last, interior by decreasing radius. This
//!   lets the engine short-circuit on the two axis directions before
//!   touching the bulk of the disc.

use std::cmp::Ordering;

use crate::util::{PeakScanError, PeakScanResult};

/// Immutable sorted set of round-aperture points bound to a row stride.
#[derive(Clone, Debug)]
pub struct SortedRoundAperture {
    row_stride: usize,
    dx: Vec<i32>,
    dy: Vec<i32>,
    offsets: Vec<i32>,
    hypot_sqr: Vec<i32>,
    count_without_line: usize,
    max_radius: usize,
    sorted_by_increasing_radius: bool,
}

impl SortedRoundAperture {
    /// Hard ceiling on the aperture radius.
    ///
    /// Guarantees `dx * dx + dy * dy <= i32::MAX / 4` for every point.
    pub const MAX_SIZE: i32 = 10_000;

    /// Builds a disc aperture sorted by increasing radius.
    pub fn circle(radius: usize, row_stride: usize) -> PeakScanResult<Self> {
        Self::build(radius, row_stride, false, false)
    }

    /// Builds a one-pixel boundary ring sorted by increasing radius.
    ///
    /// The ring is the disc minus its erosion by the 4-connected cross,
    /// i.e. only the outermost shell of the disc survives.
    pub fn ring(radius: usize, row_stride: usize) -> PeakScanResult<Self> {
        Self::build(radius, row_stride, true, false)
    }

    /// Builds a disc aperture with the axis points specially ordered.
    pub fn circle_axis_ordered(radius: usize, row_stride: usize) -> PeakScanResult<Self> {
        Self::build(radius, row_stride, false, true)
    }

    fn build(
        radius: usize,
        row_stride: usize,
        boundary: bool,
        axis_ordered: bool,
    ) -> PeakScanResult<Self> {
        if radius >= Self::MAX_SIZE as usize {
            return Err(PeakScanError::RadiusOutOfRange {
                radius: radius as i64,
                max: Self::MAX_SIZE,
            });
        }
        let max_stride = i32::MAX - 2 * Self::MAX_SIZE;
        if row_stride > max_stride as usize {
            return Err(PeakScanError::StrideOutOfRange {
                stride: row_stride as i64,
                max: max_stride,
            });
        }
        let r = radius as i32;
        let mut points = disc_points(r);
        if boundary {
            points = disc_boundary(&points, r);
        }
        if axis_ordered {
            points.sort_by(axis_ordered_cmp);
        } else {
            points.sort_by_key(|&(dx, dy)| dx * dx + dy * dy);
        }

        let mut aperture = Self {
            row_stride,
            dx: Vec::with_capacity(points.len()),
            dy: Vec::with_capacity(points.len()),
            offsets: Vec::with_capacity(points.len()),
            hypot_sqr: Vec::with_capacity(points.len()),
            count_without_line: 0,
            max_radius: 0,
            sorted_by_increasing_radius: !axis_ordered,
        };
        let mut min_x_at_zero_y = 0i32;
        let mut max_x_at_zero_y = 0i32;
        for &(dx, dy) in &points {
            if dx == 0 && dy == 0 {
                continue;
            }
            if dy == 0 {
                min_x_at_zero_y = min_x_at_zero_y.min(dx);
                max_x_at_zero_y = max_x_at_zero_y.max(dx);
            }
            let offset = i64::from(dy) * row_stride as i64 + i64::from(dx);
            let offset = i32::try_from(offset).map_err(|_| PeakScanError::StrideOutOfRange {
                stride: row_stride as i64,
                max: max_stride,
            })?;
            aperture.dx.push(dx);
            aperture.dy.push(dy);
            aperture.offsets.push(offset);
            aperture.hypot_sqr.push(dx * dx + dy * dy);
        }
        // Asymmetric extents mean a broken point generator, not bad input.
        assert!(
            max_x_at_zero_y + min_x_at_zero_y == 0,
            "asymmetric disc generator: min {min_x_at_zero_y}, max {max_x_at_zero_y}"
        );
        assert!(max_x_at_zero_y <= Self::MAX_SIZE);
        aperture.max_radius = max_x_at_zero_y as usize;
        let count = aperture.dx.len();
        if !axis_ordered {
            aperture.count_without_line = count;
        } else {
            let line = 2 * aperture.max_radius;
            aperture.count_without_line = count - line;
            assert!(
                aperture.dx[..line].iter().all(|&dx| dx == 0),
                "axis ordering broken: vertical points not first"
            );
            assert!(
                aperture.dy[aperture.count_without_line..].iter().all(|&dy| dy == 0),
                "axis ordering broken: horizontal points not last"
            );
        }
        Ok(aperture)
    }

    /// Row stride the flat offsets were computed against.
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// X-offsets of all aperture points.
    pub fn dx(&self) -> &[i32] {
        &self.dx
    }

    /// Y-offsets of all aperture points.
    pub fn dy(&self) -> &[i32] {
        &self.dy
    }

    /// Flat offsets (`dy * row_stride + dx`) of all aperture points.
    pub fn offsets(&self) -> &[i32] {
        &self.offsets
    }

    /// Squared Euclidean radius of point `k`.
    pub fn hypot_sqr(&self, k: usize) -> i32 {
        self.hypot_sqr[k]
    }

    /// Total number of points (origin excluded).
    pub fn count(&self) -> usize {
        self.dx.len()
    }

    /// Number of points excluding the horizontal `dy == 0` line.
    ///
    /// Equals [`count`](Self::count) for the plain ordering variants.
    pub fn count_without_line(&self) -> usize {
        self.count_without_line
    }

    /// Half the horizontal line length (the aperture radius for discs).
    pub fn max_radius(&self) -> usize {
        self.max_radius
    }

    /// Whether points are sorted by non-decreasing radius.
    pub fn is_sorted_by_increasing_radius(&self) -> bool {
        self.sorted_by_increasing_radius
    }
}

fn disc_points(r: i32) -> Vec<(i32, i32)> {
    let r_sqr = r * r;
    let mut points = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r_sqr {
                points.push((dx, dy));
            }
        }
    }
    points
}

/// Keeps only disc points with at least one 4-connected neighbor outside
/// the disc (the disc minus its erosion by the cross).
fn disc_boundary(points: &[(i32, i32)], r: i32) -> Vec<(i32, i32)> {
    let r_sqr = r * r;
    let inside = |dx: i32, dy: i32| dx * dx + dy * dy <= r_sqr;
    points
        .iter()
        .copied()
        .filter(|&(dx, dy)| {
            !inside(dx - 1, dy) || !inside(dx + 1, dy) || !inside(dx, dy - 1) || !inside(dx, dy + 1)
        })
        .collect()
}

fn axis_ordered_cmp(a: &(i32, i32), b: &(i32, i32)) -> Ordering {
    match (a.0 == 0, b.0 == 0) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    // All dx == 0 are first
    match (a.1 == 0, b.1 == 0) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }
    // All dy == 0 are last; the rest by decreasing radius. The line points
    // stay in the arrays even though the engine prefilters the horizontal
    // direction: the opposite-extremum policies still need their offsets.
    let ra = a.0 * a.0 + a.1 * a.1;
    let rb = b.0 * b.0 + b.1 * b.1;
    rb.cmp(&ra)
}
