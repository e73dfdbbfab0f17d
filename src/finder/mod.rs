//! Extremum scanning engine.
//!
//! One finder instance scans a contiguous row range of a scalar field and
//! records local maxima or minima into its owned slice of the result bit
//! matrix. Each image row is processed in three zones:
//!
//! 1. *detailed*: pixels within `max_radius` of the left/right border, every
//!    aperture point bounds-checked before dereferencing;
//! 2. *horizontal prefilter*: interior columns of rows too close to the
//!    top/bottom border, where the cheap `±max_radius` horizontal test runs
//!    first and survivors fall through to the detailed check;
//! 3. *quick*: rows and columns both interior by at least `max_radius`,
//!    where all bounds checks are skipped and the axis-ordered aperture
//!    rejects most candidates after a handful of comparisons.
//!
//! Maxima/minima polarity is a zero-sized type parameter and the
//! masked/unmasked split is a const generic, so all hot loops are
//! monomorphized; the depth-test policy is resolved once per analysis call.

pub(crate) mod depth;

use std::marker::PhantomData;

use crate::aperture::SortedRoundAperture;
use crate::field::{BitMatrix, BitRowsMut, Point};
use depth::{percentile_in_neighbours, DepthTestSettings, OppositePolicy};

/// Comparison direction of the scan, implemented by [`Maxima`] and
/// [`Minima`].
pub(crate) trait Polarity {
    const MAXIMUMS: bool;

    /// Whether a neighbor value disqualifies the center as an extremum.
    fn disqualifies(neighbour: f32, center: f32) -> bool;

    /// Folds a neighbor into the strict opposite extremum (`NaN` skipped).
    fn fold_opposite(acc: f32, value: f32) -> f32;

    /// Signed depth of the extremum against the opposite reference.
    fn depth(center: f32, opposite: f32) -> f64;
}

/// Searches for local maxima.
pub(crate) struct Maxima;

impl Polarity for Maxima {
    const MAXIMUMS: bool = true;

    #[inline]
    fn disqualifies(neighbour: f32, center: f32) -> bool {
        neighbour > center
    }

    #[inline]
    fn fold_opposite(acc: f32, value: f32) -> f32 {
        if value < acc {
            value
        } else {
            acc
        }
    }

    #[inline]
    fn depth(center: f32, opposite: f32) -> f64 {
        f64::from(center) - f64::from(opposite)
    }
}

/// Searches for local minima.
pub(crate) struct Minima;

impl Polarity for Minima {
    const MAXIMUMS: bool = false;

    #[inline]
    fn disqualifies(neighbour: f32, center: f32) -> bool {
        neighbour < center
    }

    #[inline]
    fn fold_opposite(acc: f32, value: f32) -> f32 {
        if value > acc {
            value
        } else {
            acc
        }
    }

    #[inline]
    fn depth(center: f32, opposite: f32) -> f64 {
        f64::from(opposite) - f64::from(center)
    }
}

/// Which neighbor set an accepted candidate carries into the depth test.
#[derive(Clone, Copy)]
enum Neighbours {
    /// The full aperture (quick zone, unmasked path).
    FullAperture,
    /// The in-bounds, mask-passing prefix collected in the scratch buffer.
    Collected,
}

/// Scanning engine for one row block.
///
/// Inputs are validated by the driver before construction; the engine
/// itself only carries debug assertions.
pub(crate) struct ExtremumsFinder<'a, 'bits, P: Polarity> {
    dim_x: usize,
    dim_y: usize,
    values: &'a [f32],
    mask: &'a [bool],
    has_mask: bool,
    aperture: &'a SortedRoundAperture,
    depth_aperture: Option<&'a SortedRoundAperture>,
    ignore: Option<&'a BitMatrix>,
    minimal_depth: f64,
    need_opposite: bool,
    policy: OppositePolicy,
    result: BitRowsMut<'bits>,
    build_points: bool,
    points: Vec<Point>,
    max_radius: usize,
    /// First row on which the quick zone applies; rows closer than this to
    /// either vertical border take the horizontal-prefilter path.
    min_quick_y: usize,
    scratch_offsets: Vec<i32>,
    neighbours_count: usize,
    scratch_values: Vec<f32>,
    y: usize,
    row_start: usize,
    _polarity: PhantomData<P>,
}

impl<'a, 'bits, P: Polarity> ExtremumsFinder<'a, 'bits, P> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        values: &'a [f32],
        mask: Option<&'a [bool]>,
        aperture: &'a SortedRoundAperture,
        settings: &DepthTestSettings<'a>,
        result: BitRowsMut<'bits>,
        dim_x: usize,
        dim_y: usize,
        build_points: bool,
    ) -> Self {
        debug_assert_eq!(values.len(), dim_x * dim_y);
        debug_assert!(mask.map_or(true, |m| m.len() == values.len()));
        debug_assert_eq!(aperture.row_stride(), dim_x);
        let max_radius = aperture.max_radius();
        let scratch_len = aperture
            .count()
            .max(settings.depth_aperture.map_or(0, |a| a.count()));
        Self {
            dim_x,
            dim_y,
            values,
            has_mask: mask.is_some(),
            mask: mask.unwrap_or(&[]),
            aperture,
            depth_aperture: settings.depth_aperture,
            ignore: settings.ignore,
            minimal_depth: settings.minimal_depth,
            need_opposite: settings.minimal_depth > 0.0,
            policy: OppositePolicy::resolve(settings, P::MAXIMUMS),
            result,
            build_points,
            points: Vec::new(),
            max_radius,
            min_quick_y: max_radius + max_radius / dim_x + 1,
            scratch_offsets: vec![0; aperture.count()],
            neighbours_count: 0,
            scratch_values: Vec::with_capacity(scratch_len),
            y: 0,
            row_start: 0,
            _polarity: PhantomData,
        }
    }

    /// Extremum coordinates collected so far, in scan order.
    pub(crate) fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// Scans one image row.
    pub(crate) fn process_line(&mut self, y: usize) {
        debug_assert!(y < self.dim_y);
        self.y = y;
        self.row_start = y * self.dim_x;
        if self.has_mask {
            self.scan_row::<true>();
        } else {
            self.scan_row::<false>();
        }
    }

    fn scan_row<const MASKED: bool>(&mut self) {
        let row_start = self.row_start;
        let left_end = self.max_radius.min(self.dim_x);
        let mid_end = self.dim_x.saturating_sub(self.max_radius).max(left_end);
        for p in row_start..row_start + left_end {
            self.detailed_check::<MASKED>(p);
        }
        if self.y >= self.min_quick_y && self.y + self.min_quick_y < self.dim_y {
            for p in row_start + left_end..row_start + mid_end {
                self.quick_check::<MASKED>(p);
            }
        } else {
            for p in row_start + left_end..row_start + mid_end {
                if self.horizontal_check::<MASKED>(p) {
                    self.detailed_check::<MASKED>(p);
                }
            }
        }
        for p in row_start + mid_end..row_start + self.dim_x {
            self.detailed_check::<MASKED>(p);
        }
    }

    /// Cheap `±max_radius` horizontal test; valid only for interior columns.
    fn horizontal_check<const MASKED: bool>(&self, index0: usize) -> bool {
        let values = self.values;
        let mask = self.mask;
        if MASKED && !mask[index0] {
            return false;
        }
        let v0 = values[index0];
        for k in 1..=self.max_radius {
            if MASKED {
                if (mask[index0 - k] && P::disqualifies(values[index0 - k], v0))
                    || (mask[index0 + k] && P::disqualifies(values[index0 + k], v0))
                {
                    return false;
                }
            } else if P::disqualifies(values[index0 - k], v0)
                || P::disqualifies(values[index0 + k], v0)
            {
                return false;
            }
        }
        true
    }

    /// Interior-pixel check: no bounds tests, early exit on the first
    /// disqualifying neighbor.
    fn quick_check<const MASKED: bool>(&mut self, index0: usize) {
        if !self.horizontal_check::<MASKED>(index0) {
            return;
        }
        let values = self.values;
        let v0 = values[index0];
        let offsets = self.aperture.offsets();
        if MASKED {
            let mask = self.mask;
            let mut count = 0;
            for &offset in offsets {
                let index = offset_index(index0, offset);
                if mask[index] {
                    if P::disqualifies(values[index], v0) {
                        return;
                    }
                    self.scratch_offsets[count] = offset;
                    count += 1;
                }
            }
            self.neighbours_count = count;
            self.process_extremum(index0, Neighbours::Collected);
        } else {
            // The horizontal line points were already tested above, so the
            // axis-ordered aperture is walked without them.
            for &offset in &offsets[..self.aperture.count_without_line()] {
                if P::disqualifies(values[offset_index(index0, offset)], v0) {
                    return;
                }
            }
            self.neighbours_count = self.aperture.count();
            self.process_extremum(index0, Neighbours::FullAperture);
        }
    }

    /// Border-pixel check: every aperture point is bounds-tested before
    /// dereferencing.
    fn detailed_check<const MASKED: bool>(&mut self, index0: usize) {
        let values = self.values;
        let mask = self.mask;
        if MASKED && !mask[index0] {
            return;
        }
        let x0 = (index0 - self.row_start) as i32;
        let y0 = self.y as i32;
        let v0 = values[index0];
        let dim_x = self.dim_x as i32;
        let dim_y = self.dim_y as i32;
        let aperture = self.aperture;
        let dx = aperture.dx();
        let dy = aperture.dy();
        let offsets = aperture.offsets();
        let mut count = 0;
        for k in 0..offsets.len() {
            let x = x0 - dx[k];
            let y = y0 - dy[k];
            if x >= 0 && y >= 0 && x < dim_x && y < dim_y {
                let offset = offsets[k];
                let index = offset_index(index0, offset);
                if !MASKED || mask[index] {
                    if P::disqualifies(values[index], v0) {
                        return;
                    }
                    self.scratch_offsets[count] = offset;
                    count += 1;
                }
            }
        }
        self.neighbours_count = count;
        self.process_extremum(index0, Neighbours::Collected);
    }

    /// Acceptance pipeline for a pixel that survived neighborhood
    /// comparison: NaN filter, ignore bit, depth test, then recording.
    fn process_extremum(&mut self, index0: usize, neighbours: Neighbours) {
        let value = self.values[index0];
        if value.is_nan() {
            return;
        }
        let x = index0 - self.row_start;
        if let Some(ignore) = self.ignore {
            if ignore.get(x, self.y) {
                return;
            }
        }
        if self.need_opposite {
            let depth = P::depth(value, self.opposite_extremum(index0, neighbours));
            // An unresolved (NaN) depth rejects the extremum.
            if depth.is_nan() || depth < self.minimal_depth {
                return;
            }
        }
        if self.build_points {
            self.points.push(Point { x, y: self.y });
        }
        self.result.set(x, self.y);
    }

    fn neighbour_offsets(&self, neighbours: Neighbours) -> &[i32] {
        match neighbours {
            Neighbours::FullAperture => self.aperture.offsets(),
            Neighbours::Collected => &self.scratch_offsets[..self.neighbours_count],
        }
    }

    fn opposite_extremum(&mut self, index0: usize, neighbours: Neighbours) -> f32 {
        match self.policy {
            OppositePolicy::StrictInMain => self.strict_opposite(index0, neighbours),
            OppositePolicy::PercentileInMain(level) => {
                self.percentile_in_main(index0, neighbours, level)
            }
            OppositePolicy::MeanInMain => self.mean_in_main(index0, neighbours),
            OppositePolicy::MinInDepth => self.extreme_in_depth(index0, false),
            OppositePolicy::MaxInDepth => self.extreme_in_depth(index0, true),
            OppositePolicy::PercentileInDepth(level) => self.percentile_in_depth(index0, level),
            OppositePolicy::MeanInDepth => self.mean_in_depth(index0),
        }
    }

    /// Extreme opposite value among the validated same-pass neighbors.
    fn strict_opposite(&self, index0: usize, neighbours: Neighbours) -> f32 {
        let values = self.values;
        let mut extremum = values[index0];
        for &offset in self.neighbour_offsets(neighbours) {
            extremum = P::fold_opposite(extremum, values[offset_index(index0, offset)]);
        }
        extremum
    }

    fn percentile_in_main(&mut self, index0: usize, neighbours: Neighbours, level: f64) -> f32 {
        let values = self.values;
        let center = values[index0];
        let mut buf = std::mem::take(&mut self.scratch_values);
        buf.clear();
        for &offset in self.neighbour_offsets(neighbours) {
            let v = values[offset_index(index0, offset)];
            if !v.is_nan() {
                debug_assert!(
                    !P::disqualifies(v, center),
                    "neighbour {v} beats extremum {center}"
                );
                buf.push(v);
            }
        }
        let result = percentile_in_neighbours(level, &mut buf);
        self.scratch_values = buf;
        result
    }

    /// Mean of the center plus its validated neighbors.
    ///
    /// Not NaN-safe: one NaN neighbor poisons the mean, and the NaN depth
    /// then rejects the extremum. Preserved deliberately.
    fn mean_in_main(&self, index0: usize, neighbours: Neighbours) -> f32 {
        let values = self.values;
        let offsets = self.neighbour_offsets(neighbours);
        // (0,0) is not part of the aperture
        let mut sum = f64::from(values[index0]);
        for &offset in offsets {
            sum += f64::from(values[offset_index(index0, offset)]);
        }
        (sum / (offsets.len() + 1) as f64) as f32
    }

    fn extreme_in_depth(&self, index0: usize, maximum: bool) -> f32 {
        let depth_aperture = self.depth_aperture.expect("policy requires depth aperture");
        let values = self.values;
        let mask = self.mask;
        let x0 = (index0 - self.row_start) as i32;
        let y0 = self.y as i32;
        let dim_x = self.dim_x as i32;
        let dim_y = self.dim_y as i32;
        let dx = depth_aperture.dx();
        let dy = depth_aperture.dy();
        let offsets = depth_aperture.offsets();
        let mut result = if maximum {
            f32::NEG_INFINITY
        } else {
            f32::INFINITY
        };
        let mut found = false;
        for k in 0..offsets.len() {
            let x = x0 - dx[k];
            let y = y0 - dy[k];
            if x >= 0 && y >= 0 && x < dim_x && y < dim_y {
                let index = offset_index(index0, offsets[k]);
                if !self.has_mask || mask[index] {
                    let v = values[index];
                    if !v.is_nan() {
                        found = true;
                        if (maximum && v > result) || (!maximum && v < result) {
                            result = v;
                        }
                    }
                }
            }
        }
        if found {
            result
        } else {
            f32::NAN
        }
    }

    fn percentile_in_depth(&mut self, index0: usize, level: f64) -> f32 {
        let depth_aperture = self.depth_aperture.expect("policy requires depth aperture");
        let values = self.values;
        let mask = self.mask;
        let x0 = (index0 - self.row_start) as i32;
        let y0 = self.y as i32;
        let dim_x = self.dim_x as i32;
        let dim_y = self.dim_y as i32;
        let dx = depth_aperture.dx();
        let dy = depth_aperture.dy();
        let offsets = depth_aperture.offsets();
        let mut buf = std::mem::take(&mut self.scratch_values);
        buf.clear();
        for k in 0..offsets.len() {
            let x = x0 - dx[k];
            let y = y0 - dy[k];
            if x >= 0 && y >= 0 && x < dim_x && y < dim_y {
                let index = offset_index(index0, offsets[k]);
                if !self.has_mask || mask[index] {
                    let v = values[index];
                    if !v.is_nan() {
                        buf.push(v);
                    }
                }
            }
        }
        let result = percentile_in_neighbours(level, &mut buf);
        self.scratch_values = buf;
        result
    }

    /// Mean over the depth aperture; same NaN-poisoning behavior as
    /// [`mean_in_main`](Self::mean_in_main).
    fn mean_in_depth(&self, index0: usize) -> f32 {
        let depth_aperture = self.depth_aperture.expect("policy requires depth aperture");
        let values = self.values;
        let mask = self.mask;
        let x0 = (index0 - self.row_start) as i32;
        let y0 = self.y as i32;
        let dim_x = self.dim_x as i32;
        let dim_y = self.dim_y as i32;
        let dx = depth_aperture.dx();
        let dy = depth_aperture.dy();
        let offsets = depth_aperture.offsets();
        let mut count = 1usize;
        let mut sum = f64::from(values[index0]);
        for k in 0..offsets.len() {
            let x = x0 - dx[k];
            let y = y0 - dy[k];
            if x >= 0 && y >= 0 && x < dim_x && y < dim_y {
                let index = offset_index(index0, offsets[k]);
                if !self.has_mask || mask[index] {
                    sum += f64::from(values[index]);
                    count += 1;
                }
            }
        }
        (sum / count as f64) as f32
    }
}

#[inline]
fn offset_index(index0: usize, offset: i32) -> usize {
    (index0 as isize - offset as isize) as usize
}
