//! Plateau post-processing.
//!
//! A plateau is a maximal 8-connected region of extremum pixels sharing
//! the same value. When the caller wants one representative point per
//! plateau instead of every pixel, the raw extremum bitmap is reduced:
//! connected components are labeled with a two-pass union-find and each
//! component collapses to its rounded centroid. The dilated variant first
//! grows the bitmap with a disc structuring element so that nearby
//! plateaus merge before the centroid is taken.

use crate::field::{BitMatrix, Point};
use crate::util::PeakScanResult;

/// What to report for flat extremum regions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlateauPolicy {
    /// Report every extremum pixel, no reduction.
    AllPixels,
    /// Collapse each 8-connected component to its rounded centroid.
    #[default]
    Centroid,
    /// Dilate the bitmap by a disc of the given radius, then collapse
    /// each component of the dilated bitmap to its rounded centroid.
    CentroidOfDilated {
        /// Structuring-element radius in pixels.
        radius: usize,
    },
}

impl PlateauPolicy {
    /// Whether this policy rewrites the raw bitmap after scanning.
    pub(crate) fn post_processing_required(&self) -> bool {
        !matches!(self, PlateauPolicy::AllPixels)
    }
}

/// Reduces each 8-connected component of `bits` to its rounded centroid.
///
/// Returns the reduced bitmap plus the centroid list in component
/// discovery order (raster order of each component's first pixel). A
/// centroid is only written if it lands inside the matrix, protecting
/// against rounding onto the border.
pub(crate) fn reduce_to_centroids(bits: &BitMatrix) -> PeakScanResult<(BitMatrix, Vec<Point>)> {
    let width = bits.width();
    let height = bits.height();
    let (labels, component_count) = label_components(bits);

    let mut sum_x = vec![0u64; component_count];
    let mut sum_y = vec![0u64; component_count];
    let mut pixel_count = vec![0u64; component_count];
    for y in 0..height {
        for x in 0..width {
            let label = labels[y * width + x];
            if label > 0 {
                let c = (label - 1) as usize;
                sum_x[c] += x as u64;
                sum_y[c] += y as u64;
                pixel_count[c] += 1;
            }
        }
    }

    let mut reduced = BitMatrix::new(width, height)?;
    let mut centroids = Vec::with_capacity(component_count);
    for c in 0..component_count {
        let n = pixel_count[c] as f64;
        let x = (sum_x[c] as f64 / n).round() as usize;
        let y = (sum_y[c] as f64 / n).round() as usize;
        if x < width && y < height {
            reduced.set(x, y);
            centroids.push(Point { x, y });
        }
    }
    Ok((reduced, centroids))
}

/// Dilates the bitmap with a disc structuring element of the given radius.
pub(crate) fn dilate_disc(bits: &BitMatrix, radius: usize) -> PeakScanResult<BitMatrix> {
    let width = bits.width();
    let height = bits.height();
    let mut dilated = BitMatrix::new(width, height)?;
    let r = radius as i64;
    let r_sqr = r * r;
    for Point { x, y } in bits.set_positions() {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r_sqr {
                    continue;
                }
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx >= 0 && ny >= 0 && (nx as usize) < width && (ny as usize) < height {
                    dilated.set(nx as usize, ny as usize);
                }
            }
        }
    }
    Ok(dilated)
}

/// Two-pass union-find labeling under 8-connectivity.
///
/// Returns per-pixel labels (0 = background, components numbered from 1 in
/// raster order of their first pixel) and the component count.
fn label_components(bits: &BitMatrix) -> (Vec<u32>, usize) {
    let width = bits.width();
    let height = bits.height();
    let mut labels = vec![0u32; width * height];
    // parent[0] is the background sentinel
    let mut parent: Vec<u32> = vec![0];

    fn find(parent: &mut [u32], mut label: u32) -> u32 {
        while parent[label as usize] != label {
            parent[label as usize] = parent[parent[label as usize] as usize];
            label = parent[label as usize];
        }
        label
    }

    for y in 0..height {
        for x in 0..width {
            if !bits.get(x, y) {
                continue;
            }
            let idx = y * width + x;
            let mut best = u32::MAX;
            let mut neighbours = [0u32; 4];
            let mut n = 0;
            // West, north-west, north, north-east
            if x > 0 && labels[idx - 1] > 0 {
                neighbours[n] = labels[idx - 1];
                n += 1;
            }
            if y > 0 {
                let up = idx - width;
                if x > 0 && labels[up - 1] > 0 {
                    neighbours[n] = labels[up - 1];
                    n += 1;
                }
                if labels[up] > 0 {
                    neighbours[n] = labels[up];
                    n += 1;
                }
                if x + 1 < width && labels[up + 1] > 0 {
                    neighbours[n] = labels[up + 1];
                    n += 1;
                }
            }
            for &label in &neighbours[..n] {
                best = best.min(label);
            }
            if n == 0 {
                let label = parent.len() as u32;
                parent.push(label);
                labels[idx] = label;
            } else {
                labels[idx] = best;
                for &label in &neighbours[..n] {
                    let root_a = find(&mut parent, label);
                    let root_b = find(&mut parent, best);
                    if root_a != root_b {
                        let (lo, hi) = if root_a < root_b {
                            (root_a, root_b)
                        } else {
                            (root_b, root_a)
                        };
                        parent[hi as usize] = lo;
                    }
                }
            }
        }
    }

    // Second pass: compact roots into consecutive component numbers in
    // raster order of first appearance.
    let mut compact = vec![0u32; parent.len()];
    let mut component_count = 0usize;
    for label in labels.iter_mut() {
        if *label == 0 {
            continue;
        }
        let root = find(&mut parent, *label);
        if compact[root as usize] == 0 {
            component_count += 1;
            compact[root as usize] = component_count as u32;
        }
        *label = compact[root as usize];
    }
    (labels, component_count)
}
