//! Top-level local-extremum analysis.
//!
//! [`LocalExtremums`] owns the per-call configuration, builds the main and
//! depth apertures for the field width, partitions the image rows into
//! contiguous blocks, and runs one scanning-engine instance per block.
//! The result bitmap is shared but partitioned by row ownership: the
//! row-aligned [`BitMatrix`] storage lets each worker borrow its own word
//! slice, so no synchronization is needed while scanning. Per-block
//! coordinate lists are concatenated in block submission order.

use std::time::Instant;

use crate::aperture::SortedRoundAperture;
use crate::field::{BitMatrix, FieldView, Point};
use crate::finder::depth::{DepthMode, DepthTestSettings};
use crate::finder::{ExtremumsFinder, Maxima, Minima, Polarity};
use crate::plateau::{self, PlateauPolicy};
use crate::trace::trace_event;
use crate::util::{PeakScanError, PeakScanResult};

/// Rows per parallel block when the caller does not override it.
const DEFAULT_Y_BLOCK_LEN: usize = 8;
/// Lower bound on the block height; every block allocates scratch buffers
/// proportional to the aperture size, so very small blocks do not pay off.
const MIN_Y_BLOCK_LEN: usize = 4;

/// Whether to search for local maxima or minima.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtremumKind {
    /// Report local maxima.
    #[default]
    Maximums,
    /// Report local minima.
    Minimums,
}

/// Local-extremum detection configuration.
///
/// Plain value struct; construct with struct-update syntax over
/// [`Default`]. All parameters are validated by
/// [`analyse`](LocalExtremums::analyse) before any scanning starts.
#[derive(Clone, Debug)]
pub struct LocalExtremums {
    /// Search polarity.
    pub kind: ExtremumKind,
    /// Main aperture radius in pixels.
    pub aperture_size: usize,
    /// Depth aperture radius; `0` means "same as the main aperture", in
    /// which case a separate depth aperture is only built when
    /// [`depth_aperture_ring`](Self::depth_aperture_ring) is set.
    pub depth_aperture_size: usize,
    /// Use only the boundary ring of the depth aperture disc.
    pub depth_aperture_ring: bool,
    /// How the opposite reference value for the depth test is aggregated.
    pub depth_mode: DepthMode,
    /// Percentile level in `[0, 1]` for [`DepthMode::Percentile`].
    pub depth_percentile_level: f64,
    /// Minimal required depth; `0` disables the depth test.
    pub minimal_depth: f64,
    /// What to report for flat extremum regions.
    pub plateau: PlateauPolicy,
    /// Rows per parallel block; `0` forces single-threaded execution.
    /// Only effective with the `rayon` feature.
    pub block_len: usize,
}

impl Default for LocalExtremums {
    fn default() -> Self {
        Self {
            kind: ExtremumKind::Maximums,
            aperture_size: 5,
            depth_aperture_size: 0,
            depth_aperture_ring: false,
            depth_mode: DepthMode::Percentile,
            depth_percentile_level: 1.0,
            minimal_depth: 0.0,
            plateau: PlateauPolicy::Centroid,
            block_len: DEFAULT_Y_BLOCK_LEN,
        }
    }
}

/// Result of one analysis call.
#[derive(Clone, Debug)]
pub struct Analysis {
    /// One bit per accepted extremum (reduced when a plateau policy ran).
    pub extremums: BitMatrix,
    /// Extremum coordinates. For [`PlateauPolicy::AllPixels`] these are
    /// the raw pixels in block submission order (sort for a canonical
    /// order); for the centroid policies, one rounded centroid per
    /// plateau component.
    pub points: Vec<Point>,
}

impl LocalExtremums {
    /// Scans `field` for local extrema.
    ///
    /// `mask` restricts which pixels may participate (center and
    /// neighbors); `ignore` suppresses reporting of otherwise valid
    /// extrema. Both default to "everything allowed".
    pub fn analyse(
        &self,
        field: FieldView<'_>,
        mask: Option<&[bool]>,
        ignore: Option<&BitMatrix>,
    ) -> PeakScanResult<Analysis> {
        let t_start = Instant::now();
        let width = field.width();
        let height = field.height();
        if let Some(mask) = mask {
            if mask.len() != field.as_slice().len() {
                return Err(PeakScanError::BufferSizeMismatch {
                    expected: field.as_slice().len(),
                    got: mask.len(),
                });
            }
        }
        if let Some(ignore) = ignore {
            if ignore.width() != width || ignore.height() != height {
                return Err(PeakScanError::BufferSizeMismatch {
                    expected: width * height,
                    got: ignore.width() * ignore.height(),
                });
            }
        }

        let aperture = SortedRoundAperture::circle_axis_ordered(self.aperture_size, width)?;
        let depth_size = if self.depth_aperture_size == 0 {
            self.aperture_size
        } else {
            self.depth_aperture_size
        };
        let depth_aperture = if depth_size == self.aperture_size && !self.depth_aperture_ring {
            None
        } else if self.depth_aperture_ring {
            Some(SortedRoundAperture::ring(depth_size, width)?)
        } else {
            Some(SortedRoundAperture::circle(depth_size, width)?)
        };
        let settings = DepthTestSettings {
            depth_aperture: depth_aperture.as_ref(),
            mode: self.depth_mode,
            percentile_level: self.depth_percentile_level,
            minimal_depth: self.minimal_depth,
            ignore,
        };
        settings.validate()?;

        let mut extremums = BitMatrix::new(width, height)?;
        let build_points = !self.plateau.post_processing_required();
        let block_len = self.effective_block_len(height);
        let t_prepared = Instant::now();

        let raw_points = match self.kind {
            ExtremumKind::Maximums => scan_blocks::<Maxima>(
                field,
                mask,
                &aperture,
                settings,
                &mut extremums,
                build_points,
                block_len,
            ),
            ExtremumKind::Minimums => scan_blocks::<Minima>(
                field,
                mask,
                &aperture,
                settings,
                &mut extremums,
                build_points,
                block_len,
            ),
        };
        let t_scanned = Instant::now();

        let (extremums, points) = match self.plateau {
            PlateauPolicy::AllPixels => (extremums, raw_points),
            PlateauPolicy::Centroid => {
                let (reduced, centroids) = plateau::reduce_to_centroids(&extremums)?;
                (reduced, centroids)
            }
            PlateauPolicy::CentroidOfDilated { radius } => {
                let dilated = plateau::dilate_disc(&extremums, radius)?;
                let (reduced, centroids) = plateau::reduce_to_centroids(&dilated)?;
                (reduced, centroids)
            }
        };
        let t_done = Instant::now();
        trace_event!(
            "local_extremums",
            width = width,
            height = height,
            aperture_points = aperture.count(),
            extremums = points.len(),
            prepare_ms = (t_prepared - t_start).as_secs_f64() * 1e3,
            scan_ms = (t_scanned - t_prepared).as_secs_f64() * 1e3,
            postprocess_ms = (t_done - t_scanned).as_secs_f64() * 1e3,
        );
        Ok(Analysis { extremums, points })
    }

    /// Block height for the parallel path; `None` means sequential.
    fn effective_block_len(&self, height: usize) -> Option<usize> {
        if !cfg!(feature = "rayon") || self.block_len == 0 {
            return None;
        }
        let threads = std::thread::available_parallelism().map_or(1, |n| n.get());
        if threads == 1 {
            return None;
        }
        Some(MIN_Y_BLOCK_LEN.max(self.block_len.min(height / threads)))
    }
}

#[cfg(feature = "rayon")]
fn scan_blocks<P: Polarity>(
    field: FieldView<'_>,
    mask: Option<&[bool]>,
    aperture: &SortedRoundAperture,
    settings: DepthTestSettings<'_>,
    extremums: &mut BitMatrix,
    build_points: bool,
    block_len: Option<usize>,
) -> Vec<Point> {
    use rayon::prelude::*;

    let Some(block_len) = block_len else {
        return scan_sequential::<P>(field, mask, aperture, settings, extremums, build_points);
    };
    let block_lists: Vec<Vec<Point>> = extremums
        .split_rows_mut(block_len)
        .into_par_iter()
        .map(|rows| {
            let first_row = rows.first_row();
            let row_count = rows.rows();
            let mut finder: ExtremumsFinder<'_, '_, P> = ExtremumsFinder::new(
                field.as_slice(),
                mask,
                aperture,
                &settings,
                rows,
                field.width(),
                field.height(),
                build_points,
            );
            for y in first_row..first_row + row_count {
                finder.process_line(y);
            }
            finder.into_points()
        })
        .collect();
    block_lists.concat()
}

#[cfg(not(feature = "rayon"))]
fn scan_blocks<P: Polarity>(
    field: FieldView<'_>,
    mask: Option<&[bool]>,
    aperture: &SortedRoundAperture,
    settings: DepthTestSettings<'_>,
    extremums: &mut BitMatrix,
    build_points: bool,
    _block_len: Option<usize>,
) -> Vec<Point> {
    scan_sequential::<P>(field, mask, aperture, settings, extremums, build_points)
}

fn scan_sequential<P: Polarity>(
    field: FieldView<'_>,
    mask: Option<&[bool]>,
    aperture: &SortedRoundAperture,
    settings: DepthTestSettings<'_>,
    extremums: &mut BitMatrix,
    build_points: bool,
) -> Vec<Point> {
    let rows = extremums.all_rows_mut();
    let mut finder: ExtremumsFinder<'_, '_, P> = ExtremumsFinder::new(
        field.as_slice(),
        mask,
        aperture,
        &settings,
        rows,
        field.width(),
        field.height(),
        build_points,
    );
    for y in 0..field.height() {
        finder.process_line(y);
    }
    finder.into_points()
}
