//! Depth-test settings and opposite-extremum policy selection.
//!
//! A depth test rejects shallow extrema: an accepted extremum must differ
//! from an "opposite" reference value by at least `minimal_depth`. The
//! reference is taken either from the already-validated neighbors of the
//! main aperture or from a separate depth aperture, as a strict opposite
//! extremum, a percentile, or a mean. The policy is resolved once per
//! analysis call; the per-pixel loops never dispatch dynamically.

use crate::aperture::SortedRoundAperture;
use crate::field::BitMatrix;
use crate::util::{PeakScanError, PeakScanResult};

/// How the opposite reference value is aggregated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DepthMode {
    /// Ranked neighbor value selected by the percentile level.
    #[default]
    Percentile,
    /// Arithmetic mean of the center and its neighbors.
    ///
    /// Not NaN-safe: a single `NaN` neighbor poisons the mean, and a `NaN`
    /// reference always fails the depth test. Deliberately preserved.
    Mean,
}

/// Immutable depth-test configuration shared by all workers of one call.
#[derive(Clone, Copy)]
pub(crate) struct DepthTestSettings<'a> {
    /// Separate depth aperture; `None` means the main aperture neighbors
    /// collected during scanning are used instead.
    pub depth_aperture: Option<&'a SortedRoundAperture>,
    pub mode: DepthMode,
    /// Percentile level in `[0, 1]`; `1.0` degenerates to the strict
    /// opposite extremum, `0.0` to the extremum of the same sign.
    pub percentile_level: f64,
    /// Minimal required depth; zero disables the test entirely.
    pub minimal_depth: f64,
    /// Pixels whose ignore bit is set are never reported.
    pub ignore: Option<&'a BitMatrix>,
}

impl Default for DepthTestSettings<'_> {
    fn default() -> Self {
        Self {
            depth_aperture: None,
            mode: DepthMode::Percentile,
            percentile_level: 1.0,
            minimal_depth: 0.0,
            ignore: None,
        }
    }
}

impl DepthTestSettings<'_> {
    pub(crate) fn validate(&self) -> PeakScanResult<()> {
        if !(0.0..=1.0).contains(&self.percentile_level) {
            return Err(PeakScanError::InvalidPercentileLevel(self.percentile_level));
        }
        if self.minimal_depth.is_nan() || self.minimal_depth < 0.0 {
            return Err(PeakScanError::NegativeMinimalDepth(self.minimal_depth));
        }
        Ok(())
    }
}

/// Opposite-extremum strategy, resolved once from
/// `(mode, has_depth_aperture, percentile_level)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum OppositePolicy {
    /// Extreme opposite value among validated main-aperture neighbors.
    StrictInMain,
    /// Percentile of validated main-aperture neighbors at the given level.
    PercentileInMain(f64),
    /// Mean over the center and validated main-aperture neighbors.
    MeanInMain,
    /// Minimum over the depth aperture.
    MinInDepth,
    /// Maximum over the depth aperture.
    MaxInDepth,
    /// Percentile over the depth aperture at the given level.
    PercentileInDepth(f64),
    /// Mean over the center and the depth aperture.
    MeanInDepth,
}

impl OppositePolicy {
    pub(crate) fn resolve(settings: &DepthTestSettings<'_>, maximums: bool) -> Self {
        match settings.mode {
            DepthMode::Percentile => {
                let level = if maximums {
                    1.0 - settings.percentile_level
                } else {
                    settings.percentile_level
                };
                if settings.depth_aperture.is_some() {
                    if level == 0.0 {
                        OppositePolicy::MinInDepth
                    } else if level == 1.0 {
                        OppositePolicy::MaxInDepth
                    } else {
                        OppositePolicy::PercentileInDepth(level)
                    }
                } else if settings.percentile_level == 1.0 {
                    OppositePolicy::StrictInMain
                } else {
                    OppositePolicy::PercentileInMain(level)
                }
            }
            DepthMode::Mean => {
                if settings.depth_aperture.is_some() {
                    OppositePolicy::MeanInDepth
                } else {
                    OppositePolicy::MeanInMain
                }
            }
        }
    }
}

/// Ranked selection at `round(level * (count - 1))`; `NaN` when empty.
pub(crate) fn percentile_in_neighbours(level: f64, neighbours: &mut [f32]) -> f32 {
    if neighbours.is_empty() {
        return f32::NAN;
    }
    neighbours.sort_unstable_by(f32::total_cmp);
    neighbours[(level * (neighbours.len() - 1) as f64).round() as usize]
}
