//! PeakScan is a CPU-first local-extremum detection library for 2D scalar
//! fields.
//!
//! A sorted round aperture defines the neighborhood tested for local
//! maximality/minimality; a three-zone row scan trades bounds checks for
//! speed; a configurable depth test rejects shallow extrema; plateau
//! reduction collapses flat regions to centroids. Optional row-block
//! parallelism via the `rayon` feature.

pub mod aperture;
mod detect;
pub mod field;
mod finder;
mod plateau;
mod trace;
pub mod util;

pub use aperture::SortedRoundAperture;
pub use detect::{Analysis, ExtremumKind, LocalExtremums};
pub use field::{BitMatrix, BitRowsMut, FieldView, Point};
pub use finder::depth::DepthMode;
pub use plateau::PlateauPolicy;
pub use util::{PeakScanError, PeakScanResult};
