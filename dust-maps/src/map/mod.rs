//! Queryable extinction maps.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`DustMap3D`] | Capability trait shared by all maps |
//! | [`HealpixExtinctionMap`] | Mixed-resolution HEALPix map with cached radial profiles |
//! | [`ZeroMap`] | Extinction-free sky, for testing and baselines |
//! | [`MapConfig`] | Filter, calibration, spline order, sample loading |
//! | [`DiskQuery`] / [`SkyRaster`] | Disc and full-sky results |
//!
//! Distances are in kiloparsecs, coordinates are Galactic `(l, b)` in degrees.

mod config;
mod disk;
mod hierarchical;
mod profile;
mod raster;
mod zero;

use dust_core::{DustError, DustResult};

pub use config::MapConfig;
pub use disk::{cap_area, DiskQuery};
pub use hierarchical::{HealpixExtinctionMap, MapState};
pub use profile::{RadialProfile, RadialProfileCache};
pub use raster::SkyRaster;
pub use zero::ZeroMap;

/// Common interface of every 3-D extinction map.
pub trait DustMap3D: Send + Sync {
    /// Extinction towards `(lon, lat)` at `distance_kpc`.
    ///
    /// # Errors
    /// [`DustError::OutOfFootprint`] when the map does not cover the sightline.
    fn evaluate(&self, lon: f64, lat: f64, distance_kpc: f64) -> DustResult<f64>;

    /// Extinction at several distances along one sightline.
    fn evaluate_along(&self, lon: f64, lat: f64, distances_kpc: &[f64]) -> DustResult<Vec<f64>> {
        distances_kpc
            .iter()
            .map(|&d| self.evaluate(lon, lat, d))
            .collect()
    }

    /// Element-wise extinction for broadcastable inputs (each of length 1 or N).
    ///
    /// Sightlines outside the footprint yield NaN instead of an error.
    fn evaluate_batch(
        &self,
        lons: &[f64],
        lats: &[f64],
        distances_kpc: &[f64],
    ) -> DustResult<Vec<f64>>;

    /// Extinction of every map pixel whose centre lies within `radius_deg`.
    fn query_disk(
        &self,
        lon: f64,
        lat: f64,
        distance_kpc: f64,
        radius_deg: f64,
    ) -> DustResult<DiskQuery>;

    /// Replaces the best fit with posterior sample `sample`.
    fn substitute_sample(&mut self, _sample: usize) -> DustResult<()> {
        Err(DustError::SamplesUnavailable)
    }
}

/// Common length of broadcastable inputs: each must have length 1 or N.
pub(crate) fn broadcast_len(operation: &str, lens: &[usize]) -> DustResult<usize> {
    let n = lens.iter().copied().find(|&len| len != 1).unwrap_or(1);
    if lens.iter().all(|&len| len == 1 || len == n) {
        Ok(n)
    } else {
        Err(DustError::shape_mismatch(
            operation,
            format!("cannot broadcast lengths {:?}", lens),
        ))
    }
}

/// Element `i` of a slice broadcast to any length.
#[inline]
pub(crate) fn broadcast_get(values: &[f64], i: usize) -> f64 {
    if values.len() == 1 {
        values[0]
    } else {
        values[i]
    }
}
