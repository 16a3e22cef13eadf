use dust_core::DustResult;

use super::{broadcast_len, cap_area, DiskQuery, DustMap3D};

/// A sky without dust: every sightline has zero extinction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroMap;

impl ZeroMap {
    pub fn new() -> Self {
        Self
    }
}

impl DustMap3D for ZeroMap {
    fn evaluate(&self, _lon: f64, _lat: f64, _distance_kpc: f64) -> DustResult<f64> {
        Ok(0.0)
    }

    fn evaluate_batch(
        &self,
        lons: &[f64],
        lats: &[f64],
        distances_kpc: &[f64],
    ) -> DustResult<Vec<f64>> {
        let n = broadcast_len(
            "evaluate_batch",
            &[lons.len(), lats.len(), distances_kpc.len()],
        )?;
        Ok(vec![0.0; n])
    }

    /// One element covering the whole cap.
    fn query_disk(
        &self,
        _lon: f64,
        _lat: f64,
        _distance_kpc: f64,
        radius_deg: f64,
    ) -> DustResult<DiskQuery> {
        Ok(DiskQuery {
            pixel_area: vec![cap_area(radius_deg)],
            extinction: vec![0.0],
        })
    }
}
