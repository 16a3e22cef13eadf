//! Extinction samples over a small disc of sky.

use dust_core::constants::{DEG_TO_RAD, TWOPI};
use dust_core::DustResult;
use serde::Serialize;

use crate::pixel::healpix::{angular_separation_deg, pix2ang_nest, pixel_area, query_disc_nest};
use crate::pixel::SpatialIndex;

/// Per-pixel areas (steradians) and extinctions within a disc.
///
/// Pixels at different resolutions carry different areas; weight by
/// `pixel_area` when summarising.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiskQuery {
    pub pixel_area: Vec<f64>,
    pub extinction: Vec<f64>,
}

impl DiskQuery {
    pub fn len(&self) -> usize {
        self.extinction.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extinction.is_empty()
    }

    pub fn total_area(&self) -> f64 {
        self.pixel_area.iter().sum()
    }

    /// Area-weighted mean extinction, NaN when empty.
    pub fn weighted_mean(&self) -> f64 {
        let (weighted, area) = self
            .pixel_area
            .iter()
            .zip(&self.extinction)
            .fold((0.0, 0.0), |(w, a), (&area, &ext)| (w + area * ext, a + area));
        if area > 0.0 {
            weighted / area
        } else {
            f64::NAN
        }
    }
}

/// Solid angle of a spherical cap, `2π (1 − cos r)`.
pub fn cap_area(radius_deg: f64) -> f64 {
    TWOPI * (1.0 - libm::cos(radius_deg * DEG_TO_RAD))
}

/// Catalog entries whose pixel centre lies within `radius_deg` of the centre,
/// paired with their pixel areas. Every ladder level is searched.
pub(crate) fn entries_in_disc(
    index: &SpatialIndex,
    lon: f64,
    lat: f64,
    radius_deg: f64,
) -> DustResult<Vec<(usize, f64)>> {
    let mut found = Vec::new();
    if !lon.is_finite() || !lat.is_finite() || radius_deg.is_nan() || radius_deg < 0.0 {
        return Ok(found);
    }

    for nside in index.ladder() {
        let area = pixel_area(nside);
        for pixel in query_disc_nest(nside, lon, lat, radius_deg) {
            let (plon, plat) = pix2ang_nest(nside, pixel);
            if angular_separation_deg(lon, lat, plon, plat) > radius_deg {
                continue;
            }
            if let Some(entry) = index.entry_at(nside, pixel)? {
                found.push((entry, area));
            }
        }
    }

    tracing::debug!(lon, lat, radius_deg, pixels = found.len(), "disc query");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{PixelCatalog, PixelInfo};
    use approx::assert_relative_eq;

    #[test]
    fn test_cap_area() {
        assert_relative_eq!(cap_area(180.0), 4.0 * std::f64::consts::PI, epsilon = 1e-12);
        assert_relative_eq!(cap_area(90.0), TWOPI, epsilon = 1e-12);
        assert_eq!(cap_area(0.0), 0.0);
    }

    #[test]
    fn test_weighted_mean() {
        let disk = DiskQuery {
            pixel_area: vec![1.0, 3.0],
            extinction: vec![2.0, 6.0],
        };
        assert_relative_eq!(disk.weighted_mean(), 5.0);
        assert_relative_eq!(disk.total_area(), 4.0);
        assert!(DiskQuery::default().weighted_mean().is_nan());
    }

    #[test]
    fn test_entries_match_brute_force() {
        // nside 8 everywhere except base pixel 0 at nside 1
        let mut entries = vec![PixelInfo::new(0, 1)];
        entries.extend((64..768).map(|p| PixelInfo::new(p, 8)));
        let catalog = PixelCatalog::new(entries).unwrap();
        let index = SpatialIndex::build(&catalog);

        for &(lon, lat, radius) in &[(20.0, 10.0, 12.0), (200.0, -50.0, 20.0), (45.0, 60.0, 40.0)] {
            let mut got: Vec<usize> = entries_in_disc(&index, lon, lat, radius)
                .unwrap()
                .into_iter()
                .map(|(e, _)| e)
                .collect();
            got.sort_unstable();

            let expected: Vec<usize> = catalog
                .entries()
                .iter()
                .enumerate()
                .filter(|(_, info)| {
                    let (plon, plat) = pix2ang_nest(info.nside, info.healpix_index);
                    angular_separation_deg(lon, lat, plon, plat) <= radius
                })
                .map(|(e, _)| e)
                .collect();
            assert_eq!(got, expected, "disc ({}, {}, {})", lon, lat, radius);
        }
    }

    #[test]
    fn test_non_finite_input_is_empty() {
        let catalog = PixelCatalog::new(vec![PixelInfo::new(4, 1)]).unwrap();
        let index = SpatialIndex::build(&catalog);
        assert!(entries_in_disc(&index, f64::NAN, 0.0, 5.0).unwrap().is_empty());
        assert!(entries_in_disc(&index, 0.0, 0.0, -1.0).unwrap().is_empty());
    }
}
