//! Full-sky rasterisation at the finest resolution of a map.

use crate::pixel::healpix::{ang2pix_nest, npix, pixel_area};

/// Nested full-sky array at a single nside. Uncovered pixels hold NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyRaster {
    pub nside: u32,
    /// Distance modulus of the bin that was sampled.
    pub distmod: f64,
    pub values: Vec<f64>,
}

impl SkyRaster {
    pub fn npix(&self) -> u64 {
        npix(self.nside)
    }

    /// Value of the pixel containing `(lon, lat)`.
    pub fn value_at(&self, lon: f64, lat: f64) -> f64 {
        self.values[ang2pix_nest(self.nside, lon, lat) as usize]
    }

    /// Fraction of the sky with a finite value.
    pub fn coverage(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let covered = self.values.iter().filter(|v| v.is_finite()).count();
        covered as f64 / self.values.len() as f64
    }

    /// Solid angle covered, in steradians.
    pub fn covered_area(&self) -> f64 {
        let covered = self.values.iter().filter(|v| v.is_finite()).count();
        covered as f64 * pixel_area(self.nside)
    }
}

/// Index of the abscissa closest to `distmod`; ties go to the lower bin.
pub(crate) fn nearest_bin(distmods: &[f64], distmod: f64) -> usize {
    let mut best = 0;
    let mut best_gap = f64::INFINITY;
    for (i, &d) in distmods.iter().enumerate() {
        let gap = (d - distmod).abs();
        if gap < best_gap {
            best = i;
            best_gap = gap;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_bin() {
        let grid = [4.0, 4.5, 5.0, 5.5];
        assert_eq!(nearest_bin(&grid, 3.0), 0);
        assert_eq!(nearest_bin(&grid, 4.6), 1);
        assert_eq!(nearest_bin(&grid, 4.75), 1);
        assert_eq!(nearest_bin(&grid, 5.3), 3);
        assert_eq!(nearest_bin(&grid, 25.0), 3);
    }

    #[test]
    fn test_coverage() {
        let raster = SkyRaster {
            nside: 1,
            distmod: 10.0,
            values: (0..12).map(|p| if p < 3 { f64::NAN } else { 1.0 }).collect(),
        };
        assert_eq!(raster.npix(), 12);
        assert_eq!(raster.coverage(), 0.75);
        assert!(raster.value_at(45.0, 60.0).is_nan());
        assert_eq!(raster.value_at(0.0, 0.0), 1.0);
        assert!((raster.covered_area() - 9.0 * std::f64::consts::PI / 3.0).abs() < 1e-12);
    }
}
