//! Coordinate → catalog-entry resolution over the resolution ladder.

use dust_core::{DustError, DustResult};
use rayon::prelude::*;

use super::catalog::PixelCatalog;
use super::healpix::{ang2pix_nest, degrade_pixel, pix2ang_nest};

/// Sorted `(pixel, entry)` pairs for one nside.
#[derive(Debug, Clone)]
struct Level {
    nside: u32,
    pixels: Vec<(u64, usize)>,
}

impl Level {
    /// Entry at `pixel`, `None` if absent, `AmbiguousMatch` if duplicated.
    fn lookup(&self, pixel: u64, lon: f64, lat: f64) -> DustResult<Option<usize>> {
        let start = self.pixels.partition_point(|&(p, _)| p < pixel);
        let end = start + self.pixels[start..].partition_point(|&(p, _)| p == pixel);
        match end - start {
            0 => Ok(None),
            1 => Ok(Some(self.pixels[start].1)),
            matches => Err(DustError::AmbiguousMatch {
                lon,
                lat,
                nside: self.nside,
                pixel,
                matches,
            }),
        }
    }
}

/// Resolves sky coordinates to unique catalog entries.
///
/// Levels are searched finest first and the first hit wins. Each level keeps
/// its pixel ids sorted, so a lookup is one `ang2pix` plus a binary search.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    levels: Vec<Level>,
}

impl SpatialIndex {
    pub fn build(catalog: &PixelCatalog) -> Self {
        let levels: Vec<Level> = catalog
            .resolution_ladder()
            .into_iter()
            .map(|nside| {
                let mut pixels: Vec<(u64, usize)> = catalog
                    .entries()
                    .iter()
                    .enumerate()
                    .filter(|(_, info)| info.nside == nside)
                    .map(|(entry, info)| (info.healpix_index, entry))
                    .collect();
                pixels.sort_unstable();
                Level { nside, pixels }
            })
            .collect();

        tracing::debug!(
            levels = levels.len(),
            finest = levels.first().map(|l| l.nside),
            coarsest = levels.last().map(|l| l.nside),
            "built spatial index"
        );

        Self { levels }
    }

    /// Ladder nsides, finest first.
    pub fn ladder(&self) -> Vec<u32> {
        self.levels.iter().map(|l| l.nside).collect()
    }

    pub fn finest_nside(&self) -> u32 {
        self.levels.first().map_or(1, |l| l.nside)
    }

    /// Entry containing `(lon, lat)`.
    ///
    /// # Errors
    /// [`DustError::OutOfFootprint`] when no level matches (including
    /// non-finite input) and [`DustError::AmbiguousMatch`] on duplicates.
    pub fn resolve(&self, lon: f64, lat: f64) -> DustResult<usize> {
        self.try_resolve(lon, lat)?
            .ok_or_else(|| DustError::out_of_footprint(lon, lat))
    }

    /// Like [`resolve`](Self::resolve) but reports a miss as `Ok(None)`.
    pub fn try_resolve(&self, lon: f64, lat: f64) -> DustResult<Option<usize>> {
        if !lon.is_finite() || !lat.is_finite() {
            return Ok(None);
        }
        for level in &self.levels {
            let pixel = ang2pix_nest(level.nside, lon, lat);
            if let Some(entry) = level.lookup(pixel, lon, lat)? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Resolves many coordinates at once.
    ///
    /// Each level only visits coordinates that no finer level matched, so a
    /// resolved slot is never overwritten. Misses and non-finite input come
    /// back as `None`; duplicates still fail the whole call.
    pub fn resolve_many(&self, lons: &[f64], lats: &[f64]) -> DustResult<Vec<Option<usize>>> {
        if lons.len() != lats.len() {
            return Err(DustError::shape_mismatch(
                "resolve_many",
                format!("{} longitudes but {} latitudes", lons.len(), lats.len()),
            ));
        }

        let mut resolved: Vec<Option<usize>> = vec![None; lons.len()];
        let mut pending: Vec<usize> = (0..lons.len())
            .filter(|&i| lons[i].is_finite() && lats[i].is_finite())
            .collect();

        for level in &self.levels {
            if pending.is_empty() {
                break;
            }
            let hits: Vec<Option<usize>> = pending
                .par_iter()
                .map(|&i| {
                    let pixel = ang2pix_nest(level.nside, lons[i], lats[i]);
                    level.lookup(pixel, lons[i], lats[i])
                })
                .collect::<DustResult<_>>()?;

            let mut still_pending = Vec::with_capacity(pending.len());
            for (&i, hit) in pending.iter().zip(hits) {
                match hit {
                    Some(entry) => resolved[i] = Some(entry),
                    None => still_pending.push(i),
                }
            }
            pending = still_pending;
        }

        Ok(resolved)
    }

    /// Entry covering `pixel` of the finest level, searching coarser ancestors.
    pub fn resolve_finest_pixel(&self, pixel: u64) -> DustResult<Option<usize>> {
        let finest = self.finest_nside();
        for level in &self.levels {
            let ancestor = degrade_pixel(pixel, finest, level.nside);
            let found = level.pixels.binary_search_by_key(&ancestor, |&(p, _)| p);
            if found.is_ok() {
                let (lon, lat) = pix2ang_nest(finest, pixel);
                return level.lookup(ancestor, lon, lat);
            }
        }
        Ok(None)
    }

    /// Entry stored for exactly `pixel` at `nside`, ignoring other levels.
    pub fn entry_at(&self, nside: u32, pixel: u64) -> DustResult<Option<usize>> {
        match self.levels.iter().find(|l| l.nside == nside) {
            Some(level) => {
                let (lon, lat) = pix2ang_nest(nside, pixel);
                level.lookup(pixel, lon, lat)
            }
            None => Ok(None),
        }
    }
}
