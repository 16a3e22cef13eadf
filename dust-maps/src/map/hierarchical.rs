//! Mixed-resolution HEALPix extinction map.
//!
//! A query `(l, b, d)` flows through three stages:
//!
//! 1. [`SpatialIndex`] resolves `(l, b)` to a catalog entry, finest level first.
//! 2. [`RadialProfileCache`] returns (building on first use) the entry's
//!    interpolant over distance modulus.
//! 3. The interpolant is evaluated at `5 log10(d) + 10` and scaled by the
//!    configured filter factor.
//!
//! # Samples
//!
//! Maps opened with `load_samples` can switch from the best fit to any
//! posterior sample with [`HealpixExtinctionMap::use_sample`]. The switch
//! needs `&mut self`, which guarantees no reader holds a profile built from
//! the previous matrix.

use std::path::Path;

use dust_core::math::distance_modulus;
use dust_core::{DustError, DustResult};
use rayon::prelude::*;

use super::disk::entries_in_disc;
use super::profile::RadialProfileCache;
use super::raster::nearest_bin;
use super::{broadcast_get, broadcast_len, DiskQuery, DustMap3D, MapConfig, SkyRaster};
use crate::dataset::{DatasetOptions, DatasetVariant, HealpixDataset};
use crate::pixel::healpix::npix;
use crate::pixel::{PixelCatalog, SpatialIndex};

/// Which extinction matrix the map currently serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    UsingBestFit,
    UsingSample(usize),
}

#[derive(Debug)]
pub struct HealpixExtinctionMap {
    dataset: HealpixDataset,
    index: SpatialIndex,
    cache: RadialProfileCache,
    filter: Option<String>,
    scale: f64,
    state: MapState,
}

impl HealpixExtinctionMap {
    /// Wraps a loaded dataset.
    ///
    /// # Errors
    /// - [`DustError::UnknownFilter`] if `config.filter` is not tabulated.
    /// - [`DustError::InvalidInterpolationOrder`] if `config.interp_order` is
    ///   outside `1..=5`.
    /// - [`DustError::MalformedDataset`] if the grid is too short for the order.
    pub fn new(dataset: HealpixDataset, config: &MapConfig) -> DustResult<Self> {
        let scale = config.scale_factor()?;
        let cache = RadialProfileCache::new(dataset.n_entries(), config.interp_order)?;
        if dataset.n_bins() <= config.interp_order {
            return Err(DustError::malformed(format!(
                "{} distance bins cannot support order {} interpolation",
                dataset.n_bins(),
                config.interp_order
            )));
        }
        let index = SpatialIndex::build(dataset.catalog());

        tracing::info!(
            entries = dataset.n_entries(),
            bins = dataset.n_bins(),
            ladder = ?index.ladder(),
            filter = config.filter.as_deref().unwrap_or("native"),
            order = config.interp_order,
            "extinction map ready"
        );

        Ok(Self {
            dataset,
            index,
            cache,
            filter: config.filter.clone(),
            scale,
            state: MapState::UsingBestFit,
        })
    }

    /// Opens a published variant from its default location under
    /// [`dust_dir`](crate::dataset::dust_dir).
    pub fn open(variant: DatasetVariant, config: &MapConfig) -> DustResult<Self> {
        let path = variant.default_path(config.load_samples);
        Self::open_variant_at(variant, &path, config)
    }

    /// Opens a variant stored under `root` instead of the default directory.
    pub fn open_in(variant: DatasetVariant, root: &Path, config: &MapConfig) -> DustResult<Self> {
        let path = variant.path_in(root, config.load_samples);
        Self::open_variant_at(variant, &path, config)
    }

    fn open_variant_at(variant: DatasetVariant, path: &Path, config: &MapConfig) -> DustResult<Self> {
        let settings = variant.config();
        if config.load_samples && !settings.has_samples {
            return Err(DustError::SamplesUnavailable);
        }
        tracing::debug!(variant = %variant, path = %path.display(), "opening dataset variant");
        Self::open_path(path, config, settings.grid.distmods())
    }

    /// Opens any container, optionally overriding its distance moduli.
    pub fn open_path(
        path: impl AsRef<Path>,
        config: &MapConfig,
        distmods: Option<Vec<f64>>,
    ) -> DustResult<Self> {
        let options = DatasetOptions {
            load_samples: config.load_samples,
            distmods,
        };
        let dataset = HealpixDataset::open(path, &options)?;
        Self::new(dataset, config)
    }

    pub fn dataset(&self) -> &HealpixDataset {
        &self.dataset
    }

    pub fn catalog(&self) -> &PixelCatalog {
        self.dataset.catalog()
    }

    pub fn distmods(&self) -> &[f64] {
        self.dataset.distmods()
    }

    pub fn state(&self) -> MapState {
        self.state
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// `A_filter / E(B-V)`, or 1 in native units.
    pub fn scale_factor(&self) -> f64 {
        self.scale
    }

    pub fn cached_profiles(&self) -> usize {
        self.cache.cached_count()
    }

    /// Catalog entry containing `(lon, lat)`.
    pub fn resolve_index(&self, lon: f64, lat: f64) -> DustResult<usize> {
        self.index.resolve(lon, lat)
    }

    fn evaluate_entry(&self, entry: usize, distmod: f64) -> DustResult<f64> {
        let profile = self
            .cache
            .get_or_build(entry, self.dataset.distmods(), self.dataset.row(entry))?;
        Ok(profile.evaluate(distmod) * self.scale)
    }

    pub fn evaluate(&self, lon: f64, lat: f64, distance_kpc: f64) -> DustResult<f64> {
        let entry = self.index.resolve(lon, lat)?;
        self.evaluate_entry(entry, distance_modulus(distance_kpc))
    }

    /// Resolves the sightline once and evaluates every distance on it.
    pub fn evaluate_along(&self, lon: f64, lat: f64, distances_kpc: &[f64]) -> DustResult<Vec<f64>> {
        let entry = self.index.resolve(lon, lat)?;
        distances_kpc
            .iter()
            .map(|&d| self.evaluate_entry(entry, distance_modulus(d)))
            .collect()
    }

    /// Broadcast evaluation; misses become NaN.
    ///
    /// # Errors
    /// [`DustError::ShapeMismatch`] when a length is neither 1 nor N, and any
    /// integrity error raised while resolving or building profiles.
    pub fn evaluate_batch(
        &self,
        lons: &[f64],
        lats: &[f64],
        distances_kpc: &[f64],
    ) -> DustResult<Vec<f64>> {
        let n = broadcast_len(
            "evaluate_batch",
            &[lons.len(), lats.len(), distances_kpc.len()],
        )?;

        let entries = if lons.len() == 1 && lats.len() == 1 {
            vec![self.index.try_resolve(lons[0], lats[0])?; n]
        } else {
            let lons: Vec<f64> = (0..n).map(|i| broadcast_get(lons, i)).collect();
            let lats: Vec<f64> = (0..n).map(|i| broadcast_get(lats, i)).collect();
            self.index.resolve_many(&lons, &lats)?
        };

        entries
            .par_iter()
            .enumerate()
            .map(|(i, entry)| match *entry {
                Some(entry) => {
                    self.evaluate_entry(entry, distance_modulus(broadcast_get(distances_kpc, i)))
                }
                None => Ok(f64::NAN),
            })
            .collect()
    }

    /// Switches every sightline to posterior sample `sample`.
    ///
    /// # Errors
    /// [`DustError::SamplesUnavailable`] when the map was opened without
    /// samples and [`DustError::SampleIndexOutOfRange`] for an index past the
    /// sample axis. The map is unchanged on error.
    pub fn use_sample(&mut self, sample: usize) -> DustResult<()> {
        self.dataset.substitute_sample(sample)?;
        self.cache.invalidate_all();
        self.state = MapState::UsingSample(sample);
        tracing::info!(sample, "switched extinction map to posterior sample");
        Ok(())
    }

    /// Extinction of every pixel, at every resolution level, whose centre
    /// lies within `radius_deg` of `(lon, lat)`.
    pub fn query_disk(
        &self,
        lon: f64,
        lat: f64,
        distance_kpc: f64,
        radius_deg: f64,
    ) -> DustResult<DiskQuery> {
        let distmod = distance_modulus(distance_kpc);
        let mut result = DiskQuery::default();
        for (entry, area) in entries_in_disc(&self.index, lon, lat, radius_deg)? {
            result.pixel_area.push(area);
            result.extinction.push(self.evaluate_entry(entry, distmod)?);
        }
        Ok(result)
    }

    /// Full-sky nested raster at the finest nside, sampled at the distance
    /// bin nearest `distance_kpc` without interpolation.
    pub fn rasterize(&self, distance_kpc: f64) -> DustResult<SkyRaster> {
        let distmods = self.dataset.distmods();
        let bin = nearest_bin(distmods, distance_modulus(distance_kpc));
        let n_bins = self.dataset.n_bins();
        let best_fit = self.dataset.best_fit();
        let nside = self.index.finest_nside();

        let values = (0..npix(nside))
            .into_par_iter()
            .map(|pixel| {
                Ok(match self.index.resolve_finest_pixel(pixel)? {
                    Some(entry) => best_fit[entry * n_bins + bin] * self.scale,
                    None => f64::NAN,
                })
            })
            .collect::<DustResult<Vec<f64>>>()?;

        tracing::debug!(nside, bin, distmod = distmods[bin], "rasterized map");
        Ok(SkyRaster {
            nside,
            distmod: distmods[bin],
            values,
        })
    }
}

impl DustMap3D for HealpixExtinctionMap {
    fn evaluate(&self, lon: f64, lat: f64, distance_kpc: f64) -> DustResult<f64> {
        HealpixExtinctionMap::evaluate(self, lon, lat, distance_kpc)
    }

    fn evaluate_along(&self, lon: f64, lat: f64, distances_kpc: &[f64]) -> DustResult<Vec<f64>> {
        HealpixExtinctionMap::evaluate_along(self, lon, lat, distances_kpc)
    }

    fn evaluate_batch(
        &self,
        lons: &[f64],
        lats: &[f64],
        distances_kpc: &[f64],
    ) -> DustResult<Vec<f64>> {
        HealpixExtinctionMap::evaluate_batch(self, lons, lats, distances_kpc)
    }

    fn query_disk(
        &self,
        lon: f64,
        lat: f64,
        distance_kpc: f64,
        radius_deg: f64,
    ) -> DustResult<DiskQuery> {
        HealpixExtinctionMap::query_disk(self, lon, lat, distance_kpc, radius_deg)
    }

    fn substitute_sample(&mut self, sample: usize) -> DustResult<()> {
        self.use_sample(sample)
    }
}
