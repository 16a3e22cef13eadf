//! Hierarchical HEALPix 3-D dust-extinction maps.
//!
//! Precomputed surveys such as Bayestar and DECaPS store extinction on a
//! mixed-resolution nested HEALPix grid, one radial profile per pixel. This
//! crate resolves a Galactic sightline to its pixel, interpolates the profile
//! in distance modulus, and scales the result into a photometric filter.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`pixel`] | HEALPix nested geometry, [`PixelCatalog`], [`SpatialIndex`] |
//! | [`dataset`] | [`HealpixDataset`], the `.dmap` container, [`DatasetVariant`] registry |
//! | [`map`] | [`HealpixExtinctionMap`], [`ZeroMap`], [`DustMap3D`], [`MapConfig`] |
//!
//! # Example
//!
//! ```
//! use dust_maps::{HealpixDataset, HealpixExtinctionMap, MapConfig, PixelCatalog, PixelInfo};
//!
//! // Twelve base pixels, each with extinction 0, 0.5, 1 at distance moduli 4, 10, 16
//! let catalog = PixelCatalog::new((0..12).map(|p| PixelInfo::new(p, 1)).collect())?;
//! let dataset = HealpixDataset::from_parts(catalog, vec![4.0, 10.0, 16.0], [0.0, 0.5, 1.0].repeat(12), None)?;
//! let map = HealpixExtinctionMap::new(dataset, &MapConfig::default().with_filter("SDSS g"))?;
//!
//! let a_g = map.evaluate(30.0, 5.0, 1.0)?;
//! assert!((a_g - 0.5 * 3.303).abs() < 1e-9);
//! # Ok::<(), dust_core::DustError>(())
//! ```

pub mod dataset;
pub mod map;
pub mod pixel;

#[cfg(test)]
pub(crate) mod testing;

pub use dataset::{DatasetOptions, DatasetVariant, HealpixDataset};
pub use map::{
    DiskQuery, DustMap3D, HealpixExtinctionMap, MapConfig, MapState, SkyRaster, ZeroMap,
};
pub use pixel::{PixelCatalog, PixelInfo, SpatialIndex};

pub use dust_core::{Calibration, DustError, DustResult, FilterScaler};
