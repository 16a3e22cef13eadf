//! Sky pixelisation: HEALPix geometry, the per-entry catalog and the
//! multi-resolution lookup built on it.

pub mod healpix;

mod catalog;
mod index;

pub use catalog::{PixelCatalog, PixelInfo};
pub use index::SpatialIndex;
