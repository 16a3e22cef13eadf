//! Shared building blocks for 3-D Galactic dust-extinction maps.
//!
//! `dust-core` holds everything that does not depend on a particular sky
//! pixelisation: the error taxonomy, distance-modulus conversions, the
//! interpolating spline used for radial extinction profiles, and the
//! extinction-curve table that converts E(B-V) into band extinctions.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`errors`] | [`DustError`] and [`DustResult`] |
//! | [`math`] | Distance modulus, longitude wrapping, angular separation |
//! | [`spline`] | [`InterpolatingSpline`] (orders 1–5, FITPACK knot placement) |
//! | [`extinction`] | [`FilterScaler`] and [`Calibration`] |
//! | [`constants`] | Angle conversions, sphere solid angle, HEALPix limits |
//!
//! # Re-exports
//!
//! ```
//! use dust_core::{Calibration, DustError, DustResult, FilterScaler, InterpolatingSpline};
//! ```

pub mod constants;
pub mod errors;
pub mod extinction;
pub mod math;
pub mod spline;

pub use errors::{DustError, DustResult};
pub use extinction::{Calibration, FilterScaler};
pub use spline::InterpolatingSpline;
