#[allow(clippy::excessive_precision)]
#[allow(clippy::approx_constant)]
pub const PI: f64 = 3.141592653589793238462643;

#[allow(clippy::excessive_precision)]
#[allow(clippy::approx_constant)]
pub const HALF_PI: f64 = 1.5707963267948966192313216;

#[allow(clippy::excessive_precision)]
#[allow(clippy::approx_constant)]
pub const TWOPI: f64 = 6.283185307179586476925287;

#[allow(clippy::excessive_precision)]
pub const DEG_TO_RAD: f64 = 1.745329251994329576923691e-2;

#[allow(clippy::excessive_precision)]
pub const RAD_TO_DEG: f64 = 57.29577951308232087679815;

/// Solid angle of the full sphere in steradians.
pub const FULL_SKY_SR: f64 = 4.0 * PI;

/// Distance modulus of an object at 1 kpc: `5 log10(1000 pc / 10 pc)`.
pub const DISTMOD_AT_1_KPC: f64 = 10.0;

/// Largest HEALPix nside representable in the nested scheme with 64-bit indices.
pub const MAX_NSIDE: u32 = 1 << 29;
