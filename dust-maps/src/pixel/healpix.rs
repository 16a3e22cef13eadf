//! HEALPix nested-scheme pixelisation on Galactic coordinates.
//!
//! Longitudes and latitudes are in degrees. Pixel indices follow the nested
//! ordering of Górski et al. (2005), so the parent of pixel `p` one order
//! coarser is `p >> 2`.

use dust_core::constants::{DEG_TO_RAD, FULL_SKY_SR, HALF_PI, MAX_NSIDE, RAD_TO_DEG};
use dust_core::math::{vincenty_angular_separation, wrap_degrees};

/// Ring index of the southernmost corner of each base face, in units of nside.
const JRLL: [i64; 12] = [2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];
/// Longitude index of each base face centre, in units of nside / 2.
const JPLL: [i64; 12] = [1, 3, 5, 7, 0, 2, 4, 6, 1, 3, 5, 7];

/// Bound on centre-to-vertex distance, in units of the mean pixel size.
const PIXEL_RADIUS_FACTOR: f64 = 2.0;

/// `true` if `nside` is a power of two no larger than [`MAX_NSIDE`].
pub fn is_valid_nside(nside: u32) -> bool {
    nside.is_power_of_two() && nside <= MAX_NSIDE
}

/// HEALPix order (`nside = 2^order`).
#[inline]
pub fn nside_to_order(nside: u32) -> u32 {
    nside.trailing_zeros()
}

/// Number of pixels on the sphere, `12 · nside²`.
#[inline]
pub fn npix(nside: u32) -> u64 {
    12 * nside as u64 * nside as u64
}

/// Solid angle of one pixel in steradians, `π / (3 · nside²)`.
#[inline]
pub fn pixel_area(nside: u32) -> f64 {
    FULL_SKY_SR / npix(nside) as f64
}

/// Mean pixel size in degrees.
#[inline]
pub fn pixel_size_deg(nside: u32) -> f64 {
    libm::sqrt(pixel_area(nside)) * RAD_TO_DEG
}

/// Nested index of the ancestor of `pixel` (at `fine_nside`) at `coarse_nside`.
#[inline]
pub fn degrade_pixel(pixel: u64, fine_nside: u32, coarse_nside: u32) -> u64 {
    let shift = 2 * (nside_to_order(fine_nside) - nside_to_order(coarse_nside));
    pixel >> shift
}

/// Converts Galactic `(l, b)` in degrees to a nested pixel index.
///
/// Longitude is wrapped into `[0, 360)`. `nside` must be a power of two.
pub fn ang2pix_nest(nside: u32, lon_deg: f64, lat_deg: f64) -> u64 {
    let order = nside_to_order(nside);
    let phi = wrap_degrees(lon_deg) * DEG_TO_RAD;
    let z = libm::sin(lat_deg * DEG_TO_RAD);
    let n = nside as i64;
    let (face, ix, iy) = compute_face_and_position(phi, z, n, order);
    face as u64 * (n * n) as u64 + xy2pix_nest(ix as u64, iy as u64, order)
}

/// Centre of a nested pixel as `(l, b)` in degrees.
pub fn pix2ang_nest(nside: u32, pixel: u64) -> (f64, f64) {
    let order = nside_to_order(nside);
    let n = nside as i64;
    let npface = (n * n) as u64;
    let face = (pixel >> (2 * order)) as usize;
    let (ix, iy) = pix2xy_nest(pixel & (npface - 1), order);
    let (ix, iy) = (ix as i64, iy as i64);

    let jr = JRLL[face] * n - ix - iy - 1;
    let nf = n as f64;
    let (nr, z, kshift) = if jr < n {
        let nr = jr as f64;
        (jr, 1.0 - nr * nr / (3.0 * nf * nf), 0)
    } else if jr > 3 * n {
        let nr = (4 * n - jr) as f64;
        (4 * n - jr, nr * nr / (3.0 * nf * nf) - 1.0, 0)
    } else {
        (n, (2 * n - jr) as f64 * 2.0 / (3.0 * nf), (jr - n) & 1)
    };

    let nl4 = 4 * n;
    let mut jp = (JPLL[face] * nr + ix - iy + 1 + kshift) / 2;
    if jp > nl4 {
        jp -= nl4;
    }
    if jp < 1 {
        jp += nl4;
    }

    let phi = (jp as f64 - (kshift + 1) as f64 * 0.5) * (HALF_PI / nr as f64);
    (phi * RAD_TO_DEG, libm::asin(z.clamp(-1.0, 1.0)) * RAD_TO_DEG)
}

/// Conservative set of nested pixels at `nside` that may overlap a disc.
///
/// Descends the nested hierarchy from the 12 base faces, pruning any pixel
/// whose bounding cap cannot reach the disc. Every pixel whose centre lies
/// inside the disc is returned; some returned pixels may lie just outside.
/// The result is sorted.
pub fn query_disc_nest(nside: u32, lon_deg: f64, lat_deg: f64, radius_deg: f64) -> Vec<u64> {
    let target_order = nside_to_order(nside);
    let mut candidates: Vec<u64> = (0..12).collect();

    for order in 0..=target_order {
        let level_nside = 1u32 << order;
        let reach = radius_deg + PIXEL_RADIUS_FACTOR * pixel_size_deg(level_nside);
        candidates.retain(|&pixel| {
            let (lon, lat) = pix2ang_nest(level_nside, pixel);
            angular_separation_deg(lon_deg, lat_deg, lon, lat) <= reach
        });
        if order < target_order {
            candidates = candidates
                .iter()
                .flat_map(|&pixel| (0..4).map(move |child| 4 * pixel + child))
                .collect();
        }
    }

    candidates.sort_unstable();
    candidates
}

/// Great-circle distance between two points, in degrees.
pub fn angular_separation_deg(lon1_deg: f64, lat1_deg: f64, lon2_deg: f64, lat2_deg: f64) -> f64 {
    let (sin_lat1, cos_lat1) = libm::sincos(lat1_deg * DEG_TO_RAD);
    let (sin_lat2, cos_lat2) = libm::sincos(lat2_deg * DEG_TO_RAD);
    let delta_lon = (lon2_deg - lon1_deg) * DEG_TO_RAD;
    vincenty_angular_separation(sin_lat1, cos_lat1, sin_lat2, cos_lat2, delta_lon) * RAD_TO_DEG
}

/// Base face and `(ix, iy)` position within it.
fn compute_face_and_position(phi: f64, z: f64, nside: i64, order: u32) -> (i64, i64, i64) {
    let z_abs = libm::fabs(z);
    let tt = phi_to_tt(phi);
    if z_abs <= 2.0 / 3.0 {
        compute_equatorial_face(tt, z, nside, order)
    } else {
        compute_polar_face(tt, z, z_abs, nside)
    }
}

/// Longitude in quadrant units, `[0, 4)`.
fn phi_to_tt(phi: f64) -> f64 {
    let tt = phi / HALF_PI;
    if tt >= 4.0 {
        tt - 4.0
    } else {
        tt
    }
}

fn compute_equatorial_face(tt: f64, z: f64, nside: i64, order: u32) -> (i64, i64, i64) {
    let temp1 = nside as f64 * (0.5 + tt);
    let temp2 = nside as f64 * z * 0.75;
    let jp = (temp1 - temp2) as i64;
    let jm = (temp1 + temp2) as i64;
    let ifp = jp >> order;
    let ifm = jm >> order;
    let face = if ifp == ifm {
        ifp | 4
    } else if ifp < ifm {
        ifp
    } else {
        ifm + 8
    };
    let ix = jm & (nside - 1);
    let iy = nside - (jp & (nside - 1)) - 1;
    (face, ix, iy)
}

fn compute_polar_face(tt: f64, z: f64, z_abs: f64, nside: i64) -> (i64, i64, i64) {
    let ntt = (tt as i64).min(3);
    let tp = tt - ntt as f64;
    let tmp = nside as f64 * libm::sqrt(3.0 * (1.0 - z_abs));
    let jp = ((tp * tmp) as i64).min(nside - 1);
    let jm = (((1.0 - tp) * tmp) as i64).min(nside - 1);
    if z >= 0.0 {
        (ntt, nside - jm - 1, nside - jp - 1)
    } else {
        (ntt + 8, jp, jm)
    }
}

/// Interleaves `(ix, iy)` bits into a Z-order index within a base face.
fn xy2pix_nest(ix: u64, iy: u64, order: u32) -> u64 {
    let mut result: u64 = 0;
    for i in 0..order {
        let bit_x = (ix >> i) & 1;
        let bit_y = (iy >> i) & 1;
        result |= (bit_x << (2 * i)) | (bit_y << (2 * i + 1));
    }
    result
}

fn pix2xy_nest(ipf: u64, order: u32) -> (u64, u64) {
    let mut ix: u64 = 0;
    let mut iy: u64 = 0;
    for i in 0..order {
        ix |= ((ipf >> (2 * i)) & 1) << i;
        iy |= ((ipf >> (2 * i + 1)) & 1) << i;
    }
    (ix, iy)
}
