//! Lazily built per-entry radial extinction profiles.

use dust_core::spline::{InterpolatingSpline, MAX_ORDER};
use dust_core::{DustError, DustResult};
use once_cell::sync::OnceCell;

/// Native extinction as a function of distance modulus along one sightline.
#[derive(Debug, Clone)]
pub struct RadialProfile {
    spline: InterpolatingSpline,
}

impl RadialProfile {
    pub fn build(distmods: &[f64], extinction: &[f64], order: usize) -> DustResult<Self> {
        Ok(Self {
            spline: InterpolatingSpline::new(distmods, extinction, order)?,
        })
    }

    /// Interpolated extinction at `distmod`; extrapolates past the grid.
    #[inline]
    pub fn evaluate(&self, distmod: f64) -> f64 {
        self.spline.evaluate(distmod)
    }
}

/// One insert-if-absent slot per catalog entry.
///
/// Concurrent readers may race to build the same slot; `OnceCell` keeps the
/// first value and every reader sees it. Clearing needs `&mut self`, so no
/// reader can observe a partially invalidated cache.
#[derive(Debug)]
pub struct RadialProfileCache {
    slots: Vec<OnceCell<RadialProfile>>,
    order: usize,
}

impl RadialProfileCache {
    /// # Errors
    /// [`DustError::InvalidInterpolationOrder`] if `order` is not in `1..=5`.
    pub fn new(n_entries: usize, order: usize) -> DustResult<Self> {
        if order == 0 || order > MAX_ORDER {
            return Err(DustError::InvalidInterpolationOrder { order });
        }
        Ok(Self {
            slots: (0..n_entries).map(|_| OnceCell::new()).collect(),
            order,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Cached profile for `entry`, fitting it from `row` on first use.
    pub fn get_or_build(
        &self,
        entry: usize,
        distmods: &[f64],
        row: &[f64],
    ) -> DustResult<&RadialProfile> {
        let slot = self.slots.get(entry).ok_or_else(|| {
            DustError::malformed(format!(
                "entry {} outside cache of {} slots",
                entry,
                self.slots.len()
            ))
        })?;
        slot.get_or_try_init(|| {
            tracing::trace!(entry, "building radial profile");
            RadialProfile::build(distmods, row, self.order)
        })
    }

    pub fn is_cached(&self, entry: usize) -> bool {
        self.slots.get(entry).is_some_and(|slot| slot.get().is_some())
    }

    /// Number of profiles built since construction or the last invalidation.
    pub fn cached_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().is_some()).count()
    }

    pub fn invalidate_all(&mut self) {
        for slot in &mut self.slots {
            slot.take();
        }
    }
}
