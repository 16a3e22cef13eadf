//! In-memory datasets and their on-disk container.
//!
//! A [`HealpixDataset`] bundles everything a hierarchical map needs: the
//! [`PixelCatalog`], the distance-modulus abscissas, the best-fit extinction
//! matrix `[n_entries × n_bins]` and, optionally, posterior samples
//! `[n_entries × n_samples × n_bins]`. All matrices are row-major `f64`.

pub mod container;
pub mod variant;

use std::path::Path;

use dust_core::{DustError, DustResult};
use serde::{Deserialize, Serialize};

use crate::pixel::PixelCatalog;

pub use container::ContainerHeader;
pub use variant::{dust_dir, DatasetConfig, DatasetVariant, DistanceGrid};

/// Load-time options for [`HealpixDataset::open`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetOptions {
    /// Copy the posterior samples into memory. Opening fails with
    /// [`DustError::SamplesUnavailable`] if the container has none.
    pub load_samples: bool,
    /// Abscissas to use instead of (or when the container lacks) stored ones.
    pub distmods: Option<Vec<f64>>,
}

#[derive(Debug, Clone)]
struct Samples {
    count: usize,
    values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct HealpixDataset {
    catalog: PixelCatalog,
    distmods: Vec<f64>,
    best_fit: Vec<f64>,
    samples: Option<Samples>,
}

impl HealpixDataset {
    /// Assembles a dataset after checking every shape against the catalog.
    ///
    /// `samples` is `(n_samples, values)` with `values` laid out as
    /// `[entry][sample][bin]`.
    ///
    /// # Errors
    /// [`DustError::MalformedDataset`] if the abscissas are fewer than two,
    /// non-finite or not strictly increasing, or if a matrix size disagrees
    /// with `n_entries × [n_samples ×] n_bins`.
    pub fn from_parts(
        catalog: PixelCatalog,
        distmods: Vec<f64>,
        best_fit: Vec<f64>,
        samples: Option<(usize, Vec<f64>)>,
    ) -> DustResult<Self> {
        validate_distmods(&distmods)?;
        let n_entries = catalog.len();
        let n_bins = distmods.len();

        if best_fit.len() != n_entries * n_bins {
            return Err(DustError::malformed(format!(
                "best-fit matrix has {} values, expected {} entries × {} bins",
                best_fit.len(),
                n_entries,
                n_bins
            )));
        }

        let samples = match samples {
            Some((count, values)) => {
                if count == 0 {
                    return Err(DustError::malformed("sample tensor has zero samples"));
                }
                if values.len() != n_entries * count * n_bins {
                    return Err(DustError::malformed(format!(
                        "sample tensor has {} values, expected {} entries × {} samples × {} bins",
                        values.len(),
                        n_entries,
                        count,
                        n_bins
                    )));
                }
                Some(Samples { count, values })
            }
            None => None,
        };

        Ok(Self {
            catalog,
            distmods,
            best_fit,
            samples,
        })
    }

    /// Reads a `.dmap` container. See [`container`] for the layout.
    pub fn open(path: impl AsRef<Path>, options: &DatasetOptions) -> DustResult<Self> {
        container::read(path.as_ref(), options)
    }

    /// Writes the dataset as a `.dmap` container, samples included.
    pub fn save(&self, path: impl AsRef<Path>) -> DustResult<()> {
        container::write(self, path.as_ref())
    }

    pub fn catalog(&self) -> &PixelCatalog {
        &self.catalog
    }

    pub fn distmods(&self) -> &[f64] {
        &self.distmods
    }

    pub fn n_entries(&self) -> usize {
        self.catalog.len()
    }

    pub fn n_bins(&self) -> usize {
        self.distmods.len()
    }

    /// Number of loaded posterior samples, 0 if none.
    pub fn n_samples(&self) -> usize {
        self.samples.as_ref().map_or(0, |s| s.count)
    }

    pub fn has_samples(&self) -> bool {
        self.samples.is_some()
    }

    pub fn best_fit(&self) -> &[f64] {
        &self.best_fit
    }

    /// Current extinction row of `entry` (best fit or substituted sample).
    pub fn row(&self, entry: usize) -> &[f64] {
        let n_bins = self.n_bins();
        &self.best_fit[entry * n_bins..(entry + 1) * n_bins]
    }

    /// Row of sample `sample` for `entry`, if samples are loaded.
    pub fn sample_row(&self, entry: usize, sample: usize) -> Option<&[f64]> {
        let samples = self.samples.as_ref()?;
        if sample >= samples.count || entry >= self.n_entries() {
            return None;
        }
        let n_bins = self.n_bins();
        let start = (entry * samples.count + sample) * n_bins;
        Some(&samples.values[start..start + n_bins])
    }

    pub(crate) fn samples_raw(&self) -> Option<(usize, &[f64])> {
        self.samples.as_ref().map(|s| (s.count, s.values.as_slice()))
    }

    /// Overwrites the working matrix with sample `sample` of every entry.
    ///
    /// Checks happen before any write, so a failed call leaves the matrix
    /// unchanged.
    pub(crate) fn substitute_sample(&mut self, sample: usize) -> DustResult<()> {
        let samples = self.samples.as_ref().ok_or(DustError::SamplesUnavailable)?;
        if sample >= samples.count {
            return Err(DustError::SampleIndexOutOfRange {
                index: sample,
                available: samples.count,
            });
        }
        let n_bins = self.distmods.len();
        for (entry, row) in self.best_fit.chunks_exact_mut(n_bins).enumerate() {
            let start = (entry * samples.count + sample) * n_bins;
            row.copy_from_slice(&samples.values[start..start + n_bins]);
        }
        Ok(())
    }
}

fn validate_distmods(distmods: &[f64]) -> DustResult<()> {
    if distmods.len() < 2 {
        return Err(DustError::malformed(format!(
            "need at least 2 distance moduli, got {}",
            distmods.len()
        )));
    }
    if distmods.iter().any(|d| !d.is_finite()) {
        return Err(DustError::malformed("distance moduli must be finite"));
    }
    if distmods.windows(2).any(|w| w[1] <= w[0]) {
        return Err(DustError::malformed(
            "distance moduli must be strictly increasing",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::PixelInfo;

    fn catalog(n: u64) -> PixelCatalog {
        PixelCatalog::new((0..n).map(|p| PixelInfo::new(p, 1)).collect()).unwrap()
    }

    #[test]
    fn test_from_parts_checks_best_fit_shape() {
        let err = HealpixDataset::from_parts(catalog(2), vec![4.0, 10.0], vec![0.0; 3], None)
            .unwrap_err();
        assert!(err.to_string().contains("best-fit matrix has 3 values"));
    }

    #[test]
    fn test_from_parts_checks_sample_shape() {
        let err = HealpixDataset::from_parts(
            catalog(2),
            vec![4.0, 10.0],
            vec![0.0; 4],
            Some((3, vec![0.0; 10])),
        )
        .unwrap_err();
        assert!(err.is_integrity_error());
        assert!(HealpixDataset::from_parts(
            catalog(2),
            vec![4.0, 10.0],
            vec![0.0; 4],
            Some((0, Vec::new()))
        )
        .is_err());
    }

    #[test]
    fn test_from_parts_checks_distmods() {
        for bad in [vec![4.0], vec![4.0, 4.0], vec![4.0, f64::NAN], vec![10.0, 4.0]] {
            let n = bad.len();
            assert!(HealpixDataset::from_parts(catalog(1), bad, vec![0.0; n], None).is_err());
        }
    }

    #[test]
    fn test_substitute_sample_copies_rows() {
        // entry e, sample s, bin b holds 100e + 10s + b
        let values: Vec<f64> = (0..2)
            .flat_map(|e| (0..3).flat_map(move |s| (0..2).map(move |b| (100 * e + 10 * s + b) as f64)))
            .collect();
        let mut dataset = HealpixDataset::from_parts(
            catalog(2),
            vec![4.0, 10.0],
            vec![0.0; 4],
            Some((3, values)),
        )
        .unwrap();
        assert_eq!(dataset.n_samples(), 3);
        assert_eq!(dataset.sample_row(1, 2).unwrap(), &[120.0, 121.0]);

        dataset.substitute_sample(2).unwrap();
        assert_eq!(dataset.row(0), &[20.0, 21.0]);
        assert_eq!(dataset.row(1), &[120.0, 121.0]);
    }

    #[test]
    fn test_substitute_sample_errors_leave_rows() {
        let mut dataset =
            HealpixDataset::from_parts(catalog(1), vec![4.0, 10.0], vec![1.0, 2.0], None).unwrap();
        assert!(matches!(
            dataset.substitute_sample(0),
            Err(DustError::SamplesUnavailable)
        ));

        let mut dataset = HealpixDataset::from_parts(
            catalog(1),
            vec![4.0, 10.0],
            vec![1.0, 2.0],
            Some((2, vec![5.0; 4])),
        )
        .unwrap();
        assert!(matches!(
            dataset.substitute_sample(2),
            Err(DustError::SampleIndexOutOfRange {
                index: 2,
                available: 2
            })
        ));
        assert_eq!(dataset.row(0), &[1.0, 2.0]);
    }
}
