//! Registry of the published hierarchical-HEALPix dust surveys.
//!
//! | Variant | Survey | Distance grid | Samples |
//! |---------|--------|---------------|---------|
//! | [`Green15`](DatasetVariant::Green15) | Green et al. (2015) PS1 | 4–19, 31 bins | in file |
//! | [`Green17`](DatasetVariant::Green17) | Bayestar17 | 4–19, 31 bins | in file |
//! | [`Green19`](DatasetVariant::Green19) | Bayestar19 | 4–18.875, 120 bins | in file |
//! | [`Combined15`](DatasetVariant::Combined15) | Bovy et al. (2016) combination | 4–19, 31 bins | none |
//! | [`Combined19`](DatasetVariant::Combined19) | Combination built on Bayestar19 | 4–18.875, 120 bins | none |
//! | [`Decaps25`](DatasetVariant::Decaps25) | Zucker et al. (2025) DECaPS | stored bin edges | separate file |
//!
//! Datasets live under [`dust_dir`] as `<subdir>/<file_stem>.dmap`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use dust_core::{DustError, DustResult};
use serde::{Deserialize, Serialize};

/// Extension of the binary container files.
pub const CONTAINER_EXTENSION: &str = "dmap";

/// Environment variable overriding the dataset root.
pub const DUST_DIR_ENV: &str = "DUST_DIR";

/// Root directory holding the dataset subdirectories.
///
/// `$DUST_DIR` when set, `~/.mwdust` otherwise (relative `.mwdust` if no home
/// directory is known).
pub fn dust_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DUST_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"));
    match home {
        Some(home) => PathBuf::from(home).join(".mwdust"),
        None => PathBuf::from(".mwdust"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetVariant {
    Green15,
    Green17,
    Green19,
    Combined15,
    Combined19,
    Decaps25,
}

/// Distance-modulus abscissas of a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceGrid {
    /// `count` evenly spaced moduli from `start` to `stop` inclusive.
    Linspace { start: f64, stop: f64, count: usize },
    /// Bin edges stored in the container itself.
    Stored,
}

impl DistanceGrid {
    /// Materialised abscissas, `None` for [`DistanceGrid::Stored`].
    pub fn distmods(&self) -> Option<Vec<f64>> {
        match *self {
            DistanceGrid::Linspace { start, stop, count } => {
                if count < 2 {
                    return Some(vec![start; count]);
                }
                let step = (stop - start) / (count - 1) as f64;
                let mut grid: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
                grid[count - 1] = stop;
                Some(grid)
            }
            DistanceGrid::Stored => None,
        }
    }
}

/// Static description of one dataset variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetConfig {
    pub name: &'static str,
    pub subdir: &'static str,
    pub file_stem: &'static str,
    /// File carrying the posterior samples when they are not in `file_stem`.
    pub samples_file_stem: Option<&'static str>,
    pub has_samples: bool,
    pub source_url: Option<&'static str>,
    pub grid: DistanceGrid,
}

const GRID_31: DistanceGrid = DistanceGrid::Linspace {
    start: 4.0,
    stop: 19.0,
    count: 31,
};

const GRID_120: DistanceGrid = DistanceGrid::Linspace {
    start: 4.0,
    stop: 18.875,
    count: 120,
};

impl DatasetVariant {
    pub const ALL: [DatasetVariant; 6] = [
        DatasetVariant::Green15,
        DatasetVariant::Green17,
        DatasetVariant::Green19,
        DatasetVariant::Combined15,
        DatasetVariant::Combined19,
        DatasetVariant::Decaps25,
    ];

    pub fn config(&self) -> DatasetConfig {
        match self {
            DatasetVariant::Green15 => DatasetConfig {
                name: "green15",
                subdir: "green15",
                file_stem: "dust-map-3d",
                samples_file_stem: None,
                has_samples: true,
                source_url: Some(
                    "http://faun.rc.fas.harvard.edu/pan1/ggreen/argonaut/data/dust-map-3d.h5",
                ),
                grid: GRID_31,
            },
            DatasetVariant::Green17 => DatasetConfig {
                name: "green17",
                subdir: "green17",
                file_stem: "bayestar2017",
                samples_file_stem: None,
                has_samples: true,
                source_url: Some("https://dataverse.harvard.edu/api/access/datafile/:persistentId?persistentId=doi:10.7910/DVN/LCYHJG/S7MP4P"),
                grid: GRID_31,
            },
            DatasetVariant::Green19 => DatasetConfig {
                name: "green19",
                subdir: "green19",
                file_stem: "bayestar2019",
                samples_file_stem: None,
                has_samples: true,
                source_url: None,
                grid: GRID_120,
            },
            DatasetVariant::Combined15 => DatasetConfig {
                name: "combined15",
                subdir: "combined15",
                file_stem: "dust-map-3d",
                samples_file_stem: None,
                has_samples: false,
                source_url: Some("https://zenodo.org/record/31262/files/dust-map-3d.h5"),
                grid: GRID_31,
            },
            DatasetVariant::Combined19 => DatasetConfig {
                name: "combined19",
                subdir: "combined19",
                file_stem: "combine19",
                samples_file_stem: None,
                has_samples: false,
                source_url: None,
                grid: GRID_120,
            },
            DatasetVariant::Decaps25 => DatasetConfig {
                name: "decaps25",
                subdir: "decaps25",
                file_stem: "decaps_mean",
                samples_file_stem: Some("decaps_mean_and_samples"),
                has_samples: true,
                source_url: Some("https://dataverse.harvard.edu/api/access/datafile/11838924"),
                grid: DistanceGrid::Stored,
            },
        }
    }

    /// Container path under `root`, picking the samples file when needed.
    pub fn path_in(&self, root: &Path, with_samples: bool) -> PathBuf {
        let config = self.config();
        let stem = match (with_samples, config.samples_file_stem) {
            (true, Some(samples_stem)) => samples_stem,
            _ => config.file_stem,
        };
        root.join(config.subdir)
            .join(format!("{}.{}", stem, CONTAINER_EXTENSION))
    }

    /// Container path under [`dust_dir`].
    pub fn default_path(&self, with_samples: bool) -> PathBuf {
        self.path_in(&dust_dir(), with_samples)
    }
}

impl fmt::Display for DatasetVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.config().name)
    }
}

impl FromStr for DatasetVariant {
    type Err = DustError;

    fn from_str(s: &str) -> DustResult<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        DatasetVariant::ALL
            .into_iter()
            .find(|v| v.config().name == wanted)
            .ok_or_else(|| DustError::unknown_dataset(s))
    }
}
