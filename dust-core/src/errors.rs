//! Error types for dust-map construction and queries.
//!
//! This module provides a unified error type [`DustError`] covering the failure
//! modes of a 3-D extinction map: sightlines outside the survey footprint,
//! corrupt pixel catalogs, unsupported filters, missing posterior samples,
//! malformed datasets, and I/O failures.
//!
//! # Error Categories
//!
//! | Variant | Use Case | Integrity? | Recoverable? |
//! |---------|----------|------------|--------------|
//! | [`OutOfFootprint`](DustError::OutOfFootprint) | Scalar query outside the map | No | No |
//! | [`AmbiguousMatch`](DustError::AmbiguousMatch) | Duplicate pixel in one resolution level | Yes | No |
//! | [`UnknownFilter`](DustError::UnknownFilter) | Filter missing from the extinction table | No | No |
//! | [`UnknownDataset`](DustError::UnknownDataset) | Dataset variant name not in the registry | No | No |
//! | [`SamplesUnavailable`](DustError::SamplesUnavailable) | Sample substitution without samples | No | No |
//! | [`SampleIndexOutOfRange`](DustError::SampleIndexOutOfRange) | Sample index past the sample axis | No | No |
//! | [`MalformedDataset`](DustError::MalformedDataset) | Shapes or metadata violate invariants | Yes | No |
//! | [`InvalidInterpolationOrder`](DustError::InvalidInterpolationOrder) | Spline order outside 1..=5 | No | No |
//! | [`ShapeMismatch`](DustError::ShapeMismatch) | Batch inputs cannot be broadcast | No | No |
//! | [`DataError`](DustError::DataError) | File I/O | No | Yes |
//!
//! Integrity errors signal a corrupt dataset. They are never worked around
//! locally: a silently "repaired" lookup would produce wrong extinctions.
//!
//! # Usage
//!
//! ```
//! use dust_core::{DustError, DustResult};
//!
//! fn check_bins(abscissas: usize, columns: usize) -> DustResult<()> {
//!     if abscissas != columns {
//!         return Err(DustError::malformed(format!(
//!             "{} distance moduli but {} best-fit columns",
//!             abscissas, columns
//!         )));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_bins(31, 31).is_ok());
//! assert!(check_bins(31, 120).unwrap_err().is_integrity_error());
//! ```

use thiserror::Error;

/// Unified error type for dust-map construction and evaluation.
#[derive(Error, Debug)]
pub enum DustError {
    /// No catalog entry at any resolution level contains the coordinate.
    ///
    /// Only raised by scalar queries; batch queries report NaN instead.
    #[error("Sightline (l={lon:.6}°, b={lat:.6}°) is not within the region covered by the extinction map")]
    OutOfFootprint { lon: f64, lat: f64 },

    /// More than one catalog entry at the same resolution level matched.
    #[error("Sightline (l={lon:.6}°, b={lat:.6}°) has {matches} matches for pixel {pixel} at nside {nside}")]
    AmbiguousMatch {
        lon: f64,
        lat: f64,
        nside: u32,
        pixel: u64,
        matches: usize,
    },

    /// The requested photometric filter has no known scale factor.
    #[error("Requested filter '{filter}' is not supported")]
    UnknownFilter { filter: String },

    /// The dataset variant name is not in the registry.
    #[error("Unknown dataset '{name}'")]
    UnknownDataset { name: String },

    /// Samples were requested but none are loaded or stored.
    #[error("No posterior samples loaded for this map")]
    SamplesUnavailable,

    /// Sample substitution index past the end of the sample axis.
    #[error("Sample index {index} out of range: {available} samples loaded")]
    SampleIndexOutOfRange { index: usize, available: usize },

    /// Dataset structural invariants are violated.
    #[error("Malformed dataset: {message}")]
    MalformedDataset { message: String },

    /// Spline order outside the supported range.
    #[error("Interpolation order {order} not supported (expected 1..=5)")]
    InvalidInterpolationOrder { order: usize },

    /// Batch inputs whose lengths cannot be broadcast together.
    #[error("Shape mismatch in {operation}: {message}")]
    ShapeMismatch { operation: String, message: String },

    /// Data access failure (file I/O, memory mapping).
    ///
    /// This is the only recoverable error variant.
    #[error("Data error ({file_type} - {operation}): {message}")]
    DataError {
        file_type: String,
        operation: String,
        message: String,
    },
}

/// Convenience alias for `Result<T, DustError>`.
pub type DustResult<T> = Result<T, DustError>;

impl DustError {
    /// Creates an [`OutOfFootprint`](Self::OutOfFootprint) error.
    pub fn out_of_footprint(lon: f64, lat: f64) -> Self {
        Self::OutOfFootprint { lon, lat }
    }

    /// Creates an [`UnknownFilter`](Self::UnknownFilter) error.
    pub fn unknown_filter(filter: &str) -> Self {
        Self::UnknownFilter {
            filter: filter.to_string(),
        }
    }

    /// Creates an [`UnknownDataset`](Self::UnknownDataset) error.
    pub fn unknown_dataset(name: &str) -> Self {
        Self::UnknownDataset {
            name: name.to_string(),
        }
    }

    /// Creates a [`MalformedDataset`](Self::MalformedDataset) error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDataset {
            message: message.into(),
        }
    }

    /// Creates a [`ShapeMismatch`](Self::ShapeMismatch) error.
    pub fn shape_mismatch(operation: &str, message: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Creates a [`DataError`](Self::DataError) (the only recoverable variant).
    pub fn data_error(file_type: &str, operation: &str, reason: &str) -> Self {
        Self::DataError {
            file_type: file_type.to_string(),
            operation: operation.to_string(),
            message: reason.to_string(),
        }
    }

    /// Returns `true` for errors that indicate a corrupt or inconsistent dataset.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            Self::AmbiguousMatch { .. } | Self::MalformedDataset { .. }
        )
    }

    /// Returns `true` if retrying might succeed.
    ///
    /// Only [`DataError`](Self::DataError) is recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DataError { .. })
    }
}

impl From<std::io::Error> for DustError {
    fn from(err: std::io::Error) -> Self {
        Self::data_error("dataset", "io", &err.to_string())
    }
}
