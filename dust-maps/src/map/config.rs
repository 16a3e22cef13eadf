use dust_core::{Calibration, DustResult, FilterScaler};
use serde::{Deserialize, Serialize};

/// Construction options shared by every map.
///
/// ```
/// use dust_maps::MapConfig;
///
/// let config: MapConfig = serde_json::from_str(r#"{"filter": "2MASS Ks", "interp_order": 3}"#).unwrap();
/// assert_eq!(config.filter.as_deref(), Some("2MASS Ks"));
/// assert!(!config.load_samples);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Photometric filter to report extinction in; `None` keeps native units.
    pub filter: Option<String>,
    pub calibration: Calibration,
    /// Spline order for radial interpolation, 1..=5.
    pub interp_order: usize,
    pub load_samples: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            filter: None,
            calibration: Calibration::default(),
            interp_order: 1,
            load_samples: false,
        }
    }
}

impl MapConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_interp_order(mut self, order: usize) -> Self {
        self.interp_order = order;
        self
    }

    pub fn with_samples(mut self, load_samples: bool) -> Self {
        self.load_samples = load_samples;
        self
    }

    /// Multiplier from native units to the configured filter.
    ///
    /// # Errors
    /// [`DustError::UnknownFilter`](dust_core::DustError::UnknownFilter) for an
    /// unsupported filter name.
    pub fn scale_factor(&self) -> DustResult<f64> {
        match &self.filter {
            Some(filter) => FilterScaler::new(self.calibration).scale_factor(filter),
            None => Ok(1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MapConfig::default();
        assert_eq!(config.interp_order, 1);
        assert_eq!(config.calibration, Calibration::Recalibrated);
        assert_eq!(config.scale_factor().unwrap(), 1.0);
    }

    #[test]
    fn test_scale_factor_follows_calibration() {
        let config = MapConfig::default().with_filter("SDSS r");
        assert_eq!(config.scale_factor().unwrap(), 2.285);
        let legacy = config.with_calibration(Calibration::Legacy);
        assert_eq!(legacy.scale_factor().unwrap(), 2.751);
    }

    #[test]
    fn test_unknown_filter() {
        assert!(MapConfig::default().with_filter("Bessel Q").scale_factor().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: MapConfig =
            serde_json::from_str(r#"{"calibration": "legacy", "load_samples": true}"#).unwrap();
        assert_eq!(config.calibration, Calibration::Legacy);
        assert!(config.load_samples);
        assert_eq!(config.interp_order, 1);
        assert_eq!(config.filter, None);
    }
}
