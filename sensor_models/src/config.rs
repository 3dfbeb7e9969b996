//! Sensor construction parameters.

use crate::error::{Result, SensorError};
use crate::pattern::RadiationPattern;
use crate::propagation::LinkBudget;
use crate::rssi::LofiScoring;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration shared by every observation model constructor.
///
/// Fields that a model does not use are ignored by it (e.g. `sensor_range`
/// only matters to the four-sector heading model).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Radiation pattern file; `None` uses the bundled 5.7 GHz pattern
    pub antenna_pattern_path: Option<PathBuf>,
    /// Transmit power (dBm)
    pub power_tx_dbm: f64,
    /// Transmit antenna gain (dBi)
    pub gain_tx_dbi: f64,
    /// Carrier frequency (Hz)
    pub freq_hz: f64,
    /// Log-normal fading std dev (dB)
    pub fading_sigma_db: Option<f64>,
    /// Detection range of the heading sensor (meters)
    pub sensor_range: f64,
    /// Difference weighting rule of the `doublerssilofi` model
    pub lofi_scoring: LofiScoring,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            antenna_pattern_path: None,
            power_tx_dbm: 26.0,
            gain_tx_dbi: 1.0,
            freq_hz: 5.7e9,
            fading_sigma_db: None,
            sensor_range: 150.0,
            lofi_scoring: LofiScoring::default(),
        }
    }
}

impl SensorConfig {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SensorError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            SensorError::InvalidConfig(format!("cannot parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.link_budget().validate()?;
        if !(self.sensor_range > 0.0 && self.sensor_range.is_finite()) {
            return Err(SensorError::InvalidConfig(format!(
                "sensor range must be positive, got {}",
                self.sensor_range
            )));
        }
        Ok(())
    }

    pub fn link_budget(&self) -> LinkBudget {
        LinkBudget {
            power_tx_dbm: self.power_tx_dbm,
            gain_tx_dbi: self.gain_tx_dbi,
            freq_hz: self.freq_hz,
            fading_sigma_db: self.fading_sigma_db,
        }
    }

    /// Load the configured radiation pattern (or the bundled one).
    pub fn radiation_pattern(&self) -> Result<RadiationPattern> {
        match &self.antenna_pattern_path {
            Some(path) => RadiationPattern::load(path),
            None => RadiationPattern::bundled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_link() {
        let cfg = SensorConfig::default();
        assert_eq!(cfg.link_budget(), LinkBudget::default());
        assert_eq!(cfg.sensor_range, 150.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: SensorConfig =
            serde_json::from_str(r#"{ "fading_sigma_db": 8.0, "sensor_range": 90.0 }"#).unwrap();
        assert_eq!(cfg.fading_sigma_db, Some(8.0));
        assert_eq!(cfg.sensor_range, 90.0);
        assert_eq!(cfg.power_tx_dbm, 26.0);
        assert!(cfg.antenna_pattern_path.is_none());
        assert_eq!(cfg.lofi_scoring, LofiScoring::Gaussian);

        let cfg: SensorConfig = serde_json::from_str(r#"{ "lofi_scoring": "adaptive_sigma" }"#).unwrap();
        assert_eq!(cfg.lofi_scoring, LofiScoring::AdaptiveSigma);
    }

    #[test]
    fn rejects_non_positive_range() {
        let cfg = SensorConfig {
            sensor_range: 0.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(SensorError::InvalidConfig(_))));
    }

    #[test]
    fn bad_pattern_path_aborts() {
        let cfg = SensorConfig {
            antenna_pattern_path: Some("/no/such/pattern.csv".into()),
            ..Default::default()
        };
        assert!(matches!(
            cfg.radiation_pattern(),
            Err(SensorError::PatternIo { .. })
        ));
    }
}
