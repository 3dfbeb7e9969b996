//! Free-space link budget, dB ↔ linear conversion and incoherent power summation.
//!
//! # Link budget
//! P_rx = P_tx + G_rx + G_tx + 20·log10(c / 4π) − 20·log10(d) − 20·log10(f)
//!
//! With log-normal fading enabled, one sample of N(0, σ_fade) is subtracted
//! per call. Power from several emitters is summed in linear units before
//! converting back to dB; averaging dB values would be wrong.

use crate::error::{Result, SensorError};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Speed of light in vacuum (m/s).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Transmitter side of the link, fixed for the lifetime of a model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkBudget {
    /// Transmit power (dBm)
    pub power_tx_dbm: f64,
    /// Transmit antenna gain (dBi)
    pub gain_tx_dbi: f64,
    /// Carrier frequency (Hz)
    pub freq_hz: f64,
    /// Log-normal fading standard deviation (dB); `None` or 0 disables fading
    pub fading_sigma_db: Option<f64>,
}

impl Default for LinkBudget {
    fn default() -> Self {
        Self {
            power_tx_dbm: 26.0,
            gain_tx_dbi: 1.0,
            freq_hz: 5.7e9,
            fading_sigma_db: None,
        }
    }
}

impl LinkBudget {
    pub fn validate(&self) -> Result<()> {
        if !(self.freq_hz > 0.0 && self.freq_hz.is_finite()) {
            return Err(SensorError::InvalidConfig(format!(
                "frequency must be positive, got {} Hz",
                self.freq_hz
            )));
        }
        if !self.power_tx_dbm.is_finite() || !self.gain_tx_dbi.is_finite() {
            return Err(SensorError::InvalidConfig(
                "transmit power and gain must be finite".into(),
            ));
        }
        if let Some(sigma) = self.fading_sigma_db {
            if !(sigma >= 0.0 && sigma.is_finite()) {
                return Err(SensorError::InvalidConfig(format!(
                    "fading sigma must be non-negative, got {sigma} dB"
                )));
            }
        }
        Ok(())
    }

    fn fading(&self) -> Option<f64> {
        self.fading_sigma_db.filter(|s| *s > 0.0)
    }
}

/// `10^(dB / 10)`
pub fn db_to_power(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

/// `10·log10(power)`
pub fn power_to_db(power: f64) -> f64 {
    10.0 * power.log10()
}

/// Sum several dB readings as independent (incoherent) powers.
pub fn combine_db<I: IntoIterator<Item = f64>>(readings: I) -> f64 {
    power_to_db(readings.into_iter().map(db_to_power).sum())
}

fn free_space_constant() -> f64 {
    20.0 * (SPEED_OF_LIGHT / (4.0 * PI)).log10()
}

pub(crate) fn check_distance(distance: f64) -> Result<()> {
    if distance > 0.0 && distance.is_finite() {
        Ok(())
    } else {
        Err(SensorError::InvalidState(format!(
            "distance must be positive and finite, got {distance}"
        )))
    }
}

/// Noise-free received power (dB) at `distance` metres.
pub fn free_space_power_db(distance: f64, gain_rx_db: f64, link: &LinkBudget) -> Result<f64> {
    check_distance(distance)?;
    Ok(link.power_tx_dbm + gain_rx_db + link.gain_tx_dbi + free_space_constant()
        - 20.0 * distance.log10()
        - 20.0 * link.freq_hz.log10())
}

/// Received power (dB) with one fresh fading draw when fading is enabled.
pub fn received_power_db<R: Rng + ?Sized>(
    distance: f64,
    gain_rx_db: f64,
    link: &LinkBudget,
    rng: &mut R,
) -> Result<f64> {
    let power = free_space_power_db(distance, gain_rx_db, link)?;
    match link.fading() {
        Some(sigma) => {
            let normal = Normal::new(0.0, sigma)
                .map_err(|e| SensorError::InvalidConfig(format!("fading sigma {sigma}: {e}")))?;
            Ok(power - normal.sample(rng))
        }
        None => Ok(power),
    }
}

/// Invert the link budget: the distance at which `rssi` would be received.
pub fn distance_from_rssi(rssi: f64, gain_rx_db: f64, link: &LinkBudget) -> f64 {
    let exponent = (link.power_tx_dbm + gain_rx_db + link.gain_tx_dbi
        - rssi
        - 20.0 * link.freq_hz.log10()
        + free_space_constant())
        / 20.0;
    10f64.powf(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn db_power_roundtrip() {
        for x in [1e-12, 0.5, 1.0, 42.0, 3.5e7] {
            assert_abs_diff_eq!(db_to_power(power_to_db(x)), x, epsilon = x * 1e-12);
        }
        for db in [-120.0, -3.0, 0.0, 17.25, 80.0] {
            assert_abs_diff_eq!(power_to_db(db_to_power(db)), db, epsilon = 1e-9);
        }
    }

    #[test]
    fn known_link_budget() {
        // 26 dBm + 0 + 1 dBi at 100 m, 5.7 GHz → FSPL ≈ 87.565 dB
        let p = free_space_power_db(100.0, 0.0, &LinkBudget::default()).unwrap();
        assert_abs_diff_eq!(p, -60.5653, epsilon = 1e-3);
    }

    #[test]
    fn power_decreases_with_distance_and_frequency() {
        let link = LinkBudget::default();
        let near = free_space_power_db(10.0, 3.0, &link).unwrap();
        let far = free_space_power_db(20.0, 3.0, &link).unwrap();
        assert!(far < near);
        assert_abs_diff_eq!(near - far, 20.0 * 2f64.log10(), epsilon = 1e-9);

        let high = LinkBudget {
            freq_hz: 2.0 * link.freq_hz,
            ..link
        };
        assert!(free_space_power_db(10.0, 3.0, &high).unwrap() < near);

        let loud = LinkBudget {
            power_tx_dbm: link.power_tx_dbm + 5.0,
            ..link
        };
        assert_abs_diff_eq!(
            free_space_power_db(10.0, 3.0, &loud).unwrap() - near,
            5.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn two_identical_emitters_add_three_db() {
        let single = free_space_power_db(50.0, 2.0, &LinkBudget::default()).unwrap();
        let pair = combine_db([single, single]);
        assert_abs_diff_eq!(pair - single, 10.0 * 2f64.log10(), epsilon = 1e-9);
        assert_abs_diff_eq!(pair - single, 3.0103, epsilon = 1e-4);
    }

    #[test]
    fn non_positive_distance_is_rejected() {
        let link = LinkBudget::default();
        for d in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                free_space_power_db(d, 0.0, &link),
                Err(SensorError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn distance_inverts_link_budget() {
        let link = LinkBudget::default();
        for d in [1.0, 37.5, 1200.0] {
            let rssi = free_space_power_db(d, 4.0, &link).unwrap();
            assert_abs_diff_eq!(distance_from_rssi(rssi, 4.0, &link), d, epsilon = d * 1e-9);
        }
    }

    #[test]
    fn fading_is_resampled_each_call() {
        let link = LinkBudget {
            fading_sigma_db: Some(4.0),
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let a = received_power_db(80.0, 0.0, &link, &mut rng).unwrap();
        let b = received_power_db(80.0, 0.0, &link, &mut rng).unwrap();
        assert_ne!(a, b);

        let mut replay = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(received_power_db(80.0, 0.0, &link, &mut replay).unwrap(), a);
    }

    #[test]
    fn zero_sigma_disables_fading() {
        let link = LinkBudget {
            fading_sigma_db: Some(0.0),
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            received_power_db(80.0, 0.0, &link, &mut rng).unwrap(),
            free_space_power_db(80.0, 0.0, &link).unwrap()
        );
    }

    #[test]
    fn negative_sigma_fails_validation() {
        let link = LinkBudget {
            fading_sigma_db: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(link.validate(), Err(SensorError::InvalidConfig(_))));
    }
}
