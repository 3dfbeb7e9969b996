//! Idealised range-only sensor.
//!
//! The reported value is `1 / r̃²` where `r̃ ~ N(r, σ)`, i.e. an inverse-square
//! signal strength proxy rather than the range itself. Scoring converts the
//! reading back with `sqrt(1 / obs)` and compares it to each hypothesis range.

use crate::error::{Result, SensorError};
use crate::observation::{
    check_sigma, check_state, expect_states, gaussian_kernel, score_states, single_state,
    Hypotheses, Observation, ObservationModel, TargetState,
};
use nalgebra::DVector;
use rand::RngCore;
use rand_distr::{Distribution, Normal};

/// Range noise (meters).
pub const IDEAL_RANGE_SIGMA: f64 = 10.0;
/// Added to every weight so no hypothesis is driven to exactly zero.
pub const IDEAL_RANGE_WEIGHT_FLOOR: f64 = 1e-9;

#[derive(Clone, Debug)]
pub struct IdealRangeModel {
    sigma: f64,
}

impl Default for IdealRangeModel {
    fn default() -> Self {
        Self {
            sigma: IDEAL_RANGE_SIGMA,
        }
    }
}

impl IdealRangeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sigma(sigma: f64) -> Result<Self> {
        Ok(Self {
            sigma: check_sigma("range", sigma)?,
        })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Weight of one hypothesised state.
    pub fn weight_state(&self, obs: f64, state: &TargetState) -> Result<f64> {
        check_state(state)?;
        let observed_range = (1.0 / obs).sqrt();
        Ok(gaussian_kernel(state.distance - observed_range, self.sigma) + IDEAL_RANGE_WEIGHT_FLOOR)
    }
}

impl ObservationModel for IdealRangeModel {
    fn name(&self) -> &'static str {
        "idealrange"
    }

    fn num_avail_obs(&self) -> Option<usize> {
        Some(1)
    }

    fn observation(&self, state: &[TargetState], rng: &mut dyn RngCore) -> Result<Observation> {
        let target = single_state(self.name(), state)?;
        let noisy = Normal::new(target.distance, self.sigma)
            .map_err(|e| SensorError::InvalidConfig(format!("range sigma {}: {e}", self.sigma)))?
            .sample(rng);
        Ok(Observation::InverseSquareRange {
            value: 1.0 / (noisy * noisy),
        })
    }

    fn weight(&self, hyp: &Hypotheses, obs: &Observation) -> Result<DVector<f64>> {
        let value = match *obs {
            Observation::InverseSquareRange { value } if value > 0.0 && value.is_finite() => value,
            Observation::InverseSquareRange { .. } => {
                return Err(SensorError::ObservationMismatch {
                    model: self.name(),
                    found: "non-positive inverse-square range",
                })
            }
            _ => {
                return Err(SensorError::ObservationMismatch {
                    model: self.name(),
                    found: obs.kind(),
                })
            }
        };
        let states = expect_states(self.name(), hyp)?;
        score_states(states, |s| self.weight_state(value, s))
    }
}
