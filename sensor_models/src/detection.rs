//! Discrete detector models.
//!
//! - [`DroneModel`] (`drone`): binary front/back detector driven by the
//!   relative bearing of the emitter.
//! - [`HeadingModel`] (`heading`): four-class sector detector with a finite
//!   sensor range. Each class has its own confidence function that is 1 deep
//!   inside its sector, ramps linearly to 0 between `sensor_range / 2` and
//!   `sensor_range`, and sits at [`SECTOR_FLOOR`] outside the sector.
//!
//! Both score a discrete observation against hypothesised emitter states as
//! `acceptance(state) × P(obs | state)`.

use crate::error::{Result, SensorError};
use crate::observation::{
    check_state, expect_states, score_states, single_state, Hypotheses, Observation,
    ObservationModel, TargetState,
};
use nalgebra::DVector;
use rand::distributions::{Distribution, WeightedIndex};
use rand::RngCore;

/// Confidence reported by a sector detector outside its own sector.
pub const SECTOR_FLOOR: f64 = 0.0001;

fn class_index(model: &'static str, obs: &Observation, num_avail: usize) -> Result<usize> {
    match *obs {
        Observation::Class { index } if index < num_avail => Ok(index),
        Observation::Class { index } => Err(SensorError::ObservationOutOfRange {
            value: index,
            num_avail,
        }),
        _ => Err(SensorError::ObservationMismatch {
            model,
            found: obs.kind(),
        }),
    }
}

fn sample_class(weights: &[f64], rng: &mut dyn RngCore) -> Result<usize> {
    let dist = WeightedIndex::new(weights).map_err(|e| {
        SensorError::InvalidState(format!("detector weights {weights:?} unusable: {e}"))
    })?;
    Ok(dist.sample(rng))
}

// ---------------------------------------------------------------------------
// Binary detector
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct DroneModel;

impl DroneModel {
    pub const NUM_AVAIL_OBS: usize = 2;

    pub fn new() -> Self {
        Self
    }

    /// Probability of reporting class 1 for `state`.
    ///
    /// The front lobe spans ±60° around boresight whichever way the bearing
    /// is expressed; the back lobe is [120°, 240°] on the [0, 360) circle.
    pub fn obs1_prob(&self, state: &TargetState) -> f64 {
        let brg = state.bearing.rem_euclid(360.0);
        if brg <= 60.0 || brg >= 300.0 {
            0.9
        } else if (120.0..=240.0).contains(&brg) {
            0.1
        } else {
            0.5
        }
    }

    pub fn weight_state(&self, obs: usize, state: &TargetState) -> Result<f64> {
        check_state(state)?;
        let p1 = self.obs1_prob(state);
        let likelihood = match obs {
            1 => p1,
            0 => 1.0 - p1,
            _ => {
                return Err(SensorError::ObservationOutOfRange {
                    value: obs,
                    num_avail: Self::NUM_AVAIL_OBS,
                })
            }
        };
        Ok(self.acceptance(state) * likelihood)
    }
}

impl ObservationModel for DroneModel {
    fn name(&self) -> &'static str {
        "drone"
    }

    fn num_avail_obs(&self) -> Option<usize> {
        Some(Self::NUM_AVAIL_OBS)
    }

    fn observation(&self, state: &[TargetState], rng: &mut dyn RngCore) -> Result<Observation> {
        let target = single_state(self.name(), state)?;
        let p1 = self.obs1_prob(target);
        let index = sample_class(&[1.0 - p1, p1], rng)?;
        Ok(Observation::Class { index })
    }

    fn weight(&self, hyp: &Hypotheses, obs: &Observation) -> Result<DVector<f64>> {
        let index = class_index(self.name(), obs, Self::NUM_AVAIL_OBS)?;
        let states = expect_states(self.name(), hyp)?;
        score_states(states, |s| self.weight_state(index, s))
    }
}

// ---------------------------------------------------------------------------
// Four-sector heading detector
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct HeadingModel {
    /// Range beyond which no sector detector fires (meters)
    sensor_range: f64,
}

impl Default for HeadingModel {
    fn default() -> Self {
        Self {
            sensor_range: 150.0,
        }
    }
}

/// Bearing folded into [0, 360) for negative inputs only.
fn rel_bearing(state: &TargetState) -> f64 {
    if state.bearing < 0.0 {
        state.bearing + 360.0
    } else {
        state.bearing
    }
}

impl HeadingModel {
    pub const NUM_AVAIL_OBS: usize = 4;

    pub fn new(sensor_range: f64) -> Result<Self> {
        if !(sensor_range > 0.0 && sensor_range.is_finite()) {
            return Err(SensorError::InvalidConfig(format!(
                "sensor range must be positive, got {sensor_range}"
            )));
        }
        Ok(Self { sensor_range })
    }

    pub fn sensor_range(&self) -> f64 {
        self.sensor_range
    }

    fn in_sector1(brg: f64) -> bool {
        (brg > 60.0 && brg < 90.0) || (brg > 270.0 && brg < 300.0)
    }

    fn in_sector2(brg: f64) -> bool {
        (90.0..120.0).contains(&brg) || (brg > 240.0 && brg <= 270.0)
    }

    fn in_sector3(brg: f64) -> bool {
        (120.0..=240.0).contains(&brg)
    }

    /// Full confidence inside half range, linear ramp to zero at full range.
    fn ramp_down(&self, in_sector: bool, range: f64) -> f64 {
        if in_sector && range < self.sensor_range / 2.0 {
            1.0
        } else if in_sector && range < self.sensor_range {
            2.0 - 2.0 * range / self.sensor_range
        } else {
            SECTOR_FLOOR
        }
    }

    pub fn obs1(&self, state: &TargetState) -> f64 {
        self.ramp_down(Self::in_sector1(rel_bearing(state)), state.distance)
    }

    pub fn obs2(&self, state: &TargetState) -> f64 {
        self.ramp_down(Self::in_sector2(rel_bearing(state)), state.distance)
    }

    pub fn obs3(&self, state: &TargetState) -> f64 {
        self.ramp_down(Self::in_sector3(rel_bearing(state)), state.distance)
    }

    /// "Nothing seen": certain ahead of the sensor or out of range, ramps up
    /// across the outer half of every sector.
    pub fn obs0(&self, state: &TargetState) -> f64 {
        let brg = rel_bearing(state);
        let range = state.distance;
        if brg <= 60.0 || brg >= 300.0 || range >= self.sensor_range {
            return 1.0;
        }
        if !(self.obs1(state) > 0.0) && !(self.obs2(state) > 0.0) && !(self.obs3(state) > 0.0) {
            return 1.0;
        }
        let outer_half = self.sensor_range / 2.0 < range && range < self.sensor_range;
        let any_sector = (120.0..=240.0).contains(&brg)
            || (90.0..120.0).contains(&brg)
            || (brg > 240.0 && brg <= 270.0)
            || (60.0..90.0).contains(&brg)
            || (brg > 270.0 && brg <= 300.0);
        if any_sector && outer_half {
            return 2.0 * range / self.sensor_range - 1.0;
        }
        SECTOR_FLOOR
    }

    /// Unnormalised confidences for classes 0..4.
    pub fn class_weights(&self, state: &TargetState) -> [f64; 4] {
        [
            self.obs0(state),
            self.obs1(state),
            self.obs2(state),
            self.obs3(state),
        ]
    }

    pub fn weight_state(&self, obs: usize, state: &TargetState) -> Result<f64> {
        check_state(state)?;
        let confidence = match obs {
            0 => self.obs0(state),
            1 => self.obs1(state),
            2 => self.obs2(state),
            3 => self.obs3(state),
            _ => {
                return Err(SensorError::ObservationOutOfRange {
                    value: obs,
                    num_avail: Self::NUM_AVAIL_OBS,
                })
            }
        };
        Ok(self.acceptance(state) * confidence)
    }
}

impl ObservationModel for HeadingModel {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn num_avail_obs(&self) -> Option<usize> {
        Some(Self::NUM_AVAIL_OBS)
    }

    /// Weighted choice over the raw class confidences.
    fn observation(&self, state: &[TargetState], rng: &mut dyn RngCore) -> Result<Observation> {
        let target = single_state(self.name(), state)?;
        let index = sample_class(&self.class_weights(target), rng)?;
        Ok(Observation::Class { index })
    }

    fn weight(&self, hyp: &Hypotheses, obs: &Observation) -> Result<DVector<f64>> {
        let index = class_index(self.name(), obs, Self::NUM_AVAIL_OBS)?;
        let states = expect_states(self.name(), hyp)?;
        score_states(states, |s| self.weight_state(index, s))
    }
}
