//! Observation model interface and the values it consumes and produces.
//!
//! # Capability set
//! - `observation(state, rng)`: sample what the sensor would report for a
//!   scenario (one row per emitter). May be stochastic; all randomness comes
//!   from the caller's generator.
//! - `weight(hypotheses, obs)`: deterministic likelihood of `obs` for each
//!   hypothesis row. Rows are independent.
//! - `acceptance(state)`: probability that the detector reports anything at
//!   all for `state`; multiplies the discrete-model weights.

use crate::error::{Result, SensorError};
use crate::propagation::check_distance;
use nalgebra::{DMatrix, DVector};
use rand::RngCore;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One emitter relative to the sensor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetState {
    /// Range from the sensor (meters)
    pub distance: f64,
    /// Bearing relative to the sensor boresight (degrees)
    pub bearing: f64,
}

impl TargetState {
    pub fn new(distance: f64, bearing: f64) -> Self {
        Self { distance, bearing }
    }

    pub fn bearing_rad(&self) -> f64 {
        self.bearing * std::f64::consts::PI / 180.0
    }
}

/// A sampled sensor reading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    /// Front and back antenna RSSI (dB)
    FrontBack { front_db: f64, back_db: f64 },
    /// Front antenna RSSI only (dB)
    Front { front_db: f64 },
    /// `1 / r²` of a noisy range reading
    InverseSquareRange { value: f64 },
    /// Discrete detector class in `0..num_avail_obs`
    Class { index: usize },
}

impl Observation {
    pub fn kind(&self) -> &'static str {
        match self {
            Observation::FrontBack { .. } => "front/back rssi",
            Observation::Front { .. } => "front rssi",
            Observation::InverseSquareRange { .. } => "inverse-square range",
            Observation::Class { .. } => "discrete class",
        }
    }

    /// RSSI readings as a row, in hypothesis column order.
    pub fn rssi_row(&self) -> Option<Vec<f64>> {
        match *self {
            Observation::FrontBack { front_db, back_db } => Some(vec![front_db, back_db]),
            Observation::Front { front_db } => Some(vec![front_db]),
            _ => None,
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::FrontBack { front_db, back_db } => {
                write!(f, "front={front_db:.2}dB back={back_db:.2}dB")
            }
            Observation::Front { front_db } => write!(f, "front={front_db:.2}dB"),
            Observation::InverseSquareRange { value } => write!(f, "1/r²={value:.3e}"),
            Observation::Class { index } => write!(f, "class={index}"),
        }
    }
}

/// Candidate values scored against one observation, one row per particle.
#[derive(Clone, Debug, PartialEq)]
pub enum Hypotheses {
    /// Expected RSSI readings: N rows × (1 or 2) columns (front[, back])
    Expected(DMatrix<f64>),
    /// Hypothesised emitter states
    States(Vec<TargetState>),
}

impl Hypotheses {
    /// Build an expected-reading matrix from equally sized rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let ncols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != ncols) {
            return Err(SensorError::HypothesisShape {
                model: "hypotheses",
                expected: format!("{ncols} columns"),
                found: format!("{} columns", bad.len()),
            });
        }
        Ok(Hypotheses::Expected(DMatrix::from_row_iterator(
            rows.len(),
            ncols,
            rows.iter().flatten().copied(),
        )))
    }

    pub fn len(&self) -> usize {
        match self {
            Hypotheses::Expected(m) => m.nrows(),
            Hypotheses::States(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Hypotheses::Expected(m) => format!("{}x{} expected readings", m.nrows(), m.ncols()),
            Hypotheses::States(s) => format!("{} states", s.len()),
        }
    }
}

/// A probabilistic sensor: sampling, scoring and acceptance.
pub trait ObservationModel: Send + Sync + fmt::Debug {
    /// Registry name of this model family.
    fn name(&self) -> &'static str;

    /// Number of discrete observation classes, `None` for continuous readings.
    fn num_avail_obs(&self) -> Option<usize> {
        None
    }

    /// Sample an observation for a scenario (one row per emitter).
    fn observation(&self, state: &[TargetState], rng: &mut dyn RngCore) -> Result<Observation>;

    /// Likelihood of `obs` under each hypothesis row.
    fn weight(&self, hyp: &Hypotheses, obs: &Observation) -> Result<DVector<f64>>;

    /// Probability that the detector registers `state` at all.
    fn acceptance(&self, _state: &TargetState) -> f64 {
        1.0
    }

    /// Hypotheses this model scores for candidate single-emitter states.
    fn hypotheses(&self, candidates: &[TargetState]) -> Result<Hypotheses> {
        Ok(Hypotheses::States(candidates.to_vec()))
    }
}

/// `exp(−r² / 2σ²)`
pub fn gaussian_kernel(residual: f64, sigma: f64) -> f64 {
    (-(residual * residual) / (2.0 * sigma * sigma)).exp()
}

/// Reject states no sensor could observe (non-positive or non-finite range).
pub fn check_state(state: &TargetState) -> Result<()> {
    check_distance(state.distance)
}

/// Kernel widths must be positive and finite for weights to stay finite.
pub(crate) fn check_sigma(what: &str, sigma: f64) -> Result<f64> {
    if sigma > 0.0 && sigma.is_finite() {
        Ok(sigma)
    } else {
        Err(SensorError::InvalidConfig(format!(
            "{what} sigma must be positive and finite, got {sigma}"
        )))
    }
}

/// Models that describe a single emitter reject any other row count.
pub(crate) fn single_state<'a>(model: &str, state: &'a [TargetState]) -> Result<&'a TargetState> {
    match state {
        [one] => check_state(one).map(|()| one),
        _ => Err(SensorError::InvalidState(format!(
            "{model} observes exactly one target, got {}",
            state.len()
        ))),
    }
}

/// Score every state hypothesis in parallel, keeping row order.
pub(crate) fn score_states<F>(states: &[TargetState], score: F) -> Result<DVector<f64>>
where
    F: Fn(&TargetState) -> Result<f64> + Send + Sync,
{
    let weights: Vec<f64> = states.par_iter().map(score).collect::<Result<_>>()?;
    Ok(DVector::from_vec(weights))
}

pub(crate) fn expect_states<'a>(
    model: &'static str,
    hyp: &'a Hypotheses,
) -> Result<&'a [TargetState]> {
    match hyp {
        Hypotheses::States(states) => Ok(states),
        other => Err(SensorError::HypothesisShape {
            model,
            expected: "target states".into(),
            found: other.describe(),
        }),
    }
}
