//! Scenario definitions.
//!
//! Each scenario is a named configuration of emitters around a sensor at the
//! origin. All scenarios are deterministic given the same seed.

use crate::target::{Emitter, MotionSpec};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Which pre-defined scenario to load.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// One emitter circling the sensor at ~100 m
    Orbit,
    /// One emitter crossing in front of the sensor
    Crossing,
    /// Two emitters, one circling and one static that goes silent after
    /// three quarters of the run (multi-target RSSI)
    Pair,
}

/// A fully configured simulation scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    pub duration: f64, // seconds
    pub sim_dt: f64,   // observation interval (s)
    /// Sensor boresight heading (degrees, counter-clockwise from +x)
    pub sensor_heading: f64,
    pub emitters: Vec<Emitter>,
}

impl Scenario {
    /// Build the named scenario. Uses `seed` for repeatability.
    pub fn build(kind: ScenarioKind, seed: u64) -> Self {
        match kind {
            ScenarioKind::Orbit => Self::orbit(seed),
            ScenarioKind::Crossing => Self::crossing(seed),
            ScenarioKind::Pair => Self::pair(seed),
        }
    }

    fn orbit(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let radius = 90.0 + rng.gen::<f64>() * 20.0;
        let start = rng.gen::<f64>() * std::f64::consts::TAU;
        let speed = 5.0;
        let omega = speed / radius;
        Self {
            name: "orbit".into(),
            seed,
            duration: 120.0,
            sim_dt: 1.0,
            sensor_heading: 0.0,
            emitters: vec![Emitter::new(
                0,
                [radius * start.cos(), radius * start.sin()],
                [-speed * start.sin(), speed * start.cos()],
                MotionSpec::ConstantTurn { omega },
            )],
        }
    }

    fn crossing(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
        let offset = 30.0 + rng.gen::<f64>() * 40.0;
        Self {
            name: "crossing".into(),
            seed,
            duration: 60.0,
            sim_dt: 1.0,
            sensor_heading: 0.0,
            emitters: vec![Emitter::new(
                0,
                [offset, -150.0],
                [0.0, 5.0],
                MotionSpec::ConstantVelocity,
            )],
        }
    }

    fn pair(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(2));
        let bearing = rng.gen::<f64>() * std::f64::consts::TAU;
        let mut orbit = Self::orbit(seed);
        orbit.name = "pair".into();
        let mut beacon = Emitter::new(
            1,
            [140.0 * bearing.cos(), 140.0 * bearing.sin()],
            [0.0, 0.0],
            MotionSpec::Stationary,
        );
        beacon.silent_at = Some(orbit.duration * 0.75);
        orbit.emitters.push(beacon);
        orbit
    }

    /// Number of observation steps over the scenario duration.
    pub fn steps(&self) -> usize {
        (self.duration / self.sim_dt).round() as usize
    }
}
