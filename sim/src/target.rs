//! Emitter trajectories and the sensor-relative state they produce.
//!
//! Each emitter has a planar true state [px, py, vx, vy] and a `MotionSpec`
//! describing how it moves. The sensor sits at the origin with a fixed
//! boresight heading.

use sensor_models::TargetState;
use serde::{Deserialize, Serialize};

/// Describes emitter motion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum MotionSpec {
    /// No motion.
    Stationary,
    /// Constant velocity: no acceleration.
    ConstantVelocity,
    /// Constant-turn-rate on XY plane. `omega` = yaw rate (rad/s).
    ConstantTurn { omega: f64 },
}

/// A simulated emitter with ground-truth state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Emitter {
    pub id: u64,
    /// True state [px, py, vx, vy] (meters, m/s)
    pub state: [f64; 4],
    pub motion: MotionSpec,
    /// Optional: emitter goes silent at this time
    pub silent_at: Option<f64>,
}

impl Emitter {
    pub fn new(id: u64, pos: [f64; 2], vel: [f64; 2], motion: MotionSpec) -> Self {
        Self {
            id,
            state: [pos[0], pos[1], vel[0], vel[1]],
            motion,
            silent_at: None,
        }
    }

    /// Propagate true state by `dt` seconds according to motion spec.
    pub fn step(&mut self, dt: f64) {
        let s = &mut self.state;
        match self.motion {
            MotionSpec::Stationary => {}
            MotionSpec::ConstantVelocity => {
                s[0] += s[2] * dt;
                s[1] += s[3] * dt;
            }
            MotionSpec::ConstantTurn { omega } => {
                let v = (s[2] * s[2] + s[3] * s[3]).sqrt();
                let heading = s[3].atan2(s[2]);
                let new_heading = heading + omega * dt;
                s[0] += v * heading.cos() * dt;
                s[1] += v * heading.sin() * dt;
                s[2] = v * new_heading.cos();
                s[3] = v * new_heading.sin();
            }
        }
    }

    /// True if the emitter is transmitting at time `t`.
    pub fn is_active(&self, t: f64) -> bool {
        self.silent_at.map_or(true, |silent| t < silent)
    }

    /// Range and boresight-relative bearing in [0, 360) degrees.
    pub fn relative_to(&self, sensor_heading_deg: f64) -> TargetState {
        let (x, y) = (self.state[0], self.state[1]);
        let distance = (x * x + y * y).sqrt();
        let bearing = (y.atan2(x).to_degrees() - sensor_heading_deg).rem_euclid(360.0);
        TargetState::new(distance, bearing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn constant_velocity_moves_linearly() {
        let mut e = Emitter::new(0, [10.0, 0.0], [2.0, -1.0], MotionSpec::ConstantVelocity);
        e.step(3.0);
        assert_abs_diff_eq!(e.state[0], 16.0, epsilon = 1e-12);
        assert_abs_diff_eq!(e.state[1], -3.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_turn_keeps_speed() {
        let mut e = Emitter::new(0, [50.0, 0.0], [0.0, 5.0], MotionSpec::ConstantTurn { omega: 0.1 });
        for _ in 0..100 {
            e.step(0.5);
        }
        let speed = (e.state[2].powi(2) + e.state[3].powi(2)).sqrt();
        assert_abs_diff_eq!(speed, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn relative_bearing_wraps_into_circle() {
        let e = Emitter::new(0, [0.0, -30.0], [0.0, 0.0], MotionSpec::Stationary);
        let s = e.relative_to(0.0);
        assert_abs_diff_eq!(s.distance, 30.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.bearing, 270.0, epsilon = 1e-9);
        assert_abs_diff_eq!(e.relative_to(180.0).bearing, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn silent_emitters_are_inactive() {
        let mut e = Emitter::new(0, [1.0, 1.0], [0.0, 0.0], MotionSpec::Stationary);
        assert!(e.is_active(1e9));
        e.silent_at = Some(5.0);
        assert!(e.is_active(4.9));
        assert!(!e.is_active(5.0));
    }

    #[test]
    fn mirrored_emitters_look_alike_to_the_drone_detector() {
        let drone = sensor_models::DroneModel::new();
        let right = Emitter::new(0, [50.0, -28.87], [0.0, 0.0], MotionSpec::Stationary);
        let left = Emitter::new(1, [50.0, 28.87], [0.0, 0.0], MotionSpec::Stationary);
        let (r, l) = (right.relative_to(0.0), left.relative_to(0.0));
        assert!(r.bearing > 329.0 && r.bearing < 331.0, "bearing {}", r.bearing);
        assert_eq!(drone.obs1_prob(&r), 0.9);
        assert_eq!(drone.obs1_prob(&l), 0.9);
    }
}
