//! Seeded observation recorder.
//!
//! Steps every emitter of a scenario, converts the active ones into
//! sensor-relative states and samples one observation per step from the
//! configured model.

use crate::replay::ObservationFrame;
use crate::scenarios::Scenario;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sensor_models::{ObservationModel, Result, TargetState};

/// Samples observations of a scenario from one model.
pub struct Observer<'m> {
    model: &'m dyn ObservationModel,
    rng: ChaCha8Rng,
}

impl<'m> Observer<'m> {
    pub fn new(model: &'m dyn ObservationModel, seed: u64) -> Self {
        Self {
            model,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Sample one observation of `states`.
    pub fn observe(&mut self, time: f64, states: Vec<TargetState>) -> Result<ObservationFrame> {
        let observation = self.model.observation(&states, &mut self.rng)?;
        Ok(ObservationFrame {
            time,
            states,
            observation,
        })
    }

    /// Run the whole scenario, one frame per `sim_dt`.
    pub fn run(&mut self, scenario: &mut Scenario) -> Result<Vec<ObservationFrame>> {
        let dt = scenario.sim_dt;
        let mut frames = Vec::with_capacity(scenario.steps());
        for step in 0..scenario.steps() {
            let time = step as f64 * dt;
            let states: Vec<TargetState> = scenario
                .emitters
                .iter()
                .filter(|e| e.is_active(time))
                .map(|e| e.relative_to(scenario.sensor_heading))
                .collect();
            let frame = self.observe(time, states)?;
            tracing::debug!(time, observation = %frame.observation, "sampled observation");
            frames.push(frame);

            for emitter in &mut scenario.emitters {
                emitter.step(dt);
            }
        }
        Ok(frames)
    }
}
