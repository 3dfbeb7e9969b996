//! `sim` — Emitter scenarios, seeded observation sampling, replay.

pub mod observer;
pub mod replay;
pub mod scenarios;
pub mod target;

pub use observer::Observer;
pub use replay::{load_replay, save_replay, ObservationFrame, ReplayLog};
pub use scenarios::{Scenario, ScenarioKind};
pub use target::{Emitter, MotionSpec};
