//! `sensor_models` — Probabilistic observation models for emitter localisation.
//!
//! # Module layout
//! - [`pattern`]     — Receive antenna radiation pattern table
//! - [`propagation`] — Free-space link budget, fading, dB ↔ linear power
//! - [`observation`] — Model interface, target states, observations, hypotheses
//! - [`rssi`]        — Dual / single antenna RSSI models
//! - [`range`]       — Idealised range-only model
//! - [`detection`]   — Binary and four-sector discrete detectors
//! - [`registry`]    — Name → constructor lookup
//! - [`config`]      — Construction parameters
//! - [`error`]       — Error taxonomy

pub mod config;
pub mod detection;
pub mod error;
pub mod observation;
pub mod pattern;
pub mod propagation;
pub mod range;
pub mod registry;
pub mod rssi;

pub use config::SensorConfig;
pub use detection::{DroneModel, HeadingModel};
pub use error::{Result, SensorError};
pub use observation::{Hypotheses, Observation, ObservationModel, TargetState};
pub use pattern::RadiationPattern;
pub use propagation::LinkBudget;
pub use range::IdealRangeModel;
pub use registry::{get_model, ModelConstructor, ModelRegistry};
pub use rssi::{AntennaFrontEnd, DualRssiLofiModel, DualRssiModel, LofiScoring, SingleRssiModel};
