//! Name → constructor lookup for configuration-driven callers.
//!
//! [`ModelRegistry::default`] exposes the three RSSI models under their
//! historical names. [`ModelRegistry::extended`] adds every other variant.

use crate::config::SensorConfig;
use crate::detection::{DroneModel, HeadingModel};
use crate::error::{Result, SensorError};
use crate::observation::ObservationModel;
use crate::range::IdealRangeModel;
use crate::rssi::{DualRssiLofiModel, DualRssiModel, SingleRssiModel};

/// Builds a boxed model from a configuration.
pub type ModelConstructor = fn(&SensorConfig) -> Result<Box<dyn ObservationModel>>;

fn build_dual_rssi(config: &SensorConfig) -> Result<Box<dyn ObservationModel>> {
    Ok(Box::new(DualRssiModel::from_config(config)?))
}

fn build_dual_rssi_lofi(config: &SensorConfig) -> Result<Box<dyn ObservationModel>> {
    Ok(Box::new(DualRssiLofiModel::from_config(config)?))
}

fn build_single_rssi(config: &SensorConfig) -> Result<Box<dyn ObservationModel>> {
    Ok(Box::new(SingleRssiModel::wide(config)?))
}

fn build_single_rssi_narrow(config: &SensorConfig) -> Result<Box<dyn ObservationModel>> {
    Ok(Box::new(SingleRssiModel::narrow(config)?))
}

fn build_ideal_range(_config: &SensorConfig) -> Result<Box<dyn ObservationModel>> {
    Ok(Box::new(IdealRangeModel::new()))
}

fn build_drone(_config: &SensorConfig) -> Result<Box<dyn ObservationModel>> {
    Ok(Box::new(DroneModel::new()))
}

fn build_heading(config: &SensorConfig) -> Result<Box<dyn ObservationModel>> {
    Ok(Box::new(HeadingModel::new(config.sensor_range)?))
}

/// Ordered table of named model constructors.
#[derive(Clone)]
pub struct ModelRegistry {
    entries: Vec<(String, ModelConstructor)>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("doublerssi", build_dual_rssi);
        registry.register("doublerssilofi", build_dual_rssi_lofi);
        registry.register("singlerssi", build_single_rssi);
        registry
    }
}

impl ModelRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Default entries plus every remaining model variant.
    pub fn extended() -> Self {
        let mut registry = Self::default();
        registry.register("singlerssinarrow", build_single_rssi_narrow);
        registry.register("idealrange", build_ideal_range);
        registry.register("drone", build_drone);
        registry.register("heading", build_heading);
        registry
    }

    /// Add or replace a named constructor.
    pub fn register(&mut self, name: &str, constructor: ModelConstructor) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = constructor,
            None => self.entries.push((name.to_string(), constructor)),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<ModelConstructor> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ctor)| *ctor)
            .ok_or_else(|| SensorError::UnknownModel {
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// Look up `name` and construct it from `config`.
    pub fn build(&self, name: &str, config: &SensorConfig) -> Result<Box<dyn ObservationModel>> {
        let model = self.lookup(name)?(config)?;
        tracing::info!(model = name, "constructed observation model");
        Ok(model)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }
}

/// Constructor for `name` from the default registry.
pub fn get_model(name: &str) -> Result<ModelConstructor> {
    ModelRegistry::default().lookup(name)
}
