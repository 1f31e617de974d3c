use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::dialogue::{PresenterConfig, RoundSequence};
use crate::results::ResultsContent;
use crate::round::RoundConfig;
use crate::traffic::{LightTimings, TrafficConfig, ZoneConfig};
use crate::vehicle::VehicleConfig;

/// Every tunable of a ride. Missing keys keep their defaults, so a config
/// file only has to name what it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RideConfig {
    pub round: RoundConfig,
    pub presenter: PresenterConfig,
    pub traffic: TrafficConfig,
    pub light: LightTimings,
    pub zone: ZoneConfig,
    pub vehicle: VehicleConfig,
    /// Fixed seed for every random delay. `None` draws from entropy.
    pub seed: Option<u64>,
    /// Simulation steps per second in the terminal driver.
    pub tick_rate: f32,
}

impl Default for RideConfig {
    fn default() -> Self {
        Self {
            round: RoundConfig::default(),
            presenter: PresenterConfig::default(),
            traffic: TrafficConfig::default(),
            light: LightTimings::default(),
            zone: ZoneConfig::default(),
            vehicle: VehicleConfig::default(),
            seed: None,
            tick_rate: 30.0,
        }
    }
}

impl RideConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        if config.tick_rate.is_nan() || config.tick_rate <= 0.0 {
            bail!("tick_rate must be positive, got {}", config.tick_rate);
        }
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Seconds per simulation step.
    pub fn tick_interval(&self) -> f32 {
        1.0 / self.tick_rate
    }

    /// A fresh generator for one consumer. Seeded configs give every
    /// consumer its own stream so they do not disturb each other.
    pub fn rng(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy(),
        }
    }
}

/// Round content as authored: the passengers plus the results board.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RideContent {
    #[serde(flatten)]
    pub sequence: RoundSequence,
    pub results: ResultsContent,
}

impl RideContent {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read content {}", path.display()))?;
        let content: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse content {}", path.display()))?;
        info!(
            "Loaded {} passenger(s) from {}",
            content.sequence.len(),
            path.display()
        );
        Ok(content)
    }
}
