pub mod light;
pub mod sequencer;
pub mod trigger;

pub use light::{LightTimings, TrafficLight};
pub use sequencer::{TrafficConfig, TrafficLightSequencer, TrafficPhase};
pub use trigger::{TrafficLightTrigger, ZoneConfig};
