use log::trace;
use serde::Deserialize;

use crate::context::Vehicle;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Road units per second at cruising speed.
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    /// Below this speed a stopping cab counts as standing still.
    pub stop_epsilon: f32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            max_speed: 6.0,
            acceleration: 18.0,
            deceleration: 24.0,
            stop_epsilon: 0.02,
        }
    }
}

/// A cab on a one-dimensional road.
///
/// `is_moving` follows the commanded target speed, not the actual speed:
/// a cab told to stop keeps reporting motion until it has slowed below
/// `stop_epsilon`, at which point the target is cleared.
#[derive(Debug, Clone)]
pub struct KinematicVehicle {
    config: VehicleConfig,
    speed: f32,
    target_speed: f32,
    stopping: bool,
    position: f32,
}

impl KinematicVehicle {
    pub fn new(config: VehicleConfig) -> Self {
        Self {
            config,
            speed: 0.0,
            target_speed: 0.0,
            stopping: true,
            position: 0.0,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Distance driven since the round started.
    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn tick(&mut self, dt: f32) {
        let (goal, rate) = if self.stopping {
            (0.0, self.config.deceleration)
        } else {
            (self.target_speed, self.config.acceleration)
        };
        let mut speed = move_towards(self.speed, goal, rate * dt);
        if self.stopping && speed.abs() <= self.config.stop_epsilon {
            speed = 0.0;
            self.target_speed = 0.0;
        }
        self.speed = speed;
        self.position += speed * dt;
        trace!("Cab at {:.1} doing {:.2}", self.position, self.speed);
    }
}

impl Vehicle for KinematicVehicle {
    fn start_move(&mut self) {
        self.target_speed = self.config.max_speed;
        self.stopping = false;
    }

    fn stop_move_smooth(&mut self) {
        // Keep the target until the cab has actually slowed down; the tick
        // clears it once speed falls under epsilon.
        self.stopping = true;
        if self.speed.abs() <= self.config.stop_epsilon {
            self.target_speed = 0.0;
        }
    }

    fn is_moving(&self) -> bool {
        self.target_speed.abs() > 0.01
    }
}

fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}
