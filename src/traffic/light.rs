use log::debug;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    Red,
    Yellow,
    Green,
}

/// Seconds each color is held before the cycle moves on.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightTimings {
    pub red: f32,
    pub green: f32,
    pub yellow: f32,
}

impl Default for LightTimings {
    fn default() -> Self {
        Self {
            red: 5.0,
            green: 5.0,
            yellow: 2.0,
        }
    }
}

/// A free-running Red -> Green -> Yellow -> Red signal.
///
/// The cycle can be frozen in its current color and forced green from the
/// outside; forcing green always restarts the green phase from zero.
#[derive(Debug, Clone)]
pub struct TrafficLight {
    name: String,
    state: LightState,
    timings: LightTimings,
    elapsed: f32,
    paused: bool,
}

impl TrafficLight {
    pub fn new(name: impl Into<String>, timings: LightTimings) -> Self {
        Self {
            name: name.into(),
            state: LightState::Red,
            timings,
            elapsed: 0.0,
            paused: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_state(&self) -> LightState {
        self.state
    }

    /// Red and yellow both mean the driver has to stop.
    pub fn should_stop(&self) -> bool {
        matches!(self.state, LightState::Red | LightState::Yellow)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause_cycle(&mut self) {
        debug!("Light '{}' frozen at {:?}", self.name, self.state);
        self.paused = true;
    }

    pub fn resume_cycle(&mut self) {
        debug!("Light '{}' cycle resumed at {:?}", self.name, self.state);
        self.paused = false;
    }

    pub fn force_green(&mut self, resume_cycle: bool) {
        debug!("Light '{}' forced green (resume={resume_cycle})", self.name);
        self.set_state(LightState::Green);
        self.paused = !resume_cycle;
    }

    pub fn tick(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        self.elapsed += dt;
        // A long frame may skip through more than one color.
        loop {
            let hold = self.hold_time();
            if self.elapsed < hold {
                break;
            }
            self.elapsed -= hold;
            let next = match self.state {
                LightState::Red => LightState::Green,
                LightState::Green => LightState::Yellow,
                LightState::Yellow => LightState::Red,
            };
            self.state = next;
            if hold <= 0.0 {
                // Degenerate timings: avoid spinning forever.
                self.elapsed = 0.0;
                break;
            }
        }
    }

    fn hold_time(&self) -> f32 {
        match self.state {
            LightState::Red => self.timings.red,
            LightState::Green => self.timings.green,
            LightState::Yellow => self.timings.yellow,
        }
    }

    fn set_state(&mut self, state: LightState) {
        self.state = state;
        self.elapsed = 0.0;
    }
}
