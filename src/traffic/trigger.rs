use std::cell::Cell;
use std::rc::Rc;

use log::{debug, info};
use serde::Deserialize;

use crate::context::{LightId, RideContext};
use crate::traffic::sequencer::{SequenceOutcome, TrafficLightSequencer};

/// Where the stop zone sits on every road segment.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub segment_length: f32,
    pub zone_start: f32,
    pub zone_end: f32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            segment_length: 270.0,
            zone_start: 120.0,
            zone_end: 150.0,
        }
    }
}

impl ZoneConfig {
    pub fn contains(&self, position: f32) -> bool {
        if self.segment_length <= 0.0 {
            return false;
        }
        let local = position.abs().rem_euclid(self.segment_length);
        local >= self.zone_start && local < self.zone_end
    }
}

/// Detects the cab entering a light's stop zone and starts the sequence.
///
/// A trigger fires at most once per zone visit, and not again while its
/// own sequence is still being processed.
pub struct TrafficLightTrigger {
    light: LightId,
    zone: ZoneConfig,
    brake_timer: f32,
    inside: bool,
    triggered: bool,
    processing: Rc<Cell<bool>>,
}

impl TrafficLightTrigger {
    pub fn new(light: LightId, zone: ZoneConfig, brake_timer: f32) -> Self {
        Self {
            light,
            zone,
            brake_timer,
            inside: false,
            triggered: false,
            processing: Rc::new(Cell::new(false)),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.processing.get()
    }

    pub fn reset(&mut self) {
        self.triggered = false;
        self.processing.set(false);
    }

    /// Feed the cab's current road position.
    pub fn update(
        &mut self,
        position: f32,
        sequencer: &mut TrafficLightSequencer,
        ctx: &mut RideContext<'_>,
    ) {
        let inside = self.zone.contains(position);
        match (self.inside, inside) {
            (false, true) => self.on_enter(sequencer, ctx),
            (true, false) => self.on_exit(),
            _ => {}
        }
        self.inside = inside;
    }

    fn on_enter(&mut self, sequencer: &mut TrafficLightSequencer, ctx: &mut RideContext<'_>) {
        if self.triggered || self.processing.get() {
            debug!("Light #{} zone entered again while busy, ignoring", self.light);
            return;
        }
        let Some(signal) = ctx.lights.get(self.light) else {
            return;
        };
        if !signal.should_stop() {
            info!("Passed light '{}' on {:?}", signal.name(), signal.current_state());
            return;
        }

        self.triggered = true;
        self.processing.set(true);
        let processing = self.processing.clone();
        let accepted = sequencer.begin(
            self.light,
            self.brake_timer,
            Box::new(move |_: &SequenceOutcome| processing.set(false)),
            ctx,
        );
        if !accepted {
            self.processing.set(false);
        }
    }

    fn on_exit(&mut self) {
        if !self.processing.get() {
            self.triggered = false;
        }
    }
}
