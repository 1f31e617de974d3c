use log::{info, warn};
use serde::Deserialize;

use crate::context::{LightId, RideContext};
use crate::timer::Countdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficPhase {
    None,
    WaitingForBrake,
    WaitingForStop,
    WaitingForGo,
}

/// How a stop-light sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceOutcome {
    pub light: LightId,
    pub ran_red_light: bool,
}

pub type CompletionCallback = Box<dyn FnOnce(&SequenceOutcome)>;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    /// Seconds the player has to hit the brake once the prompt shows.
    pub brake_timer: f32,
    /// Pause between the cab coming to rest and the light turning green.
    pub stop_grace_delay: f32,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            brake_timer: 3.0,
            stop_grace_delay: 0.5,
        }
    }
}

struct ActiveSequence {
    light: LightId,
    brake: Countdown,
    grace: Option<Countdown>,
    on_complete: Option<CompletionCallback>,
}

/// The brake / stop / go handshake run when the cab reaches a red or
/// yellow light.
///
/// At most one sequence runs at a time. While one is active the player's
/// start/stop intents belong to it, and it is the only writer of the
/// vehicle and the light. Once begun it always finishes, either with the
/// player waiting for green or with the light run.
pub struct TrafficLightSequencer {
    config: TrafficConfig,
    phase: TrafficPhase,
    active: Option<ActiveSequence>,
    completed: u32,
}

impl TrafficLightSequencer {
    pub fn new(config: TrafficConfig) -> Self {
        Self {
            config,
            phase: TrafficPhase::None,
            active: None,
            completed: 0,
        }
    }

    pub fn phase(&self) -> TrafficPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Number of sequences finished so far, either way.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Start a sequence for `light`. Returns `false` (and does nothing) when
    /// a sequence is already running or the light does not exist.
    pub fn begin(
        &mut self,
        light: LightId,
        brake_timer: f32,
        on_complete: CompletionCallback,
        ctx: &mut RideContext<'_>,
    ) -> bool {
        if self.is_active() {
            info!("Traffic sequence already running, ignoring trigger for light #{light}");
            return false;
        }
        let Some(signal) = ctx.lights.get_mut(light) else {
            warn!("Traffic sequence requested for unknown light #{light}");
            return false;
        };

        info!(
            "Red light '{}' ({:?}): brake within {brake_timer:.1}s",
            signal.name(),
            signal.current_state()
        );
        signal.pause_cycle();
        ctx.prompts.show_break_with_timer(brake_timer, true);

        self.active = Some(ActiveSequence {
            light,
            brake: Countdown::new(brake_timer),
            grace: None,
            on_complete: Some(on_complete),
        });
        self.phase = TrafficPhase::WaitingForBrake;

        if brake_timer <= 0.0 {
            self.finish(true, ctx);
        }
        true
    }

    /// Player pressed "stop". Only meaningful while waiting for the brake.
    pub fn on_stop_intent(&mut self, ctx: &mut RideContext<'_>) {
        if self.phase != TrafficPhase::WaitingForBrake {
            return;
        }
        info!("Braking for the light");
        ctx.prompts.resolve_break(true);
        ctx.vehicle.stop_move_smooth();
        self.phase = TrafficPhase::WaitingForStop;
    }

    /// Player pressed "start". Only meaningful once the light went green.
    pub fn on_start_intent(&mut self, ctx: &mut RideContext<'_>) {
        if self.phase != TrafficPhase::WaitingForGo {
            return;
        }
        ctx.prompts.hide_forward();
        ctx.vehicle.start_move();
        self.finish(false, ctx);
    }

    pub fn tick(&mut self, dt: f32, ctx: &mut RideContext<'_>) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        match self.phase {
            TrafficPhase::WaitingForBrake => {
                if active.brake.tick(dt) {
                    info!("Brake window missed");
                    self.finish(true, ctx);
                }
            }
            TrafficPhase::WaitingForStop => {
                if ctx.vehicle.is_moving() {
                    return;
                }
                let grace = active
                    .grace
                    .get_or_insert_with(|| Countdown::new(self.config.stop_grace_delay));
                if grace.tick(dt) {
                    if let Some(signal) = ctx.lights.get_mut(active.light) {
                        signal.force_green(false);
                    }
                    ctx.prompts.show_forward();
                    self.phase = TrafficPhase::WaitingForGo;
                    info!("Light is green, waiting for the player to drive on");
                }
            }
            TrafficPhase::WaitingForGo | TrafficPhase::None => {}
        }
    }

    fn finish(&mut self, ran_red_light: bool, ctx: &mut RideContext<'_>) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        if let Some(signal) = ctx.lights.get_mut(active.light) {
            if ran_red_light {
                signal.force_green(true);
            } else {
                signal.resume_cycle();
            }
        }

        if ran_red_light {
            ctx.stats.record_failure();
        } else {
            ctx.stats.record_success();
        }
        info!(
            "Traffic sequence for light #{} done (ran red: {ran_red_light})",
            active.light
        );

        self.phase = TrafficPhase::None;
        self.completed += 1;
        let outcome = SequenceOutcome {
            light: active.light,
            ran_red_light,
        };
        if let Some(callback) = active.on_complete.take() {
            callback(&outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::testing::Rig;
    use crate::traffic::light::LightState;

    fn completion_counter() -> (Rc<RefCell<Vec<SequenceOutcome>>>, CompletionCallback) {
        let seen: Rc<RefCell<Vec<SequenceOutcome>>> = Rc::default();
        let sink = seen.clone();
        (seen, Box::new(move |o: &SequenceOutcome| sink.borrow_mut().push(*o)))
    }

    fn moving_rig() -> Rig {
        let mut rig = Rig::new();
        rig.vehicle.moving = true;
        rig.vehicle.stops_instantly = false;
        rig
    }

    #[test]
    fn test_brake_stop_go_path_records_success() {
        let mut rig = moving_rig();
        let mut seq = TrafficLightSequencer::new(TrafficConfig::default());
        let (seen, done) = completion_counter();

        assert!(seq.begin(0, 3.0, done, &mut rig.ctx()));
        assert_eq!(seq.phase(), TrafficPhase::WaitingForBrake);
        assert!(rig.lights[0].is_paused());
        assert!(rig.called("prompt.show_break_timer:3"));

        seq.tick(1.0, &mut rig.ctx());
        seq.on_stop_intent(&mut rig.ctx());
        assert_eq!(seq.phase(), TrafficPhase::WaitingForStop);
        assert!(rig.called("vehicle.stop"));
        assert!(rig.called("prompt.resolve_break:true"));

        // Still rolling: the brake window no longer matters.
        seq.tick(5.0, &mut rig.ctx());
        assert_eq!(seq.phase(), TrafficPhase::WaitingForStop);

        rig.vehicle.moving = false;
        seq.tick(0.3, &mut rig.ctx());
        assert_eq!(seq.phase(), TrafficPhase::WaitingForStop);
        seq.tick(0.3, &mut rig.ctx());
        assert_eq!(seq.phase(), TrafficPhase::WaitingForGo);
        assert_eq!(rig.lights[0].current_state(), LightState::Green);
        assert!(rig.lights[0].is_paused());

        seq.on_start_intent(&mut rig.ctx());
        assert!(!seq.is_active());
        assert_eq!(seq.phase(), TrafficPhase::None);
        assert!(rig.called("vehicle.start"));
        assert!(!rig.lights[0].is_paused());
        assert_eq!((rig.stats.successes, rig.stats.failures), (1, 0));
        assert_eq!(
            *seen.borrow(),
            vec![SequenceOutcome { light: 0, ran_red_light: false }]
        );
    }

    #[test]
    fn test_missed_brake_window_runs_the_red() {
        let mut rig = moving_rig();
        let mut seq = TrafficLightSequencer::new(TrafficConfig::default());
        let (seen, done) = completion_counter();

        seq.begin(0, 2.0, done, &mut rig.ctx());
        seq.tick(1.5, &mut rig.ctx());
        assert!(seq.is_active());
        seq.tick(0.6, &mut rig.ctx());

        assert!(!seq.is_active());
        assert_eq!(rig.lights[0].current_state(), LightState::Green);
        assert!(!rig.lights[0].is_paused());
        assert_eq!((rig.stats.successes, rig.stats.failures), (0, 1));
        assert!(seen.borrow()[0].ran_red_light);
        assert!(!rig.called("vehicle.stop"));
    }

    #[test]
    fn test_start_intent_ignored_while_waiting_for_brake() {
        let mut rig = moving_rig();
        let mut seq = TrafficLightSequencer::new(TrafficConfig::default());
        let (_, done) = completion_counter();

        seq.begin(0, 3.0, done, &mut rig.ctx());
        rig.clear_calls();
        seq.on_start_intent(&mut rig.ctx());
        assert_eq!(seq.phase(), TrafficPhase::WaitingForBrake);
        assert!(rig.calls().is_empty());
    }

    #[test]
    fn test_reentrant_trigger_is_ignored() {
        let mut rig = moving_rig();
        let mut seq = TrafficLightSequencer::new(TrafficConfig::default());
        let (first, done) = completion_counter();
        let (second, done_again) = completion_counter();

        assert!(seq.begin(0, 1.0, done, &mut rig.ctx()));
        assert!(!seq.begin(0, 1.0, done_again, &mut rig.ctx()));

        seq.tick(2.0, &mut rig.ctx());
        assert_eq!(first.borrow().len(), 1);
        assert!(second.borrow().is_empty());
        assert_eq!(rig.stats.successes + rig.stats.failures, 1);

        // A fresh trigger is accepted once the first one finished.
        let (third, done_third) = completion_counter();
        assert!(seq.begin(0, 1.0, done_third, &mut rig.ctx()));
        seq.tick(2.0, &mut rig.ctx());
        assert_eq!(third.borrow().len(), 1);
        assert_eq!(seq.completed(), 2);
    }

    #[test]
    fn test_exactly_one_stat_per_sequence() {
        for stop_in_time in [true, false] {
            let mut rig = moving_rig();
            rig.vehicle.stops_instantly = true;
            let mut seq = TrafficLightSequencer::new(TrafficConfig::default());
            let (_, done) = completion_counter();

            seq.begin(0, 1.0, done, &mut rig.ctx());
            if stop_in_time {
                seq.on_stop_intent(&mut rig.ctx());
            }
            for _ in 0..10 {
                seq.tick(0.25, &mut rig.ctx());
            }
            seq.on_start_intent(&mut rig.ctx());

            assert!(!seq.is_active());
            assert_eq!(rig.stats.successes + rig.stats.failures, 1);
        }
    }

    #[test]
    fn test_unknown_light_is_rejected() {
        let mut rig = moving_rig();
        let mut seq = TrafficLightSequencer::new(TrafficConfig::default());
        let (seen, done) = completion_counter();
        assert!(!seq.begin(9, 1.0, done, &mut rig.ctx()));
        assert!(!seq.is_active());
        assert!(seen.borrow().is_empty());
    }
}
