use std::rc::Rc;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use serde::Deserialize;

use crate::context::RideContext;
use crate::dialogue::{CharacterDialogue, RoundSequence};
use crate::round::state::{RoundState, StateObserver};
use crate::timer::{Countdown, DelayRange};

/// More transitions than one tick can legitimately cascade through.
const MAX_CASCADE: usize = 64;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Every wait of the round, in seconds. Each one is re-drawn every time it
/// is used.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    pub delay_before_trip_loop: DelayRange,
    pub delay_between_dialogues: DelayRange,
    pub delay_before_results: DelayRange,
    pub pause_before_nodes: DelayRange,
    pub passenger_enter_anim_wait: DelayRange,
    pub passenger_exit_anim_wait: DelayRange,
    pub door_open_delay: DelayRange,
    pub door_close_delay: DelayRange,
    pub after_door_open_delay: DelayRange,
    pub after_door_close_delay: DelayRange,
    /// Screen to show once the round is over. Blank disables the switch.
    pub results_scene: String,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            delay_before_trip_loop: DelayRange::new(2.0, 5.0),
            delay_between_dialogues: DelayRange::new(2.0, 5.0),
            delay_before_results: DelayRange::new(2.0, 5.0),
            pause_before_nodes: DelayRange::new(2.0, 5.0),
            passenger_enter_anim_wait: DelayRange::new(0.6, 1.2),
            passenger_exit_anim_wait: DelayRange::new(0.6, 1.2),
            door_open_delay: DelayRange::new(0.3, 0.6),
            door_close_delay: DelayRange::new(0.3, 0.5),
            after_door_open_delay: DelayRange::new(0.5, 1.0),
            after_door_close_delay: DelayRange::new(0.3, 0.6),
            results_scene: "Results".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// The ride from engine start to the results screen.
///
/// Advances only from `tick` (timers, vehicle settling, dialogue end) and
/// from the two player intents. Within one tick it keeps moving through
/// states until one of them has to wait, the way a coroutine would run to
/// its next yield.
pub struct RoundSequencer {
    config: RoundConfig,
    sequence: Option<Rc<RoundSequence>>,
    rng: StdRng,
    state: RoundState,
    passenger: usize,
    timer: Countdown,
    dialogue_open: bool,
    observer: Option<Box<dyn StateObserver>>,
}

impl RoundSequencer {
    pub fn new(sequence: Option<Rc<RoundSequence>>, config: RoundConfig, rng: StdRng) -> Self {
        Self {
            config,
            sequence,
            rng,
            state: RoundState::WaitingForEngineStart,
            passenger: 0,
            timer: Countdown::default(),
            dialogue_open: false,
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: Box<dyn StateObserver>) {
        self.observer = Some(observer);
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn passenger_index(&self) -> usize {
        self.passenger
    }

    pub fn passenger_count(&self) -> usize {
        self.sequence.as_ref().map_or(0, |s| s.len())
    }

    pub fn current_passenger(&self) -> Option<&CharacterDialogue> {
        self.sequence.as_ref()?.get(self.passenger)
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Seconds left on the current wait, zero when not waiting on a timer.
    pub fn time_left(&self) -> f32 {
        self.timer.remaining()
    }

    /// Put the "drive" prompt up for the first start.
    pub fn begin(&mut self, ctx: &mut RideContext<'_>) {
        info!(
            "Round ready: {} passenger(s), waiting for engine start",
            self.passenger_count()
        );
        ctx.prompts.show_forward();
    }

    pub fn on_start_intent(&mut self, ctx: &mut RideContext<'_>) {
        match self.state {
            RoundState::WaitingForEngineStart => {
                self.drive_off(ctx);
                self.enter(RoundState::WaitingInitialTripDelay, ctx);
            }
            RoundState::WaitingForStartAfterEntry => {
                self.drive_off(ctx);
                self.enter(RoundState::PauseBeforeNodes, ctx);
            }
            state => debug!("Start ignored in {state}"),
        }
    }

    pub fn on_stop_intent(&mut self, ctx: &mut RideContext<'_>) {
        if self.state != RoundState::PromptStopForDropoff {
            debug!("Stop ignored in {}", self.state);
            return;
        }
        ctx.vehicle.stop_move_smooth();
        ctx.prompts.hide_break();
        self.enter(RoundState::WaitingStopForDropoff, ctx);
    }

    /// Hand control back after a traffic sequence held the round. The
    /// sequence may have driven the cab on and taken down the brake
    /// prompt, so re-apply whatever the held state is waiting on.
    pub fn resume_after_traffic(&mut self, ctx: &mut RideContext<'_>) {
        use RoundState::*;

        match self.state {
            RequestStopAtPickup | WaitingStoppedAtPickup | WaitingStopForDropoff => {
                info!("Traffic cleared in {}, pulling over again", self.state);
                ctx.vehicle.stop_move_smooth();
            }
            PromptStopForDropoff => {
                info!("Traffic cleared, asking for the drop-off stop again");
                ctx.prompts.show_break();
            }
            state => debug!("Traffic cleared in {state}, nothing to restore"),
        }
    }

    pub fn tick(&mut self, dt: f32, ctx: &mut RideContext<'_>) {
        let mut dt = dt;
        for _ in 0..MAX_CASCADE {
            if !self.step(dt, ctx) {
                return;
            }
            // Time was spent by the wait that just finished.
            dt = 0.0;
        }
        warn!("Round did not settle within one tick, stopped at {}", self.state);
    }

    /// Run the current state once. Returns `true` if the state changed.
    fn step(&mut self, dt: f32, ctx: &mut RideContext<'_>) -> bool {
        use RoundState::*;

        match self.state {
            WaitingForEngineStart | WaitingForStartAfterEntry | PromptStopForDropoff | TransitionToResults => false,
            WaitingInitialTripDelay => {
                if !self.timer.tick(dt) {
                    return false;
                }
                self.next_passenger(ctx);
                true
            }
            RequestStopAtPickup => {
                self.enter(WaitingStoppedAtPickup, ctx);
                true
            }
            WaitingStoppedAtPickup | WaitingStopForDropoff => {
                if ctx.vehicle.is_moving() {
                    return false;
                }
                ctx.sounds.engine_stop();
                let next = if self.state == WaitingStoppedAtPickup {
                    DoorOpeningForEntry
                } else {
                    DoorOpeningForExit
                };
                self.enter(next, ctx);
                true
            }
            DoorOpeningForEntry => self.after_timer(dt, PassengerEntering, ctx),
            PassengerEntering => self.after_timer(dt, DoorClosingAfterEntry, ctx),
            DoorClosingAfterEntry => self.after_timer(dt, WaitingForStartAfterEntry, ctx),
            PauseBeforeNodes => self.after_timer(dt, RunningDialogueNodes, ctx),
            RunningDialogueNodes => {
                let ended = self.dialogue_open
                    && ctx.presenter.as_mut().is_some_and(|p| p.take_ended());
                if !ended {
                    return false;
                }
                self.dialogue_open = false;
                info!("Dialogue finished");
                self.enter(PromptStopForDropoff, ctx);
                true
            }
            DoorOpeningForExit => self.after_timer(dt, PassengerExiting, ctx),
            PassengerExiting => self.after_timer(dt, DoorClosingAfterExit, ctx),
            DoorClosingAfterExit => {
                if !self.timer.tick(dt) {
                    return false;
                }
                ctx.sounds.engine_start();
                self.enter(BetweenDialoguesDelay, ctx);
                true
            }
            BetweenDialoguesDelay => {
                if !self.timer.tick(dt) {
                    return false;
                }
                self.passenger += 1;
                self.next_passenger(ctx);
                true
            }
            FinishedDelay => self.after_timer(dt, TransitionToResults, ctx),
        }
    }

    fn after_timer(&mut self, dt: f32, next: RoundState, ctx: &mut RideContext<'_>) -> bool {
        if !self.timer.tick(dt) {
            return false;
        }
        self.enter(next, ctx);
        true
    }

    fn next_passenger(&mut self, ctx: &mut RideContext<'_>) {
        if self.passenger < self.passenger_count() {
            self.enter(RoundState::RequestStopAtPickup, ctx);
        } else {
            self.enter(RoundState::FinishedDelay, ctx);
        }
    }

    fn drive_off(&mut self, ctx: &mut RideContext<'_>) {
        ctx.vehicle.start_move();
        ctx.prompts.hide_forward();
        ctx.sounds.engine_start();
    }

    fn arm(&mut self, range: DelayRange) {
        self.timer = Countdown::new(range.sample(&mut self.rng));
    }

    /// Two back-to-back waits, each drawn on its own.
    fn arm_pair(&mut self, first: DelayRange, second: DelayRange) {
        let seconds = first.sample(&mut self.rng) + second.sample(&mut self.rng);
        self.timer = Countdown::new(seconds);
    }

    fn enter(&mut self, next: RoundState, ctx: &mut RideContext<'_>) {
        use RoundState::*;

        let prev = self.state;
        self.state = next;
        self.timer = Countdown::default();
        debug!("{prev} -> {next}");
        if let Some(observer) = self.observer.as_mut() {
            observer.state_changed(prev, next);
        }

        match next {
            WaitingInitialTripDelay => self.arm(self.config.delay_before_trip_loop),
            RequestStopAtPickup => {
                if let Some(p) = self.current_passenger() {
                    info!(
                        "Passenger #{}: picking up '{}'",
                        self.passenger, p.character_id
                    );
                }
                ctx.vehicle.stop_move_smooth();
            }
            DoorOpeningForEntry | DoorOpeningForExit => {
                ctx.sounds.door_open();
                self.arm_pair(self.config.door_open_delay, self.config.after_door_open_delay);
            }
            PassengerEntering => {
                if let Some(p) = self.current_passenger() {
                    ctx.actor.set_character(&p.character_id);
                }
                ctx.actor.enter();
                self.arm(self.config.passenger_enter_anim_wait);
            }
            DoorClosingAfterEntry | DoorClosingAfterExit => {
                ctx.sounds.door_close();
                self.arm_pair(self.config.door_close_delay, self.config.after_door_close_delay);
            }
            WaitingForStartAfterEntry => {
                ctx.prompts.show_forward();
                info!("Waiting for the player to drive off with the passenger");
            }
            PauseBeforeNodes => self.arm(self.config.pause_before_nodes),
            RunningDialogueNodes => self.open_dialogue(ctx),
            PromptStopForDropoff => {
                ctx.prompts.show_break();
                info!("Waiting for the player to pull over");
            }
            PassengerExiting => {
                ctx.actor.exit();
                self.arm(self.config.passenger_exit_anim_wait);
            }
            BetweenDialoguesDelay => self.arm(self.config.delay_between_dialogues),
            FinishedDelay => {
                ctx.sounds.engine_stop();
                self.arm(self.config.delay_before_results);
            }
            TransitionToResults => {
                info!("Round finished after {} passenger(s)", self.passenger);
                let scene = self.config.results_scene.trim();
                if !scene.is_empty() {
                    ctx.screens.load_results(scene);
                }
            }
            WaitingForEngineStart | WaitingStoppedAtPickup | WaitingStopForDropoff => {}
        }
    }

    fn open_dialogue(&mut self, ctx: &mut RideContext<'_>) {
        let Some(sequence) = self.sequence.clone() else {
            return;
        };
        let Some(dialogue) = sequence.get(self.passenger) else {
            return;
        };
        match ctx.presenter.as_mut() {
            Some(presenter) => {
                info!("Starting dialogue for '{}'", dialogue.character_id);
                presenter.start_dialogue(dialogue);
                self.dialogue_open = true;
            }
            None => {
                // No recovery policy yet: the round waits here for good.
                warn!(
                    "Cannot start dialogue for '{}': no presenter, round will not advance",
                    dialogue.character_id
                );
            }
        }
    }
}
