use std::rc::Rc;

use log::{debug, info};

use crate::config::RideConfig;
use crate::context::{ActorFacade, PromptUi, RideContext, ScreenFlow, SoundCues};
use crate::dialogue::{ClueCollector, DialoguePresentation, DialoguePresenter, DialogueView, RoundSequence};
use crate::round::{RoundSequencer, RoundState, StateObserver};
use crate::stats::{RoundSummary, TrafficStats};
use crate::traffic::{TrafficLight, TrafficLightSequencer, TrafficLightTrigger, TrafficPhase};
use crate::vehicle::KinematicVehicle;

// Random streams handed out by `RideConfig::rng`.
const ROUND_STREAM: u64 = 0;
const PRESENTER_STREAM: u64 = 1;

/// The outside world a ride talks to. Without a `view` there is no
/// dialogue presenter and the round stalls at its first conversation.
pub struct Collaborators {
    pub actor: Box<dyn ActorFacade>,
    pub prompts: Box<dyn PromptUi>,
    pub sounds: Box<dyn SoundCues>,
    pub screens: Box<dyn ScreenFlow>,
    pub view: Option<Box<dyn DialogueView>>,
}

/// Everything the sequencers may touch, kept apart from the sequencers so
/// both can be borrowed at once.
struct World {
    vehicle: KinematicVehicle,
    actor: Box<dyn ActorFacade>,
    prompts: Box<dyn PromptUi>,
    sounds: Box<dyn SoundCues>,
    screens: Box<dyn ScreenFlow>,
    presenter: Option<DialoguePresenter>,
    stats: TrafficStats,
    lights: Vec<TrafficLight>,
}

impl World {
    fn ctx(&mut self) -> RideContext<'_> {
        RideContext {
            vehicle: &mut self.vehicle,
            actor: self.actor.as_mut(),
            prompts: self.prompts.as_mut(),
            sounds: self.sounds.as_mut(),
            presenter: self
                .presenter
                .as_mut()
                .map(|p| p as &mut dyn DialoguePresentation),
            stats: &mut self.stats,
            screens: self.screens.as_mut(),
            lights: &mut self.lights,
        }
    }
}

/// One ride, wired together: the cab, the crossing on every road segment,
/// the traffic handshake and the passenger round.
///
/// While a traffic sequence is running it owns the player's intents and
/// the round is held where it is; the presenter keeps talking.
pub struct Ride {
    world: World,
    triggers: Vec<TrafficLightTrigger>,
    traffic: TrafficLightSequencer,
    round: RoundSequencer,
    sequence: Rc<RoundSequence>,
}

impl Ride {
    pub fn new(config: &RideConfig, sequence: RoundSequence, collaborators: Collaborators) -> Self {
        let sequence = Rc::new(sequence);
        let presenter = collaborators.view.map(|view| {
            DialoguePresenter::new(view, config.presenter.clone(), config.rng(PRESENTER_STREAM))
        });

        let lights = vec![TrafficLight::new("crossing", config.light)];
        let triggers = vec![TrafficLightTrigger::new(
            0,
            config.zone,
            config.traffic.brake_timer,
        )];

        Self {
            world: World {
                vehicle: KinematicVehicle::new(config.vehicle),
                actor: collaborators.actor,
                prompts: collaborators.prompts,
                sounds: collaborators.sounds,
                screens: collaborators.screens,
                presenter,
                stats: TrafficStats::default(),
                lights,
            },
            triggers,
            traffic: TrafficLightSequencer::new(config.traffic),
            round: RoundSequencer::new(
                Some(sequence.clone()),
                config.round.clone(),
                config.rng(ROUND_STREAM),
            ),
            sequence,
        }
    }

    pub fn set_observer(&mut self, observer: Box<dyn StateObserver>) {
        self.round.set_observer(observer);
    }

    pub fn sequence(&self) -> &RoundSequence {
        &self.sequence
    }

    pub fn state(&self) -> RoundState {
        self.round.state()
    }

    pub fn round(&self) -> &RoundSequencer {
        &self.round
    }

    pub fn traffic_phase(&self) -> TrafficPhase {
        self.traffic.phase()
    }

    pub fn is_finished(&self) -> bool {
        self.round.is_finished()
    }

    pub fn vehicle(&self) -> &KinematicVehicle {
        &self.world.vehicle
    }

    pub fn lights(&self) -> &[TrafficLight] {
        &self.world.lights
    }

    pub fn presenter(&self) -> Option<&DialoguePresenter> {
        self.world.presenter.as_ref()
    }

    pub fn stats(&self) -> &TrafficStats {
        &self.world.stats
    }

    pub fn begin(&mut self) {
        for trigger in &mut self.triggers {
            trigger.reset();
        }
        self.round.begin(&mut self.world.ctx());
    }

    pub fn tick(&mut self, dt: f32) {
        let finished_before = self.traffic.completed();
        self.world.vehicle.tick(dt);
        for light in &mut self.world.lights {
            light.tick(dt);
        }

        let position = self.world.vehicle.position();
        for trigger in &mut self.triggers {
            trigger.update(position, &mut self.traffic, &mut self.world.ctx());
        }

        if let Some(presenter) = self.world.presenter.as_mut() {
            presenter.tick(dt);
        }

        if self.traffic.is_active() {
            self.traffic.tick(dt, &mut self.world.ctx());
        }
        self.resume_round(finished_before);
        if !self.traffic.is_active() {
            self.round.tick(dt, &mut self.world.ctx());
        }
    }

    /// The "drive" button.
    pub fn request_start(&mut self) {
        if self.traffic.is_active() {
            debug!("Start routed to traffic ({:?})", self.traffic.phase());
            let finished_before = self.traffic.completed();
            self.traffic.on_start_intent(&mut self.world.ctx());
            self.resume_round(finished_before);
        } else {
            self.round.on_start_intent(&mut self.world.ctx());
        }
    }

    /// The "brake" button.
    pub fn request_stop(&mut self) {
        if self.traffic.is_active() {
            debug!("Stop routed to traffic ({:?})", self.traffic.phase());
            self.traffic.on_stop_intent(&mut self.world.ctx());
        } else {
            self.round.on_stop_intent(&mut self.world.ctx());
        }
    }

    // A sequence that ended since `finished_before` hands the round back.
    fn resume_round(&mut self, finished_before: u32) {
        if self.traffic.is_active() || self.traffic.completed() == finished_before {
            return;
        }
        self.round.resume_after_traffic(&mut self.world.ctx());
    }

    pub fn select_answer(&mut self, index: usize) -> bool {
        self.world
            .presenter
            .as_mut()
            .is_some_and(|p| p.select_answer(index))
    }

    pub fn collect_clue(&mut self, id: &str) -> bool {
        self.world
            .presenter
            .as_mut()
            .is_some_and(|p| p.click_link(id))
    }

    pub fn summary(&self) -> RoundSummary {
        let empty = ClueCollector::new();
        let clues = self.world.presenter.as_ref().map_or(&empty, DialoguePresenter::clues);
        let summary = RoundSummary::new(clues, &self.world.stats);
        info!(
            "Ride summary: clues {}/{}, lights {}/{}",
            summary.clues_collected, summary.clues_total, summary.lights_obeyed, summary.lights_total
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::context::Vehicle;
    use crate::dialogue::{CharacterDialogue, DialogueAnswer, DialogueNode, PresenterConfig};
    use crate::round::RoundConfig;
    use crate::testing::{CallLog, FakeActor, FakePrompts, FakeScreens, FakeSounds, FakeView};
    use crate::timer::DelayRange;
    use crate::traffic::light::LightState;
    use crate::traffic::{LightTimings, ZoneConfig};
    use crate::vehicle::VehicleConfig;

    const DT: f32 = 1.0 / 30.0;

    type Transitions = Rc<RefCell<Vec<RoundState>>>;

    struct Recorder(Transitions);

    impl StateObserver for Recorder {
        fn state_changed(&mut self, _from: RoundState, to: RoundState) {
            self.0.borrow_mut().push(to);
        }
    }

    fn collaborators(log: &CallLog, with_view: bool) -> Collaborators {
        Collaborators {
            actor: Box::new(FakeActor(log.clone())),
            prompts: Box::new(FakePrompts(log.clone())),
            sounds: Box::new(FakeSounds(log.clone())),
            screens: Box::new(FakeScreens(log.clone())),
            view: with_view.then(|| Box::new(FakeView(log.clone())) as Box<dyn DialogueView>),
        }
    }

    fn instant_config() -> RideConfig {
        let zero = DelayRange::fixed(0.0);
        RideConfig {
            round: RoundConfig {
                delay_before_trip_loop: zero,
                delay_between_dialogues: zero,
                delay_before_results: zero,
                pause_before_nodes: zero,
                passenger_enter_anim_wait: zero,
                passenger_exit_anim_wait: zero,
                door_open_delay: zero,
                door_close_delay: zero,
                after_door_open_delay: zero,
                after_door_close_delay: zero,
                results_scene: "Results".into(),
            },
            presenter: PresenterConfig {
                text_hide_duration: 0.0,
                pause: zero,
            },
            // Far enough away that no light is ever reached.
            zone: ZoneConfig {
                segment_length: 1.0e9,
                zone_start: 1.0e8,
                zone_end: 1.0e8 + 1.0,
            },
            seed: Some(1),
            ..Default::default()
        }
    }

    fn passenger() -> CharacterDialogue {
        CharacterDialogue {
            character_id: "nurse".into(),
            character_name: "Nurse".into(),
            nodes: vec![
                DialogueNode {
                    id: "greet".into(),
                    text: "Night shift at the <link=clinic>clinic</link>.".into(),
                    answers: vec![DialogueAnswer {
                        id: "ask".into(),
                        target_id: Some("bye".into()),
                        text: "Long night?".into(),
                        should_pause: false,
                    }],
                    ..Default::default()
                },
                DialogueNode {
                    id: "bye".into(),
                    text: "Like every <link=night>night</link>.".into(),
                    ..Default::default()
                },
            ],
        }
    }

    fn quiet_passenger() -> CharacterDialogue {
        CharacterDialogue {
            character_id: "clerk".into(),
            character_name: "Clerk".into(),
            nodes: vec![DialogueNode {
                id: "only".into(),
                text: "Evening.".into(),
                ..Default::default()
            }],
        }
    }

    /// A light that stays red, with its stop zone a few units up the road.
    fn red_light_config(deceleration: f32, trip_delay: f32) -> RideConfig {
        RideConfig {
            round: RoundConfig {
                delay_before_trip_loop: DelayRange::fixed(trip_delay),
                ..instant_config().round
            },
            zone: ZoneConfig {
                segment_length: 1000.0,
                zone_start: 5.0,
                zone_end: 8.0,
            },
            light: LightTimings {
                red: 1.0e6,
                green: 1.0,
                yellow: 1.0,
            },
            vehicle: VehicleConfig {
                deceleration,
                ..VehicleConfig::default()
            },
            ..instant_config()
        }
    }

    fn quiet_ride(config: &RideConfig, log: &CallLog) -> Ride {
        let sequence = RoundSequence {
            dialogues: vec![quiet_passenger()],
        };
        Ride::new(config, sequence, collaborators(log, true))
    }

    /// Brake for the light, wait for green and drive on.
    fn wait_out_the_light(ride: &mut Ride) {
        ride.request_stop();
        assert_eq!(ride.traffic_phase(), TrafficPhase::WaitingForStop);
        tick_until(ride, |r| r.traffic_phase() == TrafficPhase::WaitingForGo);
        ride.request_start();
        assert_eq!(ride.traffic_phase(), TrafficPhase::None);
    }

    /// Play the rest of the ride like an obedient driver.
    fn drive_to_results(ride: &mut Ride) {
        for _ in 0..20_000 {
            if ride.is_finished() {
                break;
            }
            match (ride.traffic_phase(), ride.state()) {
                (TrafficPhase::WaitingForBrake, _) => ride.request_stop(),
                (TrafficPhase::WaitingForGo, _) => ride.request_start(),
                (TrafficPhase::None, RoundState::WaitingForStartAfterEntry) => ride.request_start(),
                (TrafficPhase::None, RoundState::PromptStopForDropoff) => ride.request_stop(),
                _ => {}
            }
            ride.tick(DT);
        }
        assert_eq!(ride.state(), RoundState::TransitionToResults);
    }

    fn tick_until(ride: &mut Ride, mut done: impl FnMut(&Ride) -> bool) {
        for _ in 0..3000 {
            if done(ride) {
                return;
            }
            ride.tick(DT);
        }
        panic!("condition not reached, round at {}", ride.state());
    }

    #[test]
    fn test_full_ride_with_presenter() {
        let log: CallLog = Rc::default();
        let sequence = RoundSequence {
            dialogues: vec![passenger()],
        };
        let mut ride = Ride::new(&instant_config(), sequence, collaborators(&log, true));

        ride.begin();
        ride.request_start();
        tick_until(&mut ride, |r| r.state() == RoundState::WaitingForStartAfterEntry);
        assert!(!ride.vehicle().is_moving());

        ride.request_start();
        tick_until(&mut ride, |r| r.state() == RoundState::RunningDialogueNodes);
        let presenter = ride.presenter().unwrap();
        assert_eq!(presenter.current_node().unwrap().id, "greet");
        assert_eq!(presenter.current_answers().len(), 1);

        assert!(ride.collect_clue("clinic"));
        assert!(!ride.collect_clue("clinic"));
        assert!(ride.select_answer(0));
        ride.tick(DT);
        assert_eq!(ride.state(), RoundState::PromptStopForDropoff);

        ride.request_stop();
        tick_until(&mut ride, Ride::is_finished);

        assert!(log.borrow().iter().any(|c| c == "screen.results:Results"));
        let summary = ride.summary();
        assert_eq!((summary.clues_collected, summary.clues_total), (1, 2));
        assert_eq!(summary.lights_total, 0);
    }

    #[test]
    fn test_traffic_sequence_owns_intents_and_holds_the_round() {
        let log: CallLog = Rc::default();
        let config = RideConfig {
            round: RoundConfig {
                delay_before_trip_loop: DelayRange::fixed(60.0),
                ..instant_config().round
            },
            zone: ZoneConfig {
                segment_length: 1000.0,
                zone_start: 5.0,
                zone_end: 8.0,
            },
            ..instant_config()
        };
        let sequence = RoundSequence {
            dialogues: vec![passenger()],
        };
        let mut ride = Ride::new(&config, sequence, collaborators(&log, true));
        let transitions: Transitions = Rc::default();
        ride.set_observer(Box::new(Recorder(transitions.clone())));

        ride.begin();
        ride.request_start();
        tick_until(&mut ride, |r| r.traffic_phase() == TrafficPhase::WaitingForBrake);
        assert_eq!(ride.state(), RoundState::WaitingInitialTripDelay);
        assert!(ride.lights()[0].is_paused());
        let held = ride.round().time_left();

        // Start belongs to the traffic sequence and is ignored while braking.
        ride.request_start();
        assert_eq!(ride.traffic_phase(), TrafficPhase::WaitingForBrake);
        assert_eq!(transitions.borrow().len(), 1);

        ride.request_stop();
        assert_eq!(ride.traffic_phase(), TrafficPhase::WaitingForStop);
        tick_until(&mut ride, |r| r.traffic_phase() == TrafficPhase::WaitingForGo);
        assert_eq!(ride.lights()[0].current_state(), LightState::Green);
        assert_eq!(ride.round().time_left(), held);

        ride.request_start();
        assert_eq!(ride.traffic_phase(), TrafficPhase::None);
        assert!(ride.vehicle().is_moving());
        assert_eq!((ride.stats().successes, ride.stats().failures), (1, 0));
        assert_eq!(*transitions.borrow(), vec![RoundState::WaitingInitialTripDelay]);

        ride.tick(DT);
        assert!(ride.round().time_left() < held);
    }

    #[test]
    fn test_running_the_red_counts_a_failure() {
        let log: CallLog = Rc::default();
        let config = RideConfig {
            round: RoundConfig {
                delay_before_trip_loop: DelayRange::fixed(60.0),
                ..instant_config().round
            },
            zone: ZoneConfig {
                segment_length: 1000.0,
                zone_start: 5.0,
                zone_end: 8.0,
            },
            ..instant_config()
        };
        let mut ride = Ride::new(&config, RoundSequence::default(), collaborators(&log, true));
        ride.begin();
        ride.request_start();
        tick_until(&mut ride, |r| r.traffic_phase() == TrafficPhase::WaitingForBrake);
        tick_until(&mut ride, |r| r.traffic_phase() == TrafficPhase::None);

        assert_eq!((ride.stats().successes, ride.stats().failures), (0, 1));
        assert_eq!(ride.lights()[0].current_state(), LightState::Green);
        assert!(ride.vehicle().is_moving());
    }

    #[test]
    fn test_without_view_the_round_stalls_at_dialogue() {
        let log: CallLog = Rc::default();
        let sequence = RoundSequence {
            dialogues: vec![passenger()],
        };
        let mut ride = Ride::new(&instant_config(), sequence, collaborators(&log, false));
        ride.begin();
        ride.request_start();
        tick_until(&mut ride, |r| r.state() == RoundState::WaitingForStartAfterEntry);
        ride.request_start();
        for _ in 0..300 {
            ride.tick(DT);
        }
        assert_eq!(ride.state(), RoundState::RunningDialogueNodes);
        assert!(!ride.select_answer(0));
        assert_eq!(ride.summary().clues_total, 0);
    }

    #[test]
    fn test_red_light_while_slowing_for_pickup() {
        let log: CallLog = Rc::default();
        let mut ride = quiet_ride(&red_light_config(0.5, 0.5), &log);
        ride.begin();
        ride.request_start();

        tick_until(&mut ride, |r| r.traffic_phase() == TrafficPhase::WaitingForBrake);
        assert_eq!(ride.state(), RoundState::WaitingStoppedAtPickup);

        wait_out_the_light(&mut ride);
        // The pickup stop still stands after the light.
        assert!(!ride.vehicle().is_moving());
        ride.tick(DT);
        assert_eq!(ride.state(), RoundState::WaitingForStartAfterEntry);

        drive_to_results(&mut ride);
        assert_eq!((ride.stats().successes, ride.stats().failures), (1, 0));
    }

    #[test]
    fn test_red_light_while_prompting_for_dropoff() {
        let log: CallLog = Rc::default();
        let mut ride = quiet_ride(&red_light_config(24.0, 0.0), &log);
        ride.begin();
        ride.request_start();
        tick_until(&mut ride, |r| r.state() == RoundState::WaitingForStartAfterEntry);
        ride.request_start();
        tick_until(&mut ride, |r| r.state() == RoundState::PromptStopForDropoff);
        assert!(ride.vehicle().position() < 5.0);

        tick_until(&mut ride, |r| r.traffic_phase() == TrafficPhase::WaitingForBrake);
        assert_eq!(ride.state(), RoundState::PromptStopForDropoff);

        log.borrow_mut().clear();
        wait_out_the_light(&mut ride);
        assert!(ride.vehicle().is_moving());
        let last_prompt = log
            .borrow()
            .iter()
            .rev()
            .find(|c| c.starts_with("prompt."))
            .cloned();
        assert_eq!(last_prompt.as_deref(), Some("prompt.show_break"));

        ride.request_stop();
        assert_eq!(ride.state(), RoundState::WaitingStopForDropoff);
        tick_until(&mut ride, Ride::is_finished);
        assert_eq!(ride.state(), RoundState::TransitionToResults);
    }

    #[test]
    fn test_red_light_while_pulling_over_for_dropoff() {
        let log: CallLog = Rc::default();
        let mut ride = quiet_ride(&red_light_config(0.5, 0.0), &log);
        ride.begin();
        ride.request_start();
        tick_until(&mut ride, |r| r.state() == RoundState::WaitingForStartAfterEntry);
        ride.request_start();
        tick_until(&mut ride, |r| r.vehicle().position() >= 3.0);
        assert_eq!(ride.state(), RoundState::PromptStopForDropoff);

        // Too slow to stop before the zone.
        ride.request_stop();
        tick_until(&mut ride, |r| r.traffic_phase() == TrafficPhase::WaitingForBrake);
        assert_eq!(ride.state(), RoundState::WaitingStopForDropoff);

        wait_out_the_light(&mut ride);
        assert!(!ride.vehicle().is_moving());
        tick_until(&mut ride, Ride::is_finished);
        assert_eq!(ride.state(), RoundState::TransitionToResults);
        assert!(log.borrow().iter().any(|c| c == "screen.results:Results"));
    }
}
