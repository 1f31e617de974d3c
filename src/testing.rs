//! Recording fakes for the collaborator traits, shared by the sequencer tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::{ActorFacade, PromptUi, RideContext, ScreenFlow, SoundCues, StatsSink, Vehicle};
use crate::dialogue::{CharacterDialogue, DialogueAnswer, DialoguePresentation, DialogueView};
use crate::traffic::{LightTimings, TrafficLight};

pub type CallLog = Rc<RefCell<Vec<String>>>;

fn push(log: &CallLog, entry: impl Into<String>) {
    log.borrow_mut().push(entry.into());
}

/// Stops the moment it is told to; tests flip `moving` directly when they
/// want a slow stop.
pub struct FakeVehicle {
    pub log: CallLog,
    pub moving: bool,
    pub stops_instantly: bool,
}

impl Vehicle for FakeVehicle {
    fn start_move(&mut self) {
        push(&self.log, "vehicle.start");
        self.moving = true;
    }
    fn stop_move_smooth(&mut self) {
        push(&self.log, "vehicle.stop");
        if self.stops_instantly {
            self.moving = false;
        }
    }
    fn is_moving(&self) -> bool {
        self.moving
    }
}

pub struct FakeActor(pub CallLog);

impl ActorFacade for FakeActor {
    fn set_character(&mut self, character_id: &str) {
        push(&self.0, format!("actor.set:{character_id}"));
    }
    fn enter(&mut self) {
        push(&self.0, "actor.enter");
    }
    fn exit(&mut self) {
        push(&self.0, "actor.exit");
    }
}

pub struct FakePrompts(pub CallLog);

impl PromptUi for FakePrompts {
    fn show_forward(&mut self) {
        push(&self.0, "prompt.show_forward");
    }
    fn hide_forward(&mut self) {
        push(&self.0, "prompt.hide_forward");
    }
    fn show_break(&mut self) {
        push(&self.0, "prompt.show_break");
    }
    fn show_break_with_timer(&mut self, seconds: f32, _auto_hide: bool) {
        push(&self.0, format!("prompt.show_break_timer:{seconds}"));
    }
    fn hide_break(&mut self) {
        push(&self.0, "prompt.hide_break");
    }
    fn resolve_break(&mut self, hide: bool) {
        push(&self.0, format!("prompt.resolve_break:{hide}"));
    }
}

pub struct FakeSounds(pub CallLog);

impl SoundCues for FakeSounds {
    fn door_open(&mut self) {
        push(&self.0, "sound.door_open");
    }
    fn door_close(&mut self) {
        push(&self.0, "sound.door_close");
    }
    fn engine_start(&mut self) {
        push(&self.0, "sound.engine_start");
    }
    fn engine_stop(&mut self) {
        push(&self.0, "sound.engine_stop");
    }
}

/// Ends a session as soon as `finish` is called.
pub struct FakePresenter {
    pub log: CallLog,
    pub started: Vec<String>,
    pub ended: bool,
}

impl FakePresenter {
    pub fn finish(&mut self) {
        self.ended = true;
    }
}

impl DialoguePresentation for FakePresenter {
    fn start_dialogue(&mut self, dialogue: &CharacterDialogue) {
        push(&self.log, format!("dialogue.start:{}", dialogue.character_id));
        self.started.push(dialogue.character_id.clone());
        self.ended = false;
    }
    fn take_ended(&mut self) -> bool {
        std::mem::take(&mut self.ended)
    }
}

#[derive(Default)]
pub struct FakeStats {
    pub successes: u32,
    pub failures: u32,
}

impl StatsSink for FakeStats {
    fn record_success(&mut self) {
        self.successes += 1;
    }
    fn record_failure(&mut self) {
        self.failures += 1;
    }
}

pub struct FakeScreens(pub CallLog);

impl ScreenFlow for FakeScreens {
    fn load_results(&mut self, scene: &str) {
        push(&self.0, format!("screen.results:{scene}"));
    }
}

pub struct FakeView(pub CallLog);

impl DialogueView for FakeView {
    fn show_text(&mut self, text: &str) {
        push(&self.0, format!("view.text:{text}"));
    }
    fn hide_text(&mut self) {
        push(&self.0, "view.hide_text");
    }
    fn show_answers(&mut self, answers: &[DialogueAnswer]) {
        push(&self.0, format!("view.answers:{}", answers.len()));
    }
    fn hide_answers(&mut self) {
        push(&self.0, "view.hide_answers");
    }
}

/// A full set of fakes plus one light.
pub struct Rig {
    pub log: CallLog,
    pub vehicle: FakeVehicle,
    pub actor: FakeActor,
    pub prompts: FakePrompts,
    pub sounds: FakeSounds,
    pub presenter: FakePresenter,
    pub has_presenter: bool,
    pub stats: FakeStats,
    pub screens: FakeScreens,
    pub lights: Vec<TrafficLight>,
}

impl Rig {
    pub fn new() -> Self {
        let log: CallLog = Rc::default();
        Self {
            vehicle: FakeVehicle {
                log: log.clone(),
                moving: false,
                stops_instantly: true,
            },
            actor: FakeActor(log.clone()),
            prompts: FakePrompts(log.clone()),
            sounds: FakeSounds(log.clone()),
            presenter: FakePresenter {
                log: log.clone(),
                started: Vec::new(),
                ended: false,
            },
            has_presenter: true,
            stats: FakeStats::default(),
            screens: FakeScreens(log.clone()),
            lights: vec![TrafficLight::new("test", LightTimings::default())],
            log,
        }
    }

    pub fn ctx(&mut self) -> RideContext<'_> {
        RideContext {
            vehicle: &mut self.vehicle,
            actor: &mut self.actor,
            prompts: &mut self.prompts,
            sounds: &mut self.sounds,
            presenter: if self.has_presenter {
                Some(&mut self.presenter as &mut dyn DialoguePresentation)
            } else {
                None
            },
            stats: &mut self.stats,
            screens: &mut self.screens,
            lights: &mut self.lights,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn called(&self, entry: &str) -> bool {
        self.log.borrow().iter().any(|c| c == entry)
    }
}
