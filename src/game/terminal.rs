//! Plain stdout stand-ins for the screen, sound and passenger seat.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::context::{ActorFacade, PromptUi, ScreenFlow, SoundCues};
use crate::dialogue::{markup, DialogueActionType, DialogueAnswer, DialogueView};

/// Whose line is on screen. The actor writes it, the view reads it.
pub type Speaker = Rc<RefCell<String>>;

pub struct TerminalView {
    pub speaker: Speaker,
}

impl DialogueView for TerminalView {
    fn show_text(&mut self, text: &str) {
        let speaker = self.speaker.borrow();
        println!("\n[{}]: {}", speaker, markup::strip_markup(text));
        let links: Vec<String> = markup::extract_links(text)
            .into_iter()
            .map(|l| l.id)
            .collect();
        if !links.is_empty() {
            println!("  (clues: {})", links.join(", "));
        }
    }

    fn hide_text(&mut self) {
        debug!("Text panel hidden");
    }

    fn show_answers(&mut self, answers: &[DialogueAnswer]) {
        for (i, answer) in answers.iter().enumerate() {
            println!("  {}) {}", i + 1, markup::strip_markup(&answer.text));
        }
    }

    fn hide_answers(&mut self) {
        debug!("Answers hidden");
    }

    fn play_action(&mut self, action: DialogueActionType, value: f32) {
        let cue = match action {
            DialogueActionType::None => return,
            DialogueActionType::TakePhone => "takes out a phone",
            DialogueActionType::HidePhone => "puts the phone away",
            DialogueActionType::LookAway => "looks out of the window",
            DialogueActionType::Smile => "smiles",
        };
        println!("  * {} {cue} *", self.speaker.borrow());
        debug!("Action {action:?} ({value})");
    }
}

pub struct TerminalActor {
    pub speaker: Speaker,
}

impl ActorFacade for TerminalActor {
    fn set_character(&mut self, character_id: &str) {
        *self.speaker.borrow_mut() = character_id.to_string();
    }

    fn enter(&mut self) {
        println!("  {} gets in.", self.speaker.borrow());
    }

    fn exit(&mut self) {
        println!("  {} gets out.", self.speaker.borrow());
    }
}

pub struct TerminalPrompts;

impl PromptUi for TerminalPrompts {
    fn show_forward(&mut self) {
        println!("\n  >> Type 'go' to drive.");
    }

    fn hide_forward(&mut self) {}

    fn show_break(&mut self) {
        println!("\n  >> Type 'stop' to pull over.");
    }

    fn show_break_with_timer(&mut self, seconds: f32, _auto_hide: bool) {
        println!("\n  !! RED LIGHT! Type 'stop' within {seconds:.0} seconds!");
    }

    fn hide_break(&mut self) {}

    fn resolve_break(&mut self, _hide: bool) {
        println!("  (braking...)");
    }
}

pub struct TerminalSounds;

impl SoundCues for TerminalSounds {
    fn door_open(&mut self) {
        println!("  ~ door opens ~");
    }

    fn door_close(&mut self) {
        println!("  ~ door closes ~");
    }

    fn engine_start(&mut self) {
        println!("  ~ engine hums ~");
    }

    fn engine_stop(&mut self) {
        debug!("Engine idle");
    }
}

pub struct TerminalScreens;

impl ScreenFlow for TerminalScreens {
    fn load_results(&mut self, scene: &str) {
        println!("\n  ... heading to the {scene} ...");
    }
}
