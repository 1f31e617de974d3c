use crate::dialogue::DialoguePresentation;
use crate::traffic::TrafficLight;

// ---------------------------------------------------------------------------
// Collaborators the sequencers command
// ---------------------------------------------------------------------------

pub trait Vehicle {
    fn start_move(&mut self);
    fn stop_move_smooth(&mut self);
    fn is_moving(&self) -> bool;
}

/// The passenger seat: which character is shown and their door animations.
pub trait ActorFacade {
    fn set_character(&mut self, character_id: &str);
    fn enter(&mut self);
    fn exit(&mut self);
}

/// Quick-time prompts: "drive forward" and "brake".
pub trait PromptUi {
    fn show_forward(&mut self);
    fn hide_forward(&mut self);
    fn show_break(&mut self);
    /// Show the brake prompt with a draining timer bar. The sequencer that
    /// asked for it owns the countdown and reacts to its expiry.
    fn show_break_with_timer(&mut self, seconds: f32, auto_hide: bool);
    fn hide_break(&mut self);
    /// The player answered the prompt: stop the timer bar, optionally hide.
    fn resolve_break(&mut self, hide: bool);
}

pub trait SoundCues {
    fn door_open(&mut self);
    fn door_close(&mut self);
    fn engine_start(&mut self);
    fn engine_stop(&mut self);
}

/// Traffic-light outcome counter shown on the results screen.
pub trait StatsSink {
    fn record_success(&mut self);
    fn record_failure(&mut self);
}

pub trait ScreenFlow {
    fn load_results(&mut self, scene: &str);
}

// ---------------------------------------------------------------------------
// Per-tick context
// ---------------------------------------------------------------------------

/// Borrowed handles to everything the sequencers may touch during one tick.
///
/// The composition root builds a fresh one for every call, so sequencers
/// never hold on to their collaborators between frames.
pub struct RideContext<'a> {
    pub vehicle: &'a mut dyn Vehicle,
    pub actor: &'a mut dyn ActorFacade,
    pub prompts: &'a mut dyn PromptUi,
    pub sounds: &'a mut dyn SoundCues,
    pub presenter: Option<&'a mut dyn DialoguePresentation>,
    pub stats: &'a mut dyn StatsSink,
    pub screens: &'a mut dyn ScreenFlow,
    pub lights: &'a mut [TrafficLight],
}

/// Index of a light inside `RideContext::lights`.
pub type LightId = usize;
