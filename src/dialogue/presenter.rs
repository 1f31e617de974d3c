use log::{debug, info, warn};
use rand::rngs::StdRng;
use serde::Deserialize;

use crate::dialogue::clues::ClueCollector;
use crate::dialogue::content::{CharacterDialogue, DialogueActionType, DialogueAnswer, DialogueNode};
use crate::dialogue::markup::{self, LINK_ACTIVATED_STYLE, LINK_STYLE};
use crate::dialogue::runner::{DialogueEvent, DialogueRunner};
use crate::timer::{Countdown, DelayRange};

/// Upper bound on node hops inside a single call. Only reachable when
/// content loops through nodes that neither show text nor pause.
const MAX_IMMEDIATE_HOPS: usize = 1024;

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// What the round needs from whoever shows dialogue.
pub trait DialoguePresentation {
    fn start_dialogue(&mut self, dialogue: &CharacterDialogue);
    /// Consume the `DialogueEnded` signal. Returns `true` once per ended
    /// session.
    fn take_ended(&mut self) -> bool;
}

/// Screen side of the presenter: text panel, answer buttons, character cues.
pub trait DialogueView {
    fn show_text(&mut self, text: &str);
    fn hide_text(&mut self);
    fn show_answers(&mut self, answers: &[DialogueAnswer]);
    fn hide_answers(&mut self);

    fn hide_all(&mut self) {
        self.hide_text();
        self.hide_answers();
    }

    fn fade_out_text(&mut self, _duration: f32) {}

    fn play_action(&mut self, _action: DialogueActionType, _value: f32) {}
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PresenterConfig {
    /// Seconds the text panel takes to fade after a text-only node.
    pub text_hide_duration: f32,
    /// Randomized pause for nodes and answers flagged `should_pause`.
    pub pause: DelayRange,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            text_hide_duration: 0.6,
            pause: DelayRange::new(0.3, 0.8),
        }
    }
}

impl PresenterConfig {
    fn clamped_pause(&self) -> DelayRange {
        let min = self.pause.min.max(0.0);
        DelayRange::new(min, self.pause.max.max(min))
    }
}

// ---------------------------------------------------------------------------
// Presenter
// ---------------------------------------------------------------------------

/// The one timer a session can have in flight.
#[derive(Debug)]
enum Pending {
    Fade {
        timer: Countdown,
        target: Option<String>,
        pause: bool,
    },
    Pause {
        timer: Countdown,
        target: Option<String>,
    },
}

/// Drives a `DialogueRunner` for one passenger at a time.
///
/// Text-only nodes fade out and then follow their `target_id`, optionally
/// after a random pause; nodes with answers wait for `select_answer`.
/// Starting a new session cancels whatever timer the previous one had.
pub struct DialoguePresenter {
    view: Box<dyn DialogueView>,
    config: PresenterConfig,
    rng: StdRng,
    runner: Option<DialogueRunner>,
    running: bool,
    answers_open: bool,
    pending: Option<Pending>,
    ended: bool,
    displayed_text: Option<String>,
    clues: ClueCollector,
}

impl DialoguePresenter {
    pub fn new(view: Box<dyn DialogueView>, config: PresenterConfig, rng: StdRng) -> Self {
        Self {
            view,
            config,
            rng,
            runner: None,
            running: false,
            answers_open: false,
            pending: None,
            ended: false,
            displayed_text: None,
            clues: ClueCollector::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_node(&self) -> Option<&DialogueNode> {
        self.runner.as_ref().and_then(DialogueRunner::current)
    }

    /// Answers the player can pick right now, empty if none are shown.
    /// Once one is picked the rest are gone, even while a pause holds the
    /// node on screen.
    pub fn current_answers(&self) -> &[DialogueAnswer] {
        match self.current_node() {
            Some(node) if self.running && self.answers_open => node.answers.as_slice(),
            _ => &[],
        }
    }

    /// Styled text currently on screen, links included.
    pub fn displayed_text(&self) -> Option<&str> {
        self.displayed_text.as_deref()
    }

    pub fn clues(&self) -> &ClueCollector {
        &self.clues
    }

    pub fn start_dialogue_at(&mut self, dialogue: &CharacterDialogue, start_id: Option<&str>) {
        self.stop_dialogue();
        self.ended = false;

        info!(
            "Presenting dialogue for '{}' ({})",
            dialogue.character_id, dialogue.character_name
        );

        let mut runner = DialogueRunner::new();
        runner.start(dialogue, start_id);
        self.runner = Some(runner);
        self.running = true;
        self.pump();
    }

    pub fn stop_dialogue(&mut self) {
        self.running = false;
        self.answers_open = false;
        self.pending = None;
        self.retire_text();
        self.view.hide_all();
        if let Some(mut runner) = self.runner.take() {
            let dropped = runner.drain_events();
            if !dropped.is_empty() {
                debug!("Dropped {} queued dialogue event(s)", dropped.len());
            }
        }
    }

    /// Pick answer `index` of the current node. Returns `false` when there
    /// is no such answer on screen.
    pub fn select_answer(&mut self, index: usize) -> bool {
        let Some(answer) = self.current_answers().get(index).cloned() else {
            warn!("No answer #{index} on screen, ignoring");
            return false;
        };

        debug!("Answer '{}' -> {:?}", answer.id, answer.target_id);
        self.answers_open = false;
        self.pending = None;
        self.retire_text();
        self.view.hide_all();

        if answer.should_pause {
            self.pause_then_go_to(answer.target_id, false);
        } else {
            self.follow(answer.target_id.as_deref());
        }
        self.pump();
        true
    }

    /// Collect the clue behind link `id` in the text on screen. Returns
    /// `false` if no such live link is displayed.
    pub fn click_link(&mut self, id: &str) -> bool {
        let Some(text) = self.displayed_text.as_deref() else {
            return false;
        };
        if !markup::extract_links(text).iter().any(|l| l.id == id) {
            return false;
        }

        let disabled = markup::disable_link(text, id, LINK_ACTIVATED_STYLE);
        self.clues.collect(id);
        info!("Clue collected: {id}");
        self.view.show_text(&disabled);
        self.displayed_text = Some(disabled);
        true
    }

    pub fn tick(&mut self, dt: f32) {
        let done = match self.pending.as_mut() {
            Some(Pending::Fade { timer, .. }) | Some(Pending::Pause { timer, .. }) => timer.tick(dt),
            None => return,
        };
        if !done {
            return;
        }

        match self.pending.take() {
            Some(Pending::Fade { target, pause, .. }) => {
                self.view.hide_text();
                self.pause_then_go_to(target, !pause);
            }
            Some(Pending::Pause { target, .. }) => self.follow(target.as_deref()),
            None => {}
        }
        self.pump();
    }

    fn follow(&mut self, target: Option<&str>) {
        if let Some(runner) = self.runner.as_mut() {
            runner.go_to(target);
        }
    }

    fn pause_then_go_to(&mut self, target: Option<String>, skip_pause: bool) {
        self.pending = None;
        if skip_pause {
            self.follow(target.as_deref());
            return;
        }
        let seconds = self.config.clamped_pause().sample(&mut self.rng);
        debug!("Pausing {seconds:.2}s before {target:?}");
        self.pending = Some(Pending::Pause {
            timer: Countdown::new(seconds),
            target,
        });
    }

    /// Handle queued runner events until the runner goes quiet.
    fn pump(&mut self) {
        let mut hops = 0;
        while let Some(event) = self.runner.as_mut().and_then(DialogueRunner::next_event) {
            match event {
                DialogueEvent::Action(action, value) => self.view.play_action(action, value),
                DialogueEvent::Node(node) => {
                    if !self.running {
                        continue;
                    }
                    hops += 1;
                    if hops > MAX_IMMEDIATE_HOPS {
                        warn!("Dialogue keeps jumping without pausing at '{}', ending it", node.id);
                        self.end();
                        return;
                    }
                    self.pending = None;
                    self.render(&node);
                }
                DialogueEvent::Answers(_) => {}
                DialogueEvent::End => self.end(),
            }
        }
    }

    fn end(&mut self) {
        info!("Dialogue ended");
        self.stop_dialogue();
        self.ended = true;
    }

    fn render(&mut self, node: &DialogueNode) {
        self.retire_text();
        debug!("Node '{}'", node.id);
        self.answers_open = node.has_answers();

        match (node.has_text(), node.has_answers()) {
            (false, true) => {
                self.view.hide_text();
                self.view.show_answers(&node.answers);
            }
            (true, true) => {
                self.show_text(&node.text);
                self.view.show_answers(&node.answers);
            }
            (true, false) => {
                self.show_text(&node.text);
                self.view.hide_answers();
                let duration = self.config.text_hide_duration;
                if duration <= 0.0 {
                    self.view.hide_text();
                    self.pause_then_go_to(node.target_id.clone(), !node.should_pause);
                    return;
                }
                self.view.fade_out_text(duration);
                self.pending = Some(Pending::Fade {
                    timer: Countdown::new(duration),
                    target: node.target_id.clone(),
                    pause: node.should_pause,
                });
            }
            (false, false) => {
                self.view.hide_all();
                self.pause_then_go_to(node.target_id.clone(), !node.should_pause);
            }
        }
    }

    fn show_text(&mut self, text: &str) {
        let styled = markup::apply_link_style(text, LINK_STYLE);
        self.view.show_text(&styled);
        self.displayed_text = Some(styled);
    }

    /// Links left unclicked on the outgoing text count as missed clues.
    fn retire_text(&mut self) {
        if let Some(text) = self.displayed_text.take() {
            self.clues.missed_from(&text);
        }
    }
}

impl DialoguePresentation for DialoguePresenter {
    fn start_dialogue(&mut self, dialogue: &CharacterDialogue) {
        self.start_dialogue_at(dialogue, None);
    }

    fn take_ended(&mut self) -> bool {
        std::mem::take(&mut self.ended)
    }
}
