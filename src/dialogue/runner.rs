use std::collections::{HashMap, VecDeque};

use log::{debug, warn};

use crate::dialogue::content::{non_blank, CharacterDialogue, DialogueActionType, DialogueAnswer, DialogueNode};

/// Something the runner wants the presentation layer to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogueEvent {
    Action(DialogueActionType, f32),
    Node(DialogueNode),
    Answers(Vec<DialogueAnswer>),
    End,
}

/// Walks a `CharacterDialogue` node by node.
///
/// The runner never advances on its own: every move happens through
/// `start` or `go_to`, and each call queues the resulting events for the
/// caller to drain in order. Content mistakes (no nodes, unknown target)
/// end the dialogue instead of failing.
#[derive(Debug, Default)]
pub struct DialogueRunner {
    by_id: HashMap<String, DialogueNode>,
    current: Option<DialogueNode>,
    events: VecDeque<DialogueEvent>,
}

impl DialogueRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&DialogueNode> {
        self.current.as_ref()
    }

    pub fn start(&mut self, dialogue: &CharacterDialogue, start_id: Option<&str>) {
        self.by_id.clear();
        self.current = None;

        let Some(first) = dialogue.nodes.first() else {
            warn!(
                "Dialogue '{}' has no nodes, ending immediately",
                dialogue.character_id
            );
            self.events.push_back(DialogueEvent::End);
            return;
        };

        // Duplicate ids are an authoring bug; the later node wins.
        for node in &dialogue.nodes {
            if let Some(id) = non_blank(Some(&node.id)) {
                self.by_id.insert(id.to_string(), node.clone());
            }
        }

        let start = non_blank(start_id)
            .and_then(|id| self.by_id.get(id))
            .cloned()
            .unwrap_or_else(|| first.clone());

        debug!(
            "Dialogue '{}' starting at node '{}' ({} nodes indexed)",
            dialogue.character_id,
            start.id,
            self.by_id.len()
        );
        self.go_to_node(start);
    }

    /// Follow `target_id`. Blank or unknown targets end the dialogue and
    /// leave `current` where it was.
    pub fn go_to(&mut self, target_id: Option<&str>) {
        let node = non_blank(target_id).and_then(|id| self.by_id.get(id)).cloned();
        match node {
            Some(node) => self.go_to_node(node),
            None => {
                debug!("Dialogue ends at target {target_id:?}");
                self.events.push_back(DialogueEvent::End);
            }
        }
    }

    pub fn next_event(&mut self) -> Option<DialogueEvent> {
        self.events.pop_front()
    }

    pub fn drain_events(&mut self) -> Vec<DialogueEvent> {
        self.events.drain(..).collect()
    }

    fn go_to_node(&mut self, node: DialogueNode) {
        if node.action_type != DialogueActionType::None {
            self.events
                .push_back(DialogueEvent::Action(node.action_type, node.action_value));
        }
        self.events.push_back(DialogueEvent::Node(node.clone()));
        if node.has_answers() {
            self.events
                .push_back(DialogueEvent::Answers(node.answers.clone()));
        }
        self.current = Some(node);
    }
}
