use serde::Deserialize;

/// Character animation cue attached to a dialogue node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum DialogueActionType {
    #[default]
    None,
    TakePhone,
    HidePhone,
    LookAway,
    Smile,
}

/// One selectable reply offered at a node.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DialogueAnswer {
    pub id: String,
    /// Node to jump to. `None` or blank ends the dialogue.
    pub target_id: Option<String>,
    pub text: String,
    /// Insert a randomized pause before following `target_id`.
    pub should_pause: bool,
}

/// A single unit of dialogue content.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DialogueNode {
    /// Unique within its dialogue (e.g. "greeting", "ask_job").
    pub id: String,
    /// Successor when the node has no answers. Ignored otherwise, the
    /// answers carry their own targets.
    pub target_id: Option<String>,
    pub action_type: DialogueActionType,
    pub action_value: f32,
    /// Display text. May embed `<link=ID>word</link>` clue markup.
    pub text: String,
    pub answers: Vec<DialogueAnswer>,
    pub should_pause: bool,
}

impl DialogueNode {
    pub fn has_answers(&self) -> bool {
        !self.answers.is_empty()
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Everything one passenger says during their ride.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CharacterDialogue {
    pub character_id: String,
    pub character_name: String,
    pub nodes: Vec<DialogueNode>,
}

/// Ordered passengers for one round, one dialogue per stop.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoundSequence {
    pub dialogues: Vec<CharacterDialogue>,
}

impl RoundSequence {
    pub fn len(&self) -> usize {
        self.dialogues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogues.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CharacterDialogue> {
        self.dialogues.get(index)
    }
}

/// Treats `None`, empty and whitespace-only ids as "no target".
pub fn non_blank(id: Option<&str>) -> Option<&str> {
    id.map(str::trim).filter(|s| !s.is_empty())
}
