//! The after-round puzzle: drop words collected during the ride into the
//! right slots.

use std::collections::HashSet;

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::dialogue::markup;
use crate::dialogue::RoundSequence;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum WordKind {
    Name,
    Profession,
    Action,
    #[default]
    Subject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WordEntry {
    pub id: String,
    pub title: String,
    pub kind: WordKind,
}

/// Board layout and answer key, authored next to the round content.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResultsContent {
    pub words: Vec<WordEntry>,
    /// Expected word (id or title) per profession slot.
    pub profession_answers: Vec<String>,
    /// Expected word (id or title) per text slot.
    pub text_answers: Vec<String>,
}

// ---------------------------------------------------------------------------
// Word extraction and the word bank
// ---------------------------------------------------------------------------

/// Collect every clue link in the round as a `Subject` word, first
/// occurrence per id. Hand-authored `existing` words survive unless a link
/// with the same id replaced them.
pub fn extract_words(sequence: &RoundSequence, existing: &[WordEntry]) -> Vec<WordEntry> {
    let mut seen = HashSet::new();
    let mut words = Vec::new();

    let links = sequence
        .dialogues
        .iter()
        .flat_map(|d| d.nodes.iter())
        .flat_map(|n| markup::extract_links(&n.text));
    for link in links {
        if seen.insert(link.id.clone()) {
            words.push(WordEntry {
                id: link.id,
                title: markup::strip_markup(&link.inner),
                kind: WordKind::Subject,
            });
        }
    }

    let extracted = seen.len();
    words.extend(existing.iter().filter(|w| !seen.contains(&w.id)).cloned());
    info!(
        "Extracted {extracted} words from dialogues, {} in total",
        words.len()
    );
    words
}

/// The shuffled pile of words the player drags from.
#[derive(Debug, Clone, Default)]
pub struct WordBank {
    words: Vec<WordEntry>,
}

impl WordBank {
    /// Duplicate ids keep their first entry.
    pub fn build(words: &[WordEntry], rng: &mut impl Rng) -> Self {
        let mut seen = HashSet::new();
        let mut words: Vec<WordEntry> = words
            .iter()
            .filter(|w| seen.insert(w.id.as_str()))
            .cloned()
            .collect();
        words.shuffle(rng);
        Self { words }
    }

    pub fn words(&self) -> &[WordEntry] {
        &self.words
    }

    pub fn find(&self, key: &str) -> Option<&WordEntry> {
        self.words
            .iter()
            .find(|w| w.id == key || w.title.eq_ignore_ascii_case(key))
    }
}

// ---------------------------------------------------------------------------
// Results board
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotGroup {
    Profession,
    Text,
}

pub struct ResultsBoard {
    professions: Vec<Option<WordEntry>>,
    texts: Vec<Option<WordEntry>>,
    profession_answers: Vec<String>,
    text_answers: Vec<String>,
}

impl ResultsBoard {
    pub fn new(content: &ResultsContent) -> Self {
        Self {
            professions: vec![None; content.profession_answers.len()],
            texts: vec![None; content.text_answers.len()],
            profession_answers: content.profession_answers.clone(),
            text_answers: content.text_answers.clone(),
        }
    }

    pub fn slot_count(&self, group: SlotGroup) -> usize {
        self.slots(group).len()
    }

    pub fn slot(&self, group: SlotGroup, index: usize) -> Option<&WordEntry> {
        self.slots(group).get(index)?.as_ref()
    }

    /// Drop `word` into a slot, replacing whatever was there. Returns
    /// `false` for a slot that does not exist.
    pub fn place(&mut self, group: SlotGroup, index: usize, word: WordEntry) -> bool {
        match self.slots_mut(group).get_mut(index) {
            Some(slot) => {
                debug!("{group:?} slot {index} <- '{}'", word.title);
                *slot = Some(word);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self, group: SlotGroup, index: usize) {
        if let Some(slot) = self.slots_mut(group).get_mut(index) {
            *slot = None;
        }
    }

    pub fn clear_all(&mut self) {
        self.professions.iter_mut().for_each(|s| *s = None);
        self.texts.iter_mut().for_each(|s| *s = None);
    }

    /// A board with no slots is never complete.
    pub fn is_complete(&self) -> bool {
        if self.professions.is_empty() && self.texts.is_empty() {
            return false;
        }
        self.professions.iter().chain(&self.texts).all(Option::is_some)
    }

    pub fn correctness(&self, group: SlotGroup) -> Vec<bool> {
        let answers = match group {
            SlotGroup::Profession => &self.profession_answers,
            SlotGroup::Text => &self.text_answers,
        };
        self.slots(group)
            .iter()
            .enumerate()
            .map(|(i, slot)| is_slot_correct(slot.as_ref(), answers.get(i).map(String::as_str)))
            .collect()
    }

    pub fn check_all(&self) -> bool {
        [SlotGroup::Profession, SlotGroup::Text]
            .into_iter()
            .all(|g| self.correctness(g).into_iter().all(|ok| ok))
    }

    fn slots(&self, group: SlotGroup) -> &[Option<WordEntry>] {
        match group {
            SlotGroup::Profession => &self.professions,
            SlotGroup::Text => &self.texts,
        }
    }

    fn slots_mut(&mut self, group: SlotGroup) -> &mut [Option<WordEntry>] {
        match group {
            SlotGroup::Profession => &mut self.professions,
            SlotGroup::Text => &mut self.texts,
        }
    }
}

/// A slot without an expected answer accepts anything, even nothing.
fn is_slot_correct(word: Option<&WordEntry>, expected: Option<&str>) -> bool {
    let Some(expected) = expected.filter(|e| !e.is_empty()) else {
        return true;
    };
    word.is_some_and(|w| w.id == expected || w.title == expected)
}
