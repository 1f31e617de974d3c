use crate::dialogue::markup;

/// Clue ids the player clicked, and the ones they let scroll past.
#[derive(Debug, Clone, Default)]
pub struct ClueCollector {
    collected: Vec<String>,
    missed: Vec<String>,
}

impl ClueCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the clue was already collected.
    pub fn collect(&mut self, id: &str) -> bool {
        if self.collected.iter().any(|c| c == id) {
            return false;
        }
        self.missed.retain(|m| m != id);
        self.collected.push(id.to_string());
        true
    }

    pub fn add_missed<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            let id = id.into();
            if !self.collected.contains(&id) && !self.missed.contains(&id) {
                self.missed.push(id);
            }
        }
    }

    /// Every link still live in `text` is a clue the player let go.
    pub fn missed_from(&mut self, text: &str) {
        self.add_missed(markup::extract_links(text).into_iter().map(|l| l.id));
    }

    pub fn collected(&self) -> &[String] {
        &self.collected
    }

    pub fn missed(&self) -> &[String] {
        &self.missed
    }

    pub fn total(&self) -> usize {
        self.collected.len() + self.missed.len()
    }
}
