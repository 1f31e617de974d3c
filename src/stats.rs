use std::fmt;

use log::debug;

use crate::context::StatsSink;
use crate::dialogue::ClueCollector;

/// How the player handled the red lights this round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrafficStats {
    pub successes: u32,
    pub failures: u32,
}

impl TrafficStats {
    pub fn total(&self) -> u32 {
        self.successes + self.failures
    }
}

impl StatsSink for TrafficStats {
    fn record_success(&mut self) {
        self.successes += 1;
        debug!("Traffic stats: {}/{}", self.successes, self.total());
    }

    fn record_failure(&mut self) {
        self.failures += 1;
        debug!("Traffic stats: {}/{}", self.successes, self.total());
    }
}

/// Numbers shown once the results board is solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub clues_collected: usize,
    pub clues_total: usize,
    pub lights_obeyed: u32,
    pub lights_total: u32,
}

impl RoundSummary {
    pub fn new(clues: &ClueCollector, traffic: &TrafficStats) -> Self {
        Self {
            clues_collected: clues.collected().len(),
            clues_total: clues.total(),
            lights_obeyed: traffic.successes,
            lights_total: traffic.total(),
        }
    }
}

impl fmt::Display for RoundSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Clues collected: {}/{}", self.clues_collected, self.clues_total)?;
        write!(f, "  Traffic lights:  {}/{}", self.lights_obeyed, self.lights_total)
    }
}
