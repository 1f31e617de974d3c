use rand::Rng;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// A single-shot timer advanced by the tick driver.
///
/// Every wait in the sequencers is one of these: arm it on entering a state,
/// feed it `dt` each tick, move on once it reports done.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }

    /// Advance by `dt` seconds. Returns `true` once the timer has run out.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining > 0.0 {
            self.remaining -= dt.max(0.0);
        }
        self.is_done()
    }

    pub fn is_done(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining.max(0.0)
    }
}

// ---------------------------------------------------------------------------
// Randomized delay range
// ---------------------------------------------------------------------------

/// A `[min, max]` range in seconds. Authored as a two-element JSON array.
///
/// The bounds are order-insensitive: `[5, 2]` samples the same way as `[2, 5]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f32; 2]")]
pub struct DelayRange {
    pub min: f32,
    pub max: f32,
}

impl DelayRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn fixed(seconds: f32) -> Self {
        Self::new(seconds, seconds)
    }

    /// Draw one delay uniformly from the range.
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        let lo = self.min.min(self.max);
        let hi = self.min.max(self.max);
        if hi <= lo {
            return lo;
        }
        rng.gen_range(lo..=hi)
    }
}

impl From<[f32; 2]> for DelayRange {
    fn from([min, max]: [f32; 2]) -> Self {
        Self::new(min, max)
    }
}
