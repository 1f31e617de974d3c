pub mod sequencer;
pub mod state;

pub use sequencer::{RoundConfig, RoundSequencer};
pub use state::{RoundState, StateObserver};
