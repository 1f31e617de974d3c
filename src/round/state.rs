use std::fmt;

/// Where the ride is. One pass over `RequestStopAtPickup ..=
/// BetweenDialoguesDelay` per passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundState {
    WaitingForEngineStart,
    WaitingInitialTripDelay,
    RequestStopAtPickup,
    WaitingStoppedAtPickup,
    DoorOpeningForEntry,
    PassengerEntering,
    DoorClosingAfterEntry,
    WaitingForStartAfterEntry,
    PauseBeforeNodes,
    RunningDialogueNodes,
    PromptStopForDropoff,
    WaitingStopForDropoff,
    DoorOpeningForExit,
    PassengerExiting,
    DoorClosingAfterExit,
    BetweenDialoguesDelay,
    FinishedDelay,
    TransitionToResults,
}

impl RoundState {
    /// States that only move on a player intent.
    pub fn awaits_player(self) -> bool {
        matches!(
            self,
            Self::WaitingForEngineStart | Self::WaitingForStartAfterEntry | Self::PromptStopForDropoff
        )
    }

    pub fn is_terminal(self) -> bool {
        self == Self::TransitionToResults
    }
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Told about every state change of the round, in order.
pub trait StateObserver {
    fn state_changed(&mut self, from: RoundState, to: RoundState);
}
