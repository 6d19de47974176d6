use serde::{Deserialize, Serialize};

/// Coarse scene state. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Playing,
    Dying,
    Finished,
}

/// Facts the scene sampled at the start of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSignals {
    pub player_alive: bool,
    pub particles_finished: bool,
}

impl Phase {
    /// Transition table.
    ///
    /// | from      | when                 | to         |
    /// |-----------|----------------------|------------|
    /// | `Playing` | player is dead       | `Dying`    |
    /// | `Dying`   | particles finished   | `Finished` |
    ///
    /// Every other pair stays put.
    pub fn next(self, signals: PhaseSignals) -> Phase {
        match self {
            Phase::Playing if !signals.player_alive => Phase::Dying,
            Phase::Dying if signals.particles_finished => Phase::Finished,
            other => other,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Finished
    }
}
