/// Run phase definitions for the coordinator state machine
///
/// ```text
/// Idle ──start──▶ Running ⇄ Paused
///                    │         │
///                    ▼         │ stop
///               Completing ◀───┘
///                    │
///                    ▼
///                  Idle
/// ```
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents where the coordinator is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// No run in progress
    #[default]
    Idle,

    /// Pages and items are being processed
    Running,

    /// Queue iteration is halted until resumed
    Paused,

    /// The run is finalizing: closing contexts, persisting, reporting
    Completing,
}

impl RunPhase {
    /// Returns true while a run exists (running or paused)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Returns true if the machine may move from `self` to `next`
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Paused)
                | (Self::Paused, Self::Running)
                | (Self::Running, Self::Completing)
                | (Self::Paused, Self::Completing)
                | (Self::Completing, Self::Idle)
        )
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completing => "completing",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "running" => Some(Self::Running),
            "paused" => Some(Self::Paused),
            "completing" => Some(Self::Completing),
            _ => None,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
