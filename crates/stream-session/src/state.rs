use std::fmt;

use serde::{Deserialize, Serialize};

/// Playback state of a session.
///
/// A session tracks two of these: the current state, confirmed by the
/// engine, and the target state the caller asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackState {
    #[default]
    Idle,
    Preparing,
    Prepared,
    Playing,
    Paused,
    Completed,
    Error,
    /// Engine parked without a display target.
    Suspended,
    /// Resume requested while no surface is available.
    ResumePending,
    /// Engine released because it cannot be parked; resuming reopens.
    SuspendUnsupported,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Preparing => "PREPARING",
            Self::Prepared => "PREPARED",
            Self::Playing => "PLAYING",
            Self::Paused => "PAUSED",
            Self::Completed => "COMPLETED",
            Self::Error => "ERROR",
            Self::Suspended => "SUSPENDED",
            Self::ResumePending => "RESUME_PENDING",
            Self::SuspendUnsupported => "SUSPEND_UNSUPPORTED",
        }
    }

    /// Terminal for the current engine instance; only stop/release apply.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// States in which the engine accepts transport commands directly.
    ///
    /// The caller must also check that an engine instance exists.
    pub fn accepts_commands(&self) -> bool {
        !matches!(self, Self::Idle | Self::Preparing | Self::Error)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
