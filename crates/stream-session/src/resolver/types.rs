use std::fmt;

use serde::{Deserialize, Serialize};

/// How the time-shift offset is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeShiftKind {
    /// Absolute stream timestamp.
    Absolute,
    /// Offset relative to the live edge.
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeShift {
    pub kind: TimeShiftKind,
    pub value: i64,
}

impl TimeShift {
    pub fn absolute(value: i64) -> Self {
        Self {
            kind: TimeShiftKind::Absolute,
            value,
        }
    }

    pub fn relative(value: i64) -> Self {
        Self {
            kind: TimeShiftKind::Relative,
            value,
        }
    }

    /// Query fragment spliced in front of the original query string,
    /// e.g. `?wsStreamTimeABS=1000&`.
    pub fn query_fragment(&self) -> String {
        let key = match self.kind {
            TimeShiftKind::Absolute => "wsStreamTimeABS",
            TimeShiftKind::Relative => "wsStreamTimeREL",
        };
        format!("?{key}={}&", self.value)
    }
}

/// Whether a session plays the live edge or a time-shifted variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "time_shift")]
pub enum PlaybackMode {
    #[default]
    Live,
    BackPlay(TimeShift),
}

impl PlaybackMode {
    pub fn is_back_play(&self) -> bool {
        matches!(self, Self::BackPlay(_))
    }

    pub fn time_shift(&self) -> Option<TimeShift> {
        match self {
            Self::Live => None,
            Self::BackPlay(shift) => Some(*shift),
        }
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => f.write_str("live"),
            Self::BackPlay(shift) => match shift.kind {
                TimeShiftKind::Absolute => write!(f, "back-play (abs {})", shift.value),
                TimeShiftKind::Relative => write!(f, "back-play (rel {})", shift.value),
            },
        }
    }
}

/// The `{cdn, link}` pair returned by the lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamLocation {
    pub cdn: String,
    pub link: String,
}

/// A lookup result together with the URL the engine should open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStream {
    pub location: StreamLocation,
    pub play_url: String,
    pub mode: PlaybackMode,
}

impl fmt::Display for ResolvedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} via {} ({})", self.play_url, self.location.cdn, self.mode)
    }
}
