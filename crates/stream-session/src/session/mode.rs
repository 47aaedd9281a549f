//! Live / back-play mode control and resolution generations.

use std::borrow::Cow;

use tracing::debug;

use crate::engine::DataSourceKind;
use crate::resolver::{PlaybackMode, TimeShift, encode_token};

/// What the session was opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    None,
    Token(String),
    Location { key: String },
}

/// Tracks the mode a session plays in and which resolution is current.
///
/// Every new resolution bumps the generation; replies tagged with an older
/// generation belong to a superseded request and are dropped.
#[derive(Debug)]
pub(crate) struct ModeController {
    source: Source,
    mode: PlaybackMode,
    root_kind: DataSourceKind,
    kind: DataSourceKind,
    generation: u64,
    in_flight: Option<u64>,
}

impl ModeController {
    pub(crate) fn new(root_kind: DataSourceKind) -> Self {
        Self {
            source: Source::None,
            mode: PlaybackMode::Live,
            root_kind,
            kind: root_kind,
            generation: 0,
            in_flight: None,
        }
    }

    /// Enter token mode for `token`, live, and start a new generation.
    pub(crate) fn open_token(&mut self, token: String, kind: DataSourceKind) -> u64 {
        self.source = Source::Token(token);
        self.mode = PlaybackMode::Live;
        self.root_kind = kind;
        self.kind = kind;
        self.begin_resolution()
    }

    /// Enter direct-location mode. Any resolution still in flight is
    /// superseded.
    pub(crate) fn open_location(&mut self, url: &str, kind: DataSourceKind) {
        self.source = Source::Location {
            key: encode_token(url).into_owned(),
        };
        self.mode = PlaybackMode::Live;
        self.root_kind = kind;
        self.kind = kind;
        self.generation += 1;
        self.in_flight = None;
    }

    /// Back-play with `shift`. Returns the new generation, or `None` outside
    /// token mode.
    pub(crate) fn switch_to_back_play(&mut self, shift: TimeShift) -> Option<u64> {
        if !self.is_token_mode() {
            return None;
        }
        self.mode = PlaybackMode::BackPlay(shift);
        self.kind = DataSourceKind::Vod;
        Some(self.begin_resolution())
    }

    /// Return to the live edge with the root data source kind.
    pub(crate) fn switch_to_live(&mut self) -> Option<u64> {
        if !self.is_token_mode() {
            return None;
        }
        self.mode = PlaybackMode::Live;
        self.kind = self.root_kind;
        Some(self.begin_resolution())
    }

    pub(crate) fn begin_resolution(&mut self) -> u64 {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        debug!(generation = self.generation, mode = %self.mode, "Resolution started");
        self.generation
    }

    /// Accept a reply for `generation`; `false` means it is stale.
    pub(crate) fn complete_resolution(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Forget the current generation so in-flight replies are dropped.
    pub(crate) fn invalidate(&mut self) {
        if self.in_flight.take().is_some() {
            self.generation += 1;
        }
    }

    pub(crate) fn is_resolving(&self) -> bool {
        self.in_flight.is_some()
    }

    pub(crate) fn is_token_mode(&self) -> bool {
        matches!(self.source, Source::Token(_))
    }

    pub(crate) fn token(&self) -> Option<&str> {
        match &self.source {
            Source::Token(token) => Some(token),
            _ => None,
        }
    }

    /// Identity used for open counts: the root token, or the encoded URL.
    pub(crate) fn metrics_key(&self) -> Option<Cow<'_, str>> {
        match &self.source {
            Source::None => None,
            Source::Token(token) => Some(Cow::Borrowed(token)),
            Source::Location { key } => Some(Cow::Borrowed(key)),
        }
    }

    pub(crate) fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub(crate) fn kind(&self) -> DataSourceKind {
        self.kind
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}
