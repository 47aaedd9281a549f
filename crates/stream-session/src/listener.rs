//! Callbacks a session delivers to its host.
//!
//! Every callback is optional; unset callbacks are skipped. Callbacks run on
//! the session task after the corresponding transition has been applied, so
//! they may freely issue new commands on the [`SessionHandle`].
//!
//! [`SessionHandle`]: crate::session::SessionHandle

use std::fmt;
use std::sync::Arc;

use crate::engine::{MEDIA_ERROR_NOT_VALID_FOR_PROGRESSIVE_PLAYBACK, VideoGeometry};
use crate::report::SessionReport;
use crate::state::PlaybackState;

type Notify = Arc<dyn Fn() + Send + Sync>;

/// User-facing notice for an engine error nobody handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorNotice {
    InvalidProgressivePlayback,
    Unknown,
}

impl ErrorNotice {
    pub fn from_framework_code(framework: i32) -> Self {
        if framework == MEDIA_ERROR_NOT_VALID_FOR_PROGRESSIVE_PLAYBACK {
            Self::InvalidProgressivePlayback
        } else {
            Self::Unknown
        }
    }
}

#[derive(Clone, Default)]
pub struct SessionListener {
    prepared: Option<Notify>,
    video_size_changed: Option<Arc<dyn Fn(VideoGeometry) + Send + Sync>>,
    completion: Option<Notify>,
    error: Option<Arc<dyn Fn(i32, i32) -> bool + Send + Sync>>,
    buffering_update: Option<Arc<dyn Fn(u32) + Send + Sync>>,
    info: Option<Arc<dyn Fn(i32, i32) + Send + Sync>>,
    seek_complete: Option<Notify>,
    state_changed: Option<Arc<dyn Fn(PlaybackState, PlaybackState) + Send + Sync>>,
    error_notice: Option<Arc<dyn Fn(ErrorNotice) + Send + Sync>>,
    report: Option<Arc<dyn Fn(&SessionReport) + Send + Sync>>,
}

impl SessionListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_prepared(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.prepared = Some(Arc::new(f));
        self
    }

    pub fn on_video_size_changed(
        mut self,
        f: impl Fn(VideoGeometry) + Send + Sync + 'static,
    ) -> Self {
        self.video_size_changed = Some(Arc::new(f));
        self
    }

    pub fn on_completion(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.completion = Some(Arc::new(f));
        self
    }

    /// Error callback; return `true` when the error has been handled.
    pub fn on_error(mut self, f: impl Fn(i32, i32) -> bool + Send + Sync + 'static) -> Self {
        self.error = Some(Arc::new(f));
        self
    }

    pub fn on_buffering_update(mut self, f: impl Fn(u32) + Send + Sync + 'static) -> Self {
        self.buffering_update = Some(Arc::new(f));
        self
    }

    pub fn on_info(mut self, f: impl Fn(i32, i32) + Send + Sync + 'static) -> Self {
        self.info = Some(Arc::new(f));
        self
    }

    pub fn on_seek_complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.seek_complete = Some(Arc::new(f));
        self
    }

    /// Called with `(old, new)` whenever the current state changes.
    pub fn on_state_changed(
        mut self,
        f: impl Fn(PlaybackState, PlaybackState) + Send + Sync + 'static,
    ) -> Self {
        self.state_changed = Some(Arc::new(f));
        self
    }

    pub fn on_error_notice(mut self, f: impl Fn(ErrorNotice) + Send + Sync + 'static) -> Self {
        self.error_notice = Some(Arc::new(f));
        self
    }

    pub fn on_report(mut self, f: impl Fn(&SessionReport) + Send + Sync + 'static) -> Self {
        self.report = Some(Arc::new(f));
        self
    }

    pub(crate) fn prepared(&self) {
        if let Some(f) = &self.prepared {
            f();
        }
    }

    pub(crate) fn video_size_changed(&self, geometry: VideoGeometry) {
        if let Some(f) = &self.video_size_changed {
            f(geometry);
        }
    }

    pub(crate) fn completion(&self) {
        if let Some(f) = &self.completion {
            f();
        }
    }

    /// Returns whether the host handled the error.
    pub(crate) fn error(&self, framework: i32, implementation: i32) -> bool {
        self.error
            .as_ref()
            .is_some_and(|f| f(framework, implementation))
    }

    pub(crate) fn buffering_update(&self, percent: u32) {
        if let Some(f) = &self.buffering_update {
            f(percent);
        }
    }

    pub(crate) fn info(&self, what: i32, extra: i32) {
        if let Some(f) = &self.info {
            f(what, extra);
        }
    }

    pub(crate) fn seek_complete(&self) {
        if let Some(f) = &self.seek_complete {
            f();
        }
    }

    pub(crate) fn state_changed(&self, old: PlaybackState, new: PlaybackState) {
        if let Some(f) = &self.state_changed {
            f(old, new);
        }
    }

    pub(crate) fn error_notice(&self, notice: ErrorNotice) {
        if let Some(f) = &self.error_notice {
            f(notice);
        }
    }

    pub(crate) fn report(&self, report: &SessionReport) {
        if let Some(f) = &self.report {
            f(report);
        }
    }
}

impl fmt::Debug for SessionListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionListener")
            .field("prepared", &self.prepared.is_some())
            .field("video_size_changed", &self.video_size_changed.is_some())
            .field("completion", &self.completion.is_some())
            .field("error", &self.error.is_some())
            .field("buffering_update", &self.buffering_update.is_some())
            .field("info", &self.info.is_some())
            .field("seek_complete", &self.seek_complete.is_some())
            .field("state_changed", &self.state_changed.is_some())
            .field("error_notice", &self.error_notice.is_some())
            .field("report", &self.report.is_some())
            .finish()
    }
}
