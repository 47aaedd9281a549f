//! Caller-side handle to a running session.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};

use super::messages::{PlaybackInfo, SessionCommand, SessionMessage, SessionSnapshot};
use crate::engine::{DataSourceKind, SurfaceHandle};
use crate::error::{Result, SessionError};
use crate::metrics::SessionMetrics;
use crate::resolver::TimeShift;
use crate::state::PlaybackState;

#[derive(Debug, Default)]
struct Identity {
    token: Option<String>,
    metrics_key: Option<String>,
    cdn: Option<String>,
    state: PlaybackState,
}

/// State readable without a round-trip to the session task.
#[derive(Debug)]
pub(crate) struct SharedSession {
    metrics: Arc<SessionMetrics>,
    identity: RwLock<Identity>,
}

impl SharedSession {
    pub(crate) fn new(metrics: Arc<SessionMetrics>) -> Self {
        Self {
            metrics,
            identity: RwLock::new(Identity::default()),
        }
    }

    pub(crate) fn metrics(&self) -> &Arc<SessionMetrics> {
        &self.metrics
    }

    pub(crate) fn set_identity(&self, token: Option<String>, metrics_key: Option<String>) {
        let mut identity = self.identity.write();
        identity.token = token;
        identity.metrics_key = metrics_key;
    }

    pub(crate) fn set_cdn(&self, cdn: Option<String>) {
        self.identity.write().cdn = cdn;
    }

    pub(crate) fn set_state(&self, state: PlaybackState) {
        self.identity.write().state = state;
    }
}

struct HandleInner {
    sender: mpsc::UnboundedSender<SessionMessage>,
    shared: Arc<SharedSession>,
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        let _ = self.sender.send(SessionMessage::Shutdown);
    }
}

/// Cloneable handle to a session.
///
/// Commands are queued and never block; their effects are observed through
/// the session listener or [`snapshot`](Self::snapshot). The session shuts
/// down when the last clone is dropped.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<HandleInner>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("state", &self.current_state())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl SessionHandle {
    pub(crate) fn new(
        sender: mpsc::UnboundedSender<SessionMessage>,
        shared: Arc<SharedSession>,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner { sender, shared }),
        }
    }

    fn send(&self, message: SessionMessage) -> Result<()> {
        self.inner
            .sender
            .send(message)
            .map_err(|_| SessionError::SessionClosed)
    }

    fn command(&self, command: SessionCommand) -> Result<()> {
        self.send(SessionMessage::Command(command))
    }

    pub fn is_closed(&self) -> bool {
        self.inner.sender.is_closed()
    }

    /// Resolve `token` and play the live stream.
    pub fn open_token(&self, token: impl Into<String>) -> Result<()> {
        self.command(SessionCommand::OpenToken {
            token: token.into(),
            kind: None,
        })
    }

    /// Like [`open_token`](Self::open_token) with an explicit root data
    /// source kind.
    pub fn open_token_with_kind(&self, token: impl Into<String>, kind: DataSourceKind) -> Result<()> {
        self.command(SessionCommand::OpenToken {
            token: token.into(),
            kind: Some(kind),
        })
    }

    /// Play a known location without resolution.
    pub fn open_location(&self, url: impl Into<String>) -> Result<()> {
        self.command(SessionCommand::OpenLocation { url: url.into() })
    }

    pub fn start(&self) -> Result<()> {
        self.command(SessionCommand::Start)
    }

    pub fn pause(&self) -> Result<()> {
        self.command(SessionCommand::Pause)
    }

    pub fn seek_to(&self, position_ms: i64) -> Result<()> {
        self.command(SessionCommand::SeekTo(position_ms))
    }

    pub fn stop(&self) -> Result<()> {
        self.command(SessionCommand::Stop)
    }

    /// Tear down the engine and drop any lookup still in flight.
    pub fn release(&self) -> Result<()> {
        self.command(SessionCommand::Release)
    }

    pub fn suspend(&self) -> Result<()> {
        self.command(SessionCommand::Suspend)
    }

    pub fn resume(&self) -> Result<()> {
        self.command(SessionCommand::Resume)
    }

    /// Time-shifted playback of the opened token. Ignored for sessions
    /// opened with a direct location.
    pub fn switch_to_back_play(&self, shift: TimeShift) -> Result<()> {
        self.command(SessionCommand::SwitchToBackPlay(shift))
    }

    pub fn switch_to_live(&self) -> Result<()> {
        self.command(SessionCommand::SwitchToLive)
    }

    pub fn surface_created(&self, surface: SurfaceHandle) -> Result<()> {
        self.command(SessionCommand::SurfaceCreated(surface))
    }

    pub fn surface_changed(&self, surface: SurfaceHandle, width: u32, height: u32) -> Result<()> {
        self.command(SessionCommand::SurfaceChanged {
            surface,
            width,
            height,
        })
    }

    pub fn surface_destroyed(&self) -> Result<()> {
        self.command(SessionCommand::SurfaceDestroyed)
    }

    pub fn set_speed_mode(&self, mode: i32) -> Result<()> {
        self.command(SessionCommand::SetSpeedMode(mode))
    }

    pub fn set_volume(&self, volume: i32) -> Result<()> {
        self.command(SessionCommand::SetVolume(volume))
    }

    /// Stop the session task. Later commands fail with
    /// [`SessionError::SessionClosed`].
    pub fn shutdown(&self) -> Result<()> {
        self.send(SessionMessage::Shutdown)
    }

    /// State after every previously sent command has been applied.
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::Snapshot(tx))?;
        rx.await.map_err(|_| SessionError::SessionClosed)
    }

    pub async fn playback_info(&self) -> Result<PlaybackInfo> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::PlaybackInfo(tx))?;
        rx.await.map_err(|_| SessionError::SessionClosed)
    }

    // Direct accessors, served from shared state.

    pub fn current_state(&self) -> PlaybackState {
        self.inner.shared.identity.read().state
    }

    pub fn token(&self) -> Option<String> {
        self.inner.shared.identity.read().token.clone()
    }

    /// CDN of the last successful resolution.
    pub fn cdn_name(&self) -> Option<String> {
        self.inner.shared.identity.read().cdn.clone()
    }

    pub fn error_code(&self) -> i32 {
        self.inner.shared.metrics.last_error_code()
    }

    pub fn all_buffering_count(&self) -> u32 {
        self.inner.shared.metrics.total_buffering_count()
    }

    /// Consumes the current window's episode count.
    pub fn buffering_count_per_minute(&self) -> u32 {
        self.inner.shared.metrics.sample_buffering_count()
    }

    /// Consumes the current window's buffering time.
    pub fn buffering_time_per_minute_secs(&self) -> u64 {
        self.inner.shared.metrics.sample_buffering_seconds()
    }

    /// Times the opened stream has been prepared in this process.
    pub fn stream_open_count(&self) -> u32 {
        let identity = self.inner.shared.identity.read();
        identity
            .metrics_key
            .as_deref()
            .map_or(0, |key| self.inner.shared.metrics.current_open_count(key))
    }

    /// Always `true`: every stream a session opens accepts pause.
    pub const fn can_pause(&self) -> bool {
        true
    }

    /// Always `true`: live and back-play streams both accept seeks.
    pub const fn can_seek_backward(&self) -> bool {
        true
    }

    /// Always `true`, as [`can_seek_backward`](Self::can_seek_backward).
    pub const fn can_seek_forward(&self) -> bool {
        true
    }
}
