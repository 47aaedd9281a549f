//! The session task.
//!
//! One task per session owns the engine and every piece of mutable session
//! state. Commands, engine events, resolution replies and report ticks all
//! arrive on the same mailbox and are applied one at a time.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::handle::SharedSession;
use super::messages::{PlaybackInfo, SessionCommand, SessionMessage, SessionSnapshot};
use super::mode::ModeController;
use crate::capability::HardwareDecodeGate;
use crate::config::SessionConfig;
use crate::engine::{
    DataSourceKind, EngineEvent, EngineEventSink, EngineFactory, MEDIA_ERROR_UNSUPPORTED,
    MEDIA_INFO_BUFFERING_END, MEDIA_INFO_BUFFERING_START, MediaEngine, SurfaceHandle,
    VideoGeometry,
};
use crate::error::{EngineError, ResolveError, SessionError};
use crate::listener::{ErrorNotice, SessionListener};
use crate::metrics::SessionMetrics;
use crate::report::SessionReporter;
use crate::resolver::{ResolvedStream, StreamResolver};
use crate::state::PlaybackState;

struct ActiveEngine {
    id: u64,
    engine: Box<dyn MediaEngine>,
}

/// Collaborators a session task is built from.
pub(crate) struct SessionParts {
    pub config: Arc<SessionConfig>,
    pub resolver: Arc<dyn StreamResolver>,
    pub factory: Arc<dyn EngineFactory>,
    pub gate: Arc<HardwareDecodeGate>,
    pub shared: Arc<SharedSession>,
    pub listener: SessionListener,
}

pub(crate) struct SessionActor {
    config: Arc<SessionConfig>,
    resolver: Arc<dyn StreamResolver>,
    factory: Arc<dyn EngineFactory>,
    gate: Arc<HardwareDecodeGate>,
    metrics: Arc<SessionMetrics>,
    shared: Arc<SharedSession>,
    listener: SessionListener,
    mailbox: mpsc::UnboundedReceiver<SessionMessage>,
    sender: mpsc::UnboundedSender<SessionMessage>,
    reporter: SessionReporter,

    engine: Option<ActiveEngine>,
    next_engine_id: u64,
    current: PlaybackState,
    target: PlaybackState,
    mode: ModeController,
    /// Location the next engine open uses.
    pending_location: Option<String>,
    resolved: Option<ResolvedStream>,
    seek_pending: Option<i64>,
    /// Set by an explicit stop or release; surface events no longer reopen.
    stopped: bool,
    surface: Option<SurfaceHandle>,
    surface_size: (u32, u32),
    video: VideoGeometry,
    duration: i64,
    buffer_percentage: u32,
    hardware_decode: bool,
}

impl SessionActor {
    pub(crate) fn new(
        parts: SessionParts,
        mailbox: mpsc::UnboundedReceiver<SessionMessage>,
        sender: mpsc::UnboundedSender<SessionMessage>,
    ) -> Self {
        let reporter = SessionReporter::new(parts.config.report_interval(), sender.clone());
        let mode = ModeController::new(parts.config.data_source_kind);
        Self {
            metrics: parts.shared.metrics().clone(),
            config: parts.config,
            resolver: parts.resolver,
            factory: parts.factory,
            gate: parts.gate,
            shared: parts.shared,
            listener: parts.listener,
            mailbox,
            sender,
            reporter,
            engine: None,
            next_engine_id: 0,
            current: PlaybackState::Idle,
            target: PlaybackState::Idle,
            mode,
            pending_location: None,
            resolved: None,
            seek_pending: None,
            stopped: false,
            surface: None,
            surface_size: (0, 0),
            video: VideoGeometry::default(),
            duration: -1,
            buffer_percentage: 0,
            hardware_decode: false,
        }
    }

    /// Run until shut down or until every sender is gone.
    pub(crate) async fn run(mut self) {
        debug!("Session task starting");

        while let Some(msg) = self.mailbox.recv().await {
            if !self.handle_message(msg) {
                break;
            }
        }

        self.release_engine(true);
        self.reporter.end();
        debug!("Session task stopped");
    }

    /// Returns `false` when the session should stop.
    fn handle_message(&mut self, msg: SessionMessage) -> bool {
        match msg {
            SessionMessage::Engine { engine_id, event } => self.handle_engine_event(engine_id, event),
            SessionMessage::Resolved { generation, result } => {
                self.handle_resolved(generation, result)
            }
            SessionMessage::Report(report) => self.listener.report(&report),
            SessionMessage::Command(command) => self.handle_command(command),
            SessionMessage::Snapshot(reply) => self.handle_snapshot(reply),
            SessionMessage::PlaybackInfo(reply) => self.handle_playback_info(reply),
            SessionMessage::Shutdown => {
                info!("Session shutting down");
                return false;
            }
        }
        true
    }

    fn handle_command(&mut self, command: SessionCommand) {
        debug!(
            command = command.name(),
            current = %self.current,
            target = %self.target,
            "Session command"
        );

        match command {
            SessionCommand::OpenToken { token, kind } => self.open_token(token, kind),
            SessionCommand::OpenLocation { url } => self.open_location(url),
            SessionCommand::Start => self.start(),
            SessionCommand::Pause => self.pause(),
            SessionCommand::SeekTo(position) => self.seek_to(position),
            SessionCommand::Stop => self.stop(),
            SessionCommand::Release => self.release(),
            SessionCommand::Suspend => self.suspend(),
            SessionCommand::Resume => self.resume(),
            SessionCommand::SwitchToBackPlay(shift) => {
                if let Some(generation) = self.mode.switch_to_back_play(shift) {
                    info!(mode = %self.mode.mode(), "Switching to back-play");
                    self.restart_resolution(generation);
                }
            }
            SessionCommand::SwitchToLive => {
                if let Some(generation) = self.mode.switch_to_live() {
                    info!("Switching to live");
                    self.restart_resolution(generation);
                }
            }
            SessionCommand::SurfaceCreated(surface) => self.surface_created(surface),
            SessionCommand::SurfaceChanged {
                surface,
                width,
                height,
            } => self.surface_changed(surface, width, height),
            SessionCommand::SurfaceDestroyed => self.surface_destroyed(),
            SessionCommand::SetSpeedMode(mode) => {
                if let Some(active) = self.engine.as_mut() {
                    active.engine.set_speed_mode(mode);
                }
            }
            SessionCommand::SetVolume(volume) => {
                if let Some(active) = self.engine.as_mut() {
                    active.engine.set_volume(volume);
                }
            }
        }
    }

    // ---- opening ----

    fn open_token(&mut self, token: String, kind: Option<DataSourceKind>) {
        self.begin_session();
        self.arm_auto_play();
        let kind = kind.unwrap_or(self.config.data_source_kind);
        info!(token = %token, kind = kind.as_str(), "Opening token");
        let generation = self.mode.open_token(token, kind);
        self.publish_identity();
        self.spawn_resolution(generation);
    }

    fn open_location(&mut self, url: String) {
        self.begin_session();
        self.arm_auto_play();
        info!(url = %url, "Opening location");
        self.mode.open_location(&url, self.config.data_source_kind);
        self.publish_identity();
        self.pending_location = Some(url);
        self.open_pending();
    }

    /// Caller-initiated open: drop the previous engine and start fresh
    /// bookkeeping. Open counts are kept.
    fn begin_session(&mut self) {
        self.release_engine(false);
        self.metrics.reset_session();
        self.stopped = false;
        self.resolved = None;
        self.pending_location = None;
        self.seek_pending = None;
        self.shared.set_cdn(None);
    }

    /// Stop whatever plays now and resolve again for the new mode.
    fn restart_resolution(&mut self, generation: u64) {
        self.stop_engine();
        self.stopped = false;
        self.arm_auto_play();
        self.resolved = None;
        self.pending_location = None;
        self.seek_pending = None;
        self.shared.set_cdn(None);
        self.spawn_resolution(generation);
    }

    fn arm_auto_play(&mut self) {
        if self.config.auto_play {
            self.target = PlaybackState::Playing;
        }
    }

    fn spawn_resolution(&mut self, generation: u64) {
        let Some(token) = self.mode.token().map(str::to_string) else {
            return;
        };
        let mode = self.mode.mode();
        let resolver = self.resolver.clone();
        let sender = self.sender.clone();

        tokio::spawn(async move {
            let result = resolver.resolve(&token, mode).await;
            // The session may be gone by now.
            let _ = sender.send(SessionMessage::Resolved { generation, result });
        });
    }

    fn handle_resolved(&mut self, generation: u64, result: Result<ResolvedStream, ResolveError>) {
        if !self.mode.complete_resolution(generation) {
            debug!(
                generation,
                current = self.mode.generation(),
                "Discarding stale resolution"
            );
            return;
        }

        match result {
            Ok(resolved) => {
                info!(
                    cdn = %resolved.location.cdn,
                    url = %resolved.play_url,
                    mode = %resolved.mode,
                    "Stream resolved"
                );
                self.shared.set_cdn(Some(resolved.location.cdn.clone()));
                self.pending_location = Some(resolved.play_url.clone());
                self.resolved = Some(resolved);
                self.open_pending();
            }
            Err(e) => {
                warn!(error = %e, generation, "Stream resolution failed");
                self.resolved = None;
                self.metrics.record_error(MEDIA_ERROR_UNSUPPORTED);
                let (framework, implementation) = SessionError::from(e).error_pair();
                self.listener.error(framework, implementation);
            }
        }
    }

    /// Open the pending location once a surface is available.
    fn open_pending(&mut self) {
        let Some(location) = self.pending_location.clone() else {
            return;
        };
        if self.surface.is_none() {
            debug!(location = %location, "No surface yet, deferring open");
            return;
        }
        self.open_engine(&location);
    }

    /// Reopen after a release: resolve again on the live edge in token mode,
    /// otherwise reuse the last location.
    fn reopen(&mut self) {
        if self.stopped || self.mode.is_resolving() {
            return;
        }
        if self.mode.is_token_mode() && !self.mode.mode().is_back_play() {
            self.arm_auto_play();
            let generation = self.mode.begin_resolution();
            self.spawn_resolution(generation);
        } else if self.pending_location.is_some() {
            self.arm_auto_play();
            self.open_pending();
        }
    }

    fn open_engine(&mut self, location: &str) {
        self.release_engine(false);

        self.next_engine_id += 1;
        let id = self.next_engine_id;
        self.hardware_decode = self
            .gate
            .should_enable(self.config.hardware_decode, &self.config.device_model);

        match self.create_engine(id, location) {
            Ok(engine) => {
                info!(
                    engine_id = id,
                    location,
                    kind = self.mode.kind().as_str(),
                    hardware_decode = self.hardware_decode,
                    "Engine preparing"
                );
                self.engine = Some(ActiveEngine { id, engine });
                self.duration = -1;
                self.buffer_percentage = 0;
                self.video = VideoGeometry::default();
                self.set_current(PlaybackState::Preparing);
            }
            Err(e) => {
                let err = SessionError::engine_open(location, e.to_string());
                warn!(engine_id = id, error = %err, "Engine open failed");
                self.metrics.record_error(MEDIA_ERROR_UNSUPPORTED);
                self.set_current(PlaybackState::Error);
                self.target = PlaybackState::Error;
                let (framework, implementation) = err.error_pair();
                self.listener.error(framework, implementation);
            }
        }
    }

    fn create_engine(&self, id: u64, location: &str) -> Result<Box<dyn MediaEngine>, EngineError> {
        if location.is_empty() {
            return Err(EngineError::rejected(location, "empty location"));
        }

        let sink = EngineEventSink::new(id, self.sender.clone());
        let mut engine = self.factory.create(sink)?;

        match self.setup_engine(engine.as_mut(), location) {
            Ok(()) => Ok(engine),
            Err(e) => {
                engine.release();
                Err(e)
            }
        }
    }

    fn setup_engine(&self, engine: &mut dyn MediaEngine, location: &str) -> Result<(), EngineError> {
        engine.configure(&self.config.engine_options(self.mode.kind()))?;
        engine.set_hardware_decode_enabled(self.hardware_decode);
        engine.set_display(self.surface);
        engine.set_data_source(location)?;
        engine.prepare_async()
    }

    // ---- transport ----

    fn in_playback_state(&self) -> bool {
        self.engine.is_some() && self.current.accepts_commands()
    }

    fn start(&mut self) {
        if self.in_playback_state() {
            self.start_engine();
        }
        self.target = PlaybackState::Playing;
    }

    fn start_engine(&mut self) {
        if let Some(active) = self.engine.as_mut() {
            active.engine.start();
            self.set_current(PlaybackState::Playing);
        }
    }

    fn pause(&mut self) {
        if self.in_playback_state()
            && let Some(active) = self.engine.as_mut()
            && active.engine.is_playing()
        {
            active.engine.pause();
            self.set_current(PlaybackState::Paused);
        }
        self.target = PlaybackState::Paused;
    }

    fn seek_to(&mut self, position: i64) {
        if self.in_playback_state()
            && let Some(active) = self.engine.as_mut()
        {
            active.engine.seek_to(position);
            self.seek_pending = None;
        } else {
            self.seek_pending = Some(position);
        }
    }

    fn apply_pending_seek(&mut self) {
        if let Some(position) = self.seek_pending.take()
            && let Some(active) = self.engine.as_mut()
        {
            active.engine.seek_to(position);
        }
    }

    fn stop(&mut self) {
        self.stop_engine();
        self.close_session();
    }

    fn release(&mut self) {
        self.release_engine(true);
        self.close_session();
    }

    /// Forget everything the next open would reuse, including a lookup
    /// still in flight.
    fn close_session(&mut self) {
        self.stopped = true;
        self.mode.invalidate();
        self.resolved = None;
        self.pending_location = None;
        self.seek_pending = None;
    }

    fn stop_engine(&mut self) {
        if let Some(mut active) = self.engine.take() {
            active.engine.stop();
            active.engine.release();
            debug!(engine_id = active.id, "Engine stopped");
        }
        self.end_window();
        self.set_current(PlaybackState::Idle);
        self.target = PlaybackState::Idle;
    }

    fn release_engine(&mut self, clear_target: bool) {
        if let Some(mut active) = self.engine.take() {
            active.engine.reset();
            active.engine.release();
            debug!(engine_id = active.id, "Engine released");
        }
        self.end_window();
        self.set_current(PlaybackState::Idle);
        if clear_target {
            self.target = PlaybackState::Idle;
        }
    }

    fn end_window(&mut self) {
        self.reporter.end();
        self.metrics.end_buffering();
    }

    // ---- suspend / surfaces ----

    fn suspend(&mut self) {
        let Some(active) = self.engine.as_mut() else {
            return;
        };
        if active.engine.supports_suspend() {
            active.engine.pause();
            self.set_current(PlaybackState::Suspended);
        } else {
            self.release_engine(false);
            self.set_current(PlaybackState::SuspendUnsupported);
        }
    }

    fn resume(&mut self) {
        match self.current {
            PlaybackState::Suspended if self.surface.is_none() => {
                self.target = PlaybackState::ResumePending;
            }
            PlaybackState::Suspended => self.resume_engine(),
            PlaybackState::SuspendUnsupported => self.reopen(),
            _ => {}
        }
    }

    fn resume_engine(&mut self) {
        if let Some(active) = self.engine.as_mut() {
            active.engine.set_display(self.surface);
        }
        self.set_current(PlaybackState::Paused);
        if self.target == PlaybackState::ResumePending {
            self.target = PlaybackState::Playing;
            self.start_engine();
        }
    }

    fn surface_created(&mut self, surface: SurfaceHandle) {
        debug!(surface = surface.0, "Surface created");
        self.surface = Some(surface);

        if self.engine.is_none() {
            self.reopen();
        } else if self.current == PlaybackState::Suspended
            && self.target == PlaybackState::ResumePending
        {
            self.resume_engine();
        } else if let Some(active) = self.engine.as_mut() {
            active.engine.set_display(Some(surface));
        }
    }

    fn surface_changed(&mut self, surface: SurfaceHandle, width: u32, height: u32) {
        self.surface = Some(surface);
        self.surface_size = (width, height);

        let Some(active) = self.engine.as_mut() else {
            return;
        };
        active.engine.set_display(Some(surface));
        let matches_video = active.engine.video_size() == (width, height);

        if self.target == PlaybackState::Playing
            && self.current != PlaybackState::Playing
            && self.in_playback_state()
            && matches_video
        {
            self.apply_pending_seek();
            self.start_engine();
        }
    }

    fn surface_destroyed(&mut self) {
        debug!("Surface destroyed");
        self.surface = None;
        self.surface_size = (0, 0);
        if self.current != PlaybackState::Suspended {
            self.release_engine(true);
        } else if let Some(active) = self.engine.as_mut() {
            active.engine.set_display(None);
        }
    }

    // ---- engine events ----

    fn handle_engine_event(&mut self, engine_id: u64, event: EngineEvent) {
        if self.engine.as_ref().is_none_or(|active| active.id != engine_id) {
            debug!(engine_id, event = event.name(), "Dropping event from released engine");
            return;
        }

        match event {
            EngineEvent::Prepared => self.on_prepared(),
            EngineEvent::VideoSizeChanged(geometry) => {
                self.video = geometry;
                self.listener.video_size_changed(geometry);
            }
            EngineEvent::Completion => {
                info!("Playback completed");
                self.set_current(PlaybackState::Completed);
                self.target = PlaybackState::Completed;
                self.listener.completion();
            }
            EngineEvent::Error {
                framework,
                implementation,
            } => self.on_engine_error(framework, implementation),
            EngineEvent::BufferingUpdate { percent } => {
                self.buffer_percentage = percent;
                self.listener.buffering_update(percent);
            }
            EngineEvent::Info { what, extra } => {
                match what {
                    MEDIA_INFO_BUFFERING_START => self.metrics.begin_buffering(),
                    MEDIA_INFO_BUFFERING_END => self.metrics.end_buffering(),
                    _ => {}
                }
                self.listener.info(what, extra);
            }
            EngineEvent::SeekComplete => self.listener.seek_complete(),
        }
    }

    fn on_prepared(&mut self) {
        self.set_current(PlaybackState::Prepared);

        if let Some(key) = self.mode.metrics_key() {
            let count = self.metrics.record_open(&key);
            info!(key = %key, open_count = count, "Engine prepared");
            self.reporter.start(&key, self.metrics.clone());
        }
        self.listener.prepared();

        let Some(active) = self.engine.as_ref() else {
            return;
        };
        let (width, height) = active.engine.video_size();
        if width != 0 && height != 0 {
            self.video.width = width;
            self.video.height = height;
        }

        self.apply_pending_seek();

        if self.target != PlaybackState::Playing {
            return;
        }
        if self.video.is_known() {
            // Only start once the surface can show the frame at its size.
            if self.surface_size == (self.video.width, self.video.height) {
                self.start_engine();
            }
        } else {
            self.start_engine();
        }
    }

    fn on_engine_error(&mut self, framework: i32, implementation: i32) {
        warn!(framework, implementation, "Engine error");
        self.metrics.record_error(implementation);
        self.reporter.report_error(framework, implementation);
        self.set_current(PlaybackState::Error);
        self.target = PlaybackState::Error;

        let handled = self.listener.error(framework, implementation);
        if !handled && self.surface.is_some() {
            self.listener
                .error_notice(ErrorNotice::from_framework_code(framework));
        }
    }

    // ---- queries ----

    fn handle_snapshot(&self, reply: oneshot::Sender<SessionSnapshot>) {
        let snapshot = SessionSnapshot {
            current: self.current,
            target: self.target,
            mode: self.mode.mode(),
            data_source_kind: self.mode.kind(),
            token: self.mode.token().map(str::to_string),
            resolved_location: self.resolved.as_ref().map(|r| r.location.clone()),
            play_url: self.resolved.as_ref().map(|r| r.play_url.clone()),
            seek_pending: self.seek_pending,
            generation: self.mode.generation(),
            resolving: self.mode.is_resolving(),
            has_engine: self.engine.is_some(),
            has_surface: self.surface.is_some(),
            surface_size: self.surface_size,
            video: self.video,
            hardware_decode: self.hardware_decode,
        };
        let _ = reply.send(snapshot);
    }

    fn handle_playback_info(&mut self, reply: oneshot::Sender<PlaybackInfo>) {
        let capable = self.in_playback_state();
        let info = match self.engine.as_ref() {
            Some(active) => {
                if !capable {
                    self.duration = -1;
                } else if self.duration <= 0 {
                    self.duration = active.engine.duration();
                }
                PlaybackInfo {
                    duration: self.duration,
                    position: if capable { active.engine.position() } else { 0 },
                    playable_duration_secs: if capable {
                        active.engine.playable_duration() / 1000
                    } else {
                        0
                    },
                    bit_rate: if capable { active.engine.bit_rate() } else { 0 },
                    remote_ip: if capable { active.engine.remote_ip() } else { None },
                    absolute_timestamp: active.engine.absolute_timestamp(),
                    buffer_percentage: self.buffer_percentage,
                    is_playing: capable && active.engine.is_playing(),
                    video: self.video,
                }
            }
            None => PlaybackInfo {
                duration: -1,
                video: self.video,
                ..PlaybackInfo::default()
            },
        };
        let _ = reply.send(info);
    }

    fn set_current(&mut self, state: PlaybackState) {
        let old = self.current;
        if old == state {
            return;
        }
        debug!(from = %old, to = %state, "State transition");
        self.current = state;
        self.shared.set_state(state);
        self.listener.state_changed(old, state);
    }

    fn publish_identity(&self) {
        self.shared.set_identity(
            self.mode.token().map(str::to_string),
            self.mode.metrics_key().map(|key| key.into_owned()),
        );
    }
}
