//! The decoder/render engine consumed by a session.
//!
//! The engine itself is opaque: the session only drives it through
//! [`MediaEngine`] and learns about its progress through the events it pushes
//! into an [`EngineEventSink`].

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::EngineError;
use crate::session::messages::SessionMessage;

pub const MEDIA_ERROR_UNKNOWN: i32 = 1;
pub const MEDIA_ERROR_SERVER_DIED: i32 = 100;
pub const MEDIA_ERROR_NOT_VALID_FOR_PROGRESSIVE_PLAYBACK: i32 = 200;
pub const MEDIA_ERROR_IO: i32 = -1004;
pub const MEDIA_ERROR_MALFORMED: i32 = -1007;
pub const MEDIA_ERROR_UNSUPPORTED: i32 = -1010;
pub const MEDIA_ERROR_TIMED_OUT: i32 = -110;

pub const MEDIA_INFO_BUFFERING_START: i32 = 701;
pub const MEDIA_INFO_BUFFERING_END: i32 = 702;

/// How the engine should treat the data source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    #[default]
    LowDelayLive,
    HighDelayLive,
    Vod,
}

impl DataSourceKind {
    /// Numeric value understood by the engine.
    pub fn as_engine_value(&self) -> i32 {
        match self {
            Self::LowDelayLive => 0,
            Self::HighDelayLive => 1,
            Self::Vod => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowDelayLive => "low_delay_live",
            Self::HighDelayLive => "high_delay_live",
            Self::Vod => "vod",
        }
    }
}

/// Decoded frame geometry and sample aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoGeometry {
    pub width: u32,
    pub height: u32,
    pub sar_num: u32,
    pub sar_den: u32,
}

impl VideoGeometry {
    pub fn is_known(&self) -> bool {
        self.width != 0 && self.height != 0
    }
}

/// Opaque identity of a render surface owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

/// Options applied to a freshly created engine before the data source is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub data_source_kind: DataSourceKind,
    pub data_cache_ms: u32,
    pub user_agent: Option<String>,
    pub frame_drop: u32,
    pub skip_loop_filter: u32,
}

/// Events an engine reports back to its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Prepared,
    VideoSizeChanged(VideoGeometry),
    Completion,
    Error {
        framework: i32,
        implementation: i32,
    },
    BufferingUpdate {
        percent: u32,
    },
    Info {
        what: i32,
        extra: i32,
    },
    SeekComplete,
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Prepared => "prepared",
            Self::VideoSizeChanged(_) => "video_size_changed",
            Self::Completion => "completion",
            Self::Error { .. } => "error",
            Self::BufferingUpdate { .. } => "buffering_update",
            Self::Info { .. } => "info",
            Self::SeekComplete => "seek_complete",
        }
    }
}

/// Callback set handed to an engine at construction.
///
/// The sink is tagged with the engine instance it was created for, so events
/// from an engine that has since been released are dropped by the session.
/// Emitting never blocks and may happen on any thread.
#[derive(Debug, Clone)]
pub struct EngineEventSink {
    engine_id: u64,
    mailbox: mpsc::UnboundedSender<SessionMessage>,
}

impl EngineEventSink {
    pub(crate) fn new(engine_id: u64, mailbox: mpsc::UnboundedSender<SessionMessage>) -> Self {
        Self { engine_id, mailbox }
    }

    pub fn engine_id(&self) -> u64 {
        self.engine_id
    }

    pub fn emit(&self, event: EngineEvent) {
        trace!(engine_id = self.engine_id, event = event.name(), "engine event");
        // A closed mailbox means the session is gone; nothing left to notify.
        let _ = self.mailbox.send(SessionMessage::Engine {
            engine_id: self.engine_id,
            event,
        });
    }

    pub fn prepared(&self) {
        self.emit(EngineEvent::Prepared);
    }

    pub fn completion(&self) {
        self.emit(EngineEvent::Completion);
    }

    pub fn error(&self, framework: i32, implementation: i32) {
        self.emit(EngineEvent::Error {
            framework,
            implementation,
        });
    }

    pub fn info(&self, what: i32, extra: i32) {
        self.emit(EngineEvent::Info { what, extra });
    }
}

/// A decoder/render engine instance.
///
/// Commands are synchronous and must not block on network or decoding work;
/// asynchronous outcomes (preparation, errors, completion) are reported
/// through the sink passed to [`EngineFactory::create`].
pub trait MediaEngine: Send {
    fn configure(&mut self, options: &EngineOptions) -> Result<(), EngineError> {
        let _ = options;
        Ok(())
    }

    fn set_data_source(&mut self, location: &str) -> Result<(), EngineError>;

    fn set_display(&mut self, surface: Option<SurfaceHandle>);

    fn set_hardware_decode_enabled(&mut self, enabled: bool);

    fn prepare_async(&mut self) -> Result<(), EngineError>;

    fn start(&mut self);

    fn pause(&mut self);

    fn stop(&mut self);

    fn seek_to(&mut self, position_ms: i64);

    fn reset(&mut self);

    fn release(&mut self);

    fn is_playing(&self) -> bool;

    fn duration(&self) -> i64;

    fn position(&self) -> i64;

    /// Buffered duration in milliseconds.
    fn playable_duration(&self) -> i64;

    fn bit_rate(&self) -> i64;

    fn remote_ip(&self) -> Option<String>;

    fn absolute_timestamp(&self) -> i64;

    /// Decoded frame geometry, `(0, 0)` while unknown.
    fn video_size(&self) -> (u32, u32);

    /// Whether the engine can be paused in place and resumed later without
    /// a display target.
    fn supports_suspend(&self) -> bool {
        false
    }

    fn set_speed_mode(&mut self, mode: i32) {
        let _ = mode;
    }

    fn set_volume(&mut self, volume: i32) {
        let _ = volume;
    }
}

/// Creates engine instances for a session.
pub trait EngineFactory: Send + Sync + 'static {
    fn create(&self, sink: EngineEventSink) -> Result<Box<dyn MediaEngine>, EngineError>;
}

impl<F> EngineFactory for F
where
    F: Fn(EngineEventSink) -> Result<Box<dyn MediaEngine>, EngineError> + Send + Sync + 'static,
{
    fn create(&self, sink: EngineEventSink) -> Result<Box<dyn MediaEngine>, EngineError> {
        self(sink)
    }
}
