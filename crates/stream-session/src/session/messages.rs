//! Messages accepted by a session task.

use serde::Serialize;
use tokio::sync::oneshot;

use crate::engine::{DataSourceKind, EngineEvent, SurfaceHandle, VideoGeometry};
use crate::error::ResolveError;
use crate::report::SessionReport;
use crate::resolver::{PlaybackMode, ResolvedStream, StreamLocation, TimeShift};
use crate::state::PlaybackState;

/// Everything that can reach a session's mailbox.
#[derive(Debug)]
pub enum SessionMessage {
    /// Event from the engine instance `engine_id`.
    Engine { engine_id: u64, event: EngineEvent },
    /// Completion of the resolution started for `generation`.
    Resolved {
        generation: u64,
        result: Result<ResolvedStream, ResolveError>,
    },
    /// A reporting window was sampled.
    Report(SessionReport),
    Command(SessionCommand),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    PlaybackInfo(oneshot::Sender<PlaybackInfo>),
    Shutdown,
}

/// Caller-issued commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    OpenToken {
        token: String,
        kind: Option<DataSourceKind>,
    },
    OpenLocation {
        url: String,
    },
    Start,
    Pause,
    SeekTo(i64),
    Stop,
    Release,
    Suspend,
    Resume,
    SwitchToBackPlay(TimeShift),
    SwitchToLive,
    SurfaceCreated(SurfaceHandle),
    SurfaceChanged {
        surface: SurfaceHandle,
        width: u32,
        height: u32,
    },
    SurfaceDestroyed,
    SetSpeedMode(i32),
    SetVolume(i32),
}

impl SessionCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenToken { .. } => "open_token",
            Self::OpenLocation { .. } => "open_location",
            Self::Start => "start",
            Self::Pause => "pause",
            Self::SeekTo(_) => "seek_to",
            Self::Stop => "stop",
            Self::Release => "release",
            Self::Suspend => "suspend",
            Self::Resume => "resume",
            Self::SwitchToBackPlay(_) => "switch_to_back_play",
            Self::SwitchToLive => "switch_to_live",
            Self::SurfaceCreated(_) => "surface_created",
            Self::SurfaceChanged { .. } => "surface_changed",
            Self::SurfaceDestroyed => "surface_destroyed",
            Self::SetSpeedMode(_) => "set_speed_mode",
            Self::SetVolume(_) => "set_volume",
        }
    }
}

/// Point-in-time view of a session's state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub current: PlaybackState,
    pub target: PlaybackState,
    pub mode: PlaybackMode,
    pub data_source_kind: DataSourceKind,
    pub token: Option<String>,
    pub resolved_location: Option<StreamLocation>,
    pub play_url: Option<String>,
    pub seek_pending: Option<i64>,
    pub generation: u64,
    pub resolving: bool,
    pub has_engine: bool,
    pub has_surface: bool,
    pub surface_size: (u32, u32),
    pub video: VideoGeometry,
    pub hardware_decode: bool,
}

/// Engine-derived playback figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackInfo {
    /// Milliseconds, `-1` when not in a playback-capable state.
    pub duration: i64,
    pub position: i64,
    pub playable_duration_secs: i64,
    pub bit_rate: i64,
    pub remote_ip: Option<String>,
    pub absolute_timestamp: i64,
    pub buffer_percentage: u32,
    pub is_playing: bool,
    pub video: VideoGeometry,
}
