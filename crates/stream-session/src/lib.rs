//! Playback session control for token-addressed live streams.
//!
//! A caller hands a session an opaque token. The session resolves it to a
//! playable location through a lookup service, drives a decoder/render
//! engine through its lifecycle, and can switch between the live edge and
//! time-shifted back-play of the same channel.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stream_session::{
//!     EngineEventSink, EngineError, HttpStreamResolver, MediaEngine, PlaybackContext,
//!     PlaybackSession, SessionConfig, SessionListener, SurfaceHandle,
//! };
//!
//! # fn make_engine(_sink: EngineEventSink) -> Result<Box<dyn MediaEngine>, EngineError> { unimplemented!() }
//! # async fn run() -> stream_session::Result<()> {
//! let config = SessionConfig::default();
//! // One per process; every session shares its open counts.
//! let context = PlaybackContext::from_config(&config);
//! let resolver = Arc::new(HttpStreamResolver::new(&config)?);
//! let session = PlaybackSession::builder(&context, config, resolver, Arc::new(make_engine))
//!     .listener(SessionListener::new().on_error(|framework, implementation| {
//!         eprintln!("playback failed: {framework}/{implementation}");
//!         true
//!     }))
//!     .spawn()?;
//!
//! session.surface_created(SurfaceHandle(1))?;
//! session.open_token("abc")?;
//! # Ok(())
//! # }
//! ```

pub mod capability;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod listener;
pub mod metrics;
pub mod report;
pub mod resolver;
pub mod session;
pub mod state;

pub use capability::HardwareDecodeGate;
pub use config::SessionConfig;
pub use context::PlaybackContext;
pub use engine::{
    DataSourceKind, EngineEvent, EngineEventSink, EngineFactory, EngineOptions, MediaEngine,
    SurfaceHandle, VideoGeometry,
};
pub use error::{EngineError, ResolveError, Result, SessionError};
pub use listener::{ErrorNotice, SessionListener};
pub use metrics::{OpenCountRegistry, SessionMetrics};
pub use report::SessionReport;
pub use resolver::{
    HttpStreamResolver, PlaybackMode, ResolvedStream, StreamLocation, StreamResolver, TimeShift,
    TimeShiftKind,
};
pub use session::{PlaybackInfo, PlaybackSession, SessionHandle, SessionSnapshot};
pub use state::PlaybackState;
