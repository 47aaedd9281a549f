//! Playback sessions.
//!
//! A session is spawned as its own task and driven through a
//! [`SessionHandle`]. The task owns the engine, the state machine and the
//! mode controller; everything else talks to it through its mailbox.

mod actor;
mod handle;
pub(crate) mod messages;
mod mode;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::Instrument;

pub use handle::SessionHandle;
pub use messages::{PlaybackInfo, SessionSnapshot};

use crate::capability::HardwareDecodeGate;
use crate::config::SessionConfig;
use crate::context::PlaybackContext;
use crate::engine::EngineFactory;
use crate::error::Result;
use crate::listener::SessionListener;
use crate::metrics::{OpenCountRegistry, SessionMetrics};
use crate::resolver::StreamResolver;
use actor::{SessionActor, SessionParts};
use handle::SharedSession;

/// Builder for a playback session.
pub struct PlaybackSession {
    config: SessionConfig,
    resolver: Arc<dyn StreamResolver>,
    factory: Arc<dyn EngineFactory>,
    registry: Arc<OpenCountRegistry>,
    gate: Arc<HardwareDecodeGate>,
    listener: SessionListener,
}

impl PlaybackSession {
    /// Sessions built from the same `context` share open counts and the
    /// hardware decode decision.
    pub fn builder(
        context: &PlaybackContext,
        config: SessionConfig,
        resolver: Arc<dyn StreamResolver>,
        factory: Arc<dyn EngineFactory>,
    ) -> Self {
        Self {
            config,
            resolver,
            factory,
            registry: context.registry().clone(),
            gate: context.gate().clone(),
            listener: SessionListener::default(),
        }
    }

    pub fn listener(mut self, listener: SessionListener) -> Self {
        self.listener = listener;
        self
    }

    /// Validate the configuration and spawn the session task on the current
    /// tokio runtime.
    pub fn spawn(self) -> Result<SessionHandle> {
        self.config.validate()?;

        let shared = Arc::new(SharedSession::new(Arc::new(SessionMetrics::new(
            self.registry,
        ))));

        let (sender, mailbox) = mpsc::unbounded_channel();
        let parts = SessionParts {
            config: Arc::new(self.config),
            resolver: self.resolver,
            factory: self.factory,
            gate: self.gate,
            shared: shared.clone(),
            listener: self.listener,
        };
        let actor = SessionActor::new(parts, mailbox, sender.clone());
        tokio::spawn(actor.run().instrument(tracing::debug_span!("session")));

        Ok(SessionHandle::new(sender, shared))
    }
}
