//! Process-scoped state shared by every session.

use std::sync::Arc;

use crate::capability::{HardwareDecodeGate, default_allow_list};
use crate::config::SessionConfig;
use crate::metrics::OpenCountRegistry;

/// Open counts and the hardware decode decision, shared by reference
/// between sessions. Create one per process and hand it to every
/// [`PlaybackSession::builder`](crate::PlaybackSession::builder).
#[derive(Debug, Clone)]
pub struct PlaybackContext {
    registry: Arc<OpenCountRegistry>,
    gate: Arc<HardwareDecodeGate>,
}

impl Default for PlaybackContext {
    fn default() -> Self {
        Self::new(default_allow_list())
    }
}

impl PlaybackContext {
    pub fn new(allow_list: Vec<String>) -> Self {
        Self {
            registry: Arc::new(OpenCountRegistry::new()),
            gate: Arc::new(HardwareDecodeGate::new(allow_list)),
        }
    }

    /// Context using the configured hardware decode allow-list.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.hardware_decode_allow_list.clone())
    }

    pub fn registry(&self) -> &Arc<OpenCountRegistry> {
        &self.registry
    }

    pub fn gate(&self) -> &Arc<HardwareDecodeGate> {
        &self.gate
    }
}
