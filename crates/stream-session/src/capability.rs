//! Hardware decode gating.
//!
//! Hardware decoding is opt-in: only device models on the allow-list get it
//! unless the host overrides the decision explicitly.

use parking_lot::Mutex;
use tracing::debug;

/// Device model prefixes known to decode reliably in hardware.
pub fn default_allow_list() -> Vec<String> {
    ["m1 note", "MI 3", "MI 4LTE", "GT-I95", "SM-N900"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Default)]
struct GateState {
    /// Set once hardware decoding has been enabled for the process.
    sticky_enabled: bool,
    /// Allow-list verdict, with the fingerprint it was computed for.
    detected: Option<(String, bool)>,
}

/// Process-wide hardware decode decision, shared by every session.
#[derive(Debug)]
pub struct HardwareDecodeGate {
    allow_list: Vec<String>,
    state: Mutex<GateState>,
}

impl Default for HardwareDecodeGate {
    fn default() -> Self {
        Self::new(default_allow_list())
    }
}

impl HardwareDecodeGate {
    pub fn new(allow_list: Vec<String>) -> Self {
        Self {
            allow_list,
            state: Mutex::new(GateState::default()),
        }
    }

    pub fn allow_list(&self) -> &[String] {
        &self.allow_list
    }

    pub fn is_allow_listed(&self, fingerprint: &str) -> bool {
        !fingerprint.is_empty()
            && self
                .allow_list
                .iter()
                .any(|prefix| !prefix.is_empty() && fingerprint.starts_with(prefix.as_str()))
    }

    /// Decide whether a new session should decode in hardware.
    ///
    /// An explicit override wins; enabling (explicitly or by detection) is
    /// remembered for the rest of the process until [`reset`](Self::reset).
    pub fn should_enable(&self, explicit_override: Option<bool>, fingerprint: &str) -> bool {
        let mut state = self.state.lock();

        if let Some(enabled) = explicit_override {
            state.sticky_enabled |= enabled;
            return enabled;
        }
        if state.sticky_enabled {
            return true;
        }

        let detected = match &state.detected {
            Some((cached_for, verdict)) if cached_for == fingerprint => *verdict,
            _ => {
                let verdict = self.is_allow_listed(fingerprint);
                debug!(fingerprint, verdict, "Hardware decode allow-list check");
                state.detected = Some((fingerprint.to_string(), verdict));
                verdict
            }
        };

        state.sticky_enabled |= detected;
        detected
    }

    /// Forget the sticky decision and the cached verdict.
    pub fn reset(&self) {
        *self.state.lock() = GateState::default();
    }
}
