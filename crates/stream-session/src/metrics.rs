//! Session metrics.
//!
//! Open counts are process-wide and keyed by token, since the same logical
//! stream is reopened by every mode switch. Buffering and error bookkeeping
//! belongs to one session.
//!
//! Buffering samples follow a consume-and-reset contract so a periodic
//! reporter gets "since last sample" values without tracking its own window.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::time::Instant;

/// Process-wide open counter, shared by reference between sessions.
#[derive(Debug, Default)]
pub struct OpenCountRegistry {
    counts: Mutex<FxHashMap<String, u32>>,
}

impl OpenCountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more successful open of `token`, returning the new total.
    pub fn record_open(&self, token: &str) -> u32 {
        let mut counts = self.counts.lock();
        let count = counts.entry(token.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn current_open_count(&self, token: &str) -> u32 {
        self.counts.lock().get(token).copied().unwrap_or(0)
    }

    pub fn tracked_tokens(&self) -> usize {
        self.counts.lock().len()
    }
}

#[derive(Debug, Default)]
struct BufferingWindow {
    total_episodes: u32,
    window_episodes: u32,
    accumulated: Duration,
    active_since: Option<Instant>,
}

/// One consumed reporting window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferingSample {
    pub episodes: u32,
    pub seconds: u64,
}

/// Metrics for one session; safe to share between the engine callback
/// context and caller threads.
#[derive(Debug)]
pub struct SessionMetrics {
    registry: Arc<OpenCountRegistry>,
    buffering: Mutex<BufferingWindow>,
    last_error_code: AtomicI32,
    errors: AtomicU64,
}

impl SessionMetrics {
    pub fn new(registry: Arc<OpenCountRegistry>) -> Self {
        Self {
            registry,
            buffering: Mutex::new(BufferingWindow::default()),
            last_error_code: AtomicI32::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<OpenCountRegistry> {
        &self.registry
    }

    pub fn record_open(&self, token: &str) -> u32 {
        self.registry.record_open(token)
    }

    pub fn current_open_count(&self, token: &str) -> u32 {
        self.registry.current_open_count(token)
    }

    /// Mark the start of a buffering episode. Repeated starts are ignored.
    pub fn begin_buffering(&self) {
        let mut window = self.buffering.lock();
        if window.active_since.is_some() {
            return;
        }
        window.total_episodes = window.total_episodes.saturating_add(1);
        window.window_episodes = window.window_episodes.saturating_add(1);
        window.active_since = Some(Instant::now());
    }

    pub fn end_buffering(&self) {
        let mut window = self.buffering.lock();
        if let Some(since) = window.active_since.take() {
            window.accumulated += since.elapsed();
        }
    }

    pub fn is_buffering(&self) -> bool {
        self.buffering.lock().active_since.is_some()
    }

    /// Buffering episodes since the session was opened.
    pub fn total_buffering_count(&self) -> u32 {
        self.buffering.lock().total_episodes
    }

    /// Consume the episode count of the current window.
    pub fn sample_buffering_count(&self) -> u32 {
        std::mem::take(&mut self.buffering.lock().window_episodes)
    }

    /// Consume the buffering time of the current window, in whole seconds.
    ///
    /// An episode still in progress is folded in up to now and keeps running
    /// from now on. The window's episode count is reset as well.
    pub fn sample_buffering_seconds(&self) -> u64 {
        self.sample_window().seconds
    }

    /// Consume both the episode count and time of the current window.
    pub fn sample_window(&self) -> BufferingSample {
        let mut window = self.buffering.lock();
        let now = Instant::now();
        if let Some(since) = window.active_since {
            window.accumulated += now.saturating_duration_since(since);
            window.active_since = Some(now);
        }

        BufferingSample {
            episodes: std::mem::take(&mut window.window_episodes),
            seconds: std::mem::take(&mut window.accumulated).as_secs(),
        }
    }

    pub fn record_error(&self, code: i32) {
        self.last_error_code.store(code, Ordering::Relaxed);
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Last recorded error code, `0` when none.
    pub fn last_error_code(&self) -> i32 {
        self.last_error_code.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Start a fresh session: buffering and error bookkeeping go back to
    /// zero, open counts are kept.
    pub fn reset_session(&self) {
        *self.buffering.lock() = BufferingWindow::default();
        self.last_error_code.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }
}
