//! Periodic session reporting.
//!
//! While a session is prepared, a background task samples the session
//! metrics once per interval and hands the result back to the session task,
//! which forwards it to the listener.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::metrics::SessionMetrics;
use crate::session::messages::SessionMessage;

/// One reporting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    /// Open-count key of the session (token, or encoded URL).
    pub key: String,
    /// Buffering episodes started during the window.
    pub buffering_episodes: u32,
    /// Buffering time spent during the window, in whole seconds.
    pub buffering_secs: u64,
    pub total_buffering: u32,
    pub open_count: u32,
    pub error_count: u64,
    pub last_error_code: i32,
}

impl SessionReport {
    /// Sample `metrics`, consuming the current buffering window.
    pub fn sample(key: &str, metrics: &SessionMetrics) -> Self {
        let window = metrics.sample_window();
        Self {
            key: key.to_string(),
            buffering_episodes: window.episodes,
            buffering_secs: window.seconds,
            total_buffering: metrics.total_buffering_count(),
            open_count: metrics.current_open_count(key),
            error_count: metrics.error_count(),
            last_error_code: metrics.last_error_code(),
        }
    }
}

/// Owns the reporting task of one session.
#[derive(Debug)]
pub(crate) struct SessionReporter {
    interval: Option<Duration>,
    mailbox: mpsc::UnboundedSender<SessionMessage>,
    window: Option<CancellationToken>,
}

impl SessionReporter {
    pub(crate) fn new(
        interval: Option<Duration>,
        mailbox: mpsc::UnboundedSender<SessionMessage>,
    ) -> Self {
        Self {
            interval,
            mailbox,
            window: None,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.window.is_some()
    }

    /// Open a reporting window for `key`, ending any previous one.
    pub(crate) fn start(&mut self, key: &str, metrics: Arc<SessionMetrics>) {
        self.end();
        let Some(period) = self.interval else {
            return;
        };

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let mailbox = self.mailbox.clone();
        let key = key.to_string();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(key = %key, "Report window closed");
                        break;
                    }
                    _ = ticker.tick() => {
                        let report = SessionReport::sample(&key, &metrics);
                        info!(
                            key = %report.key,
                            buffering_episodes = report.buffering_episodes,
                            buffering_secs = report.buffering_secs,
                            total_buffering = report.total_buffering,
                            open_count = report.open_count,
                            errors = report.error_count,
                            "Session report"
                        );
                        if mailbox.send(SessionMessage::Report(report)).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        self.window = Some(cancel);
    }

    pub(crate) fn end(&mut self) {
        if let Some(window) = self.window.take() {
            window.cancel();
        }
    }

    /// Note an engine error in the current window.
    pub(crate) fn report_error(&self, framework: i32, implementation: i32) {
        info!(
            framework,
            implementation,
            window_open = self.is_active(),
            "Session error reported"
        );
    }
}

impl Drop for SessionReporter {
    fn drop(&mut self) {
        self.end();
    }
}
