use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::capability::default_allow_list;
use crate::engine::{DataSourceKind, EngineOptions};
use crate::error::{Result, SessionError};
use crate::resolver::{TimeShiftRule, default_time_shift_rules};

pub const DEFAULT_LOOKUP_ENDPOINT: &str = "http://192.168.9.117:8080/live/httpcdn";
pub const DEFAULT_TOKEN_PARAM: &str = "token";

/// Session and resolver configuration.
///
/// Every field has a default, so a partial TOML/JSON document is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lookup service URL; the token is appended as a query parameter.
    pub lookup_endpoint: String,
    /// Name of the token query parameter.
    pub token_param: String,
    /// Overall lookup request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// User agent for the lookup request and the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Data source kind used for live playback.
    pub data_source_kind: DataSourceKind,
    /// Engine read-ahead cache in milliseconds.
    pub data_cache_ms: u32,
    pub frame_drop: u32,
    pub skip_loop_filter: u32,

    /// Explicit hardware decoding override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_decode: Option<bool>,
    /// Device model string matched against the allow-list.
    pub device_model: String,
    /// Device model prefixes known to decode reliably in hardware.
    pub hardware_decode_allow_list: Vec<String>,

    /// CDNs that can serve back-play, and how to rewrite their links.
    pub time_shift_rules: Vec<TimeShiftRule>,

    /// Start playback as soon as the engine is prepared.
    pub auto_play: bool,
    /// Periodic session report interval in seconds, `0` disables it.
    pub report_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lookup_endpoint: DEFAULT_LOOKUP_ENDPOINT.to_string(),
            token_param: DEFAULT_TOKEN_PARAM.to_string(),
            request_timeout_secs: 10,
            connect_timeout_secs: 5,
            user_agent: None,
            data_source_kind: DataSourceKind::LowDelayLive,
            data_cache_ms: 10_000,
            frame_drop: 12,
            skip_loop_filter: 48,
            hardware_decode: None,
            device_model: String::new(),
            hardware_decode_allow_list: default_allow_list(),
            time_shift_rules: default_time_shift_rules(),
            auto_play: true,
            report_interval_secs: 60,
        }
    }
}

impl SessionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn report_interval(&self) -> Option<Duration> {
        (self.report_interval_secs > 0).then(|| Duration::from_secs(self.report_interval_secs))
    }

    pub fn lookup_url(&self) -> Result<Url> {
        Url::parse(&self.lookup_endpoint).map_err(|e| {
            SessionError::config(format!(
                "invalid lookup endpoint `{}`: {e}",
                self.lookup_endpoint
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.lookup_url()?;
        if self.token_param.trim().is_empty() {
            return Err(SessionError::config("token_param must not be empty"));
        }
        if let Some(rule) = self
            .time_shift_rules
            .iter()
            .find(|rule| rule.cdn.is_empty() || rule.live_prefix.is_empty())
        {
            return Err(SessionError::config(format!(
                "time shift rule for `{}` needs both a cdn and a live prefix",
                rule.cdn
            )));
        }
        Ok(())
    }

    /// Engine options for a session opened with `kind`.
    pub fn engine_options(&self, kind: DataSourceKind) -> EngineOptions {
        EngineOptions {
            data_source_kind: kind,
            data_cache_ms: self.data_cache_ms,
            user_agent: self.user_agent.clone(),
            frame_drop: self.frame_drop,
            skip_loop_filter: self.skip_loop_filter,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.lookup_endpoint = endpoint.into();
        self
    }

    pub fn with_device_model(mut self, model: impl Into<String>) -> Self {
        self.device_model = model.into();
        self
    }

    pub fn with_report_interval_secs(mut self, secs: u64) -> Self {
        self.report_interval_secs = secs;
        self
    }
}
