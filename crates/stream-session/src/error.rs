use reqwest::StatusCode;

use crate::engine::{MEDIA_ERROR_UNKNOWN, MEDIA_ERROR_UNSUPPORTED};

/// Failure of a single token lookup.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("lookup request failed: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    #[error("lookup returned HTTP {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("invalid lookup endpoint `{input}`: {reason}")]
    InvalidEndpoint { input: String, reason: String },

    #[error("malformed lookup response: {reason}")]
    Malformed { reason: String },

    #[error("cdn `{cdn}` does not support back-play")]
    UnsupportedForBackPlay { cdn: String },
}

impl ResolveError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    pub fn http_status(status: StatusCode, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }

    /// Transport-level failures, as opposed to a reply we could not use.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::HttpStatus { .. } | Self::InvalidEndpoint { .. }
        )
    }
}

/// Failure reported by an engine while it is being set up.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("engine could not be created: {reason}")]
    Construction { reason: String },

    #[error("data source rejected `{location}`: {reason}")]
    DataSourceRejected { location: String, reason: String },

    #[error("prepare failed: {reason}")]
    Prepare { reason: String },
}

impl EngineError {
    pub fn construction(reason: impl Into<String>) -> Self {
        Self::Construction {
            reason: reason.into(),
        }
    }

    pub fn rejected(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataSourceRejected {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("stream resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("failed to open `{location}`: {reason}")]
    EngineOpen { location: String, reason: String },

    #[error("engine error ({framework}, {implementation})")]
    EngineRuntime { framework: i32, implementation: i32 },

    #[error("session has been shut down")]
    SessionClosed,

    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl SessionError {
    pub fn engine_open(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EngineOpen {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// The `(framework, implementation)` pair delivered to `on_error`.
    ///
    /// Resolution and open failures collapse into one generic pair so callers
    /// only need a single handling path; runtime errors keep the engine codes.
    pub fn error_pair(&self) -> (i32, i32) {
        match self {
            Self::EngineRuntime {
                framework,
                implementation,
            } => (*framework, *implementation),
            _ => (MEDIA_ERROR_UNKNOWN, MEDIA_ERROR_UNSUPPORTED),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
