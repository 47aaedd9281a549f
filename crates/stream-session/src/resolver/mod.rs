//! Token to stream-location resolution.

mod client;
pub mod rewrite;
pub mod types;

use std::sync::LazyLock;

use async_trait::async_trait;

pub use client::{HttpStreamResolver, encode_token, parse_lookup_body};
pub use rewrite::{TimeShiftRule, default_time_shift_rules, time_shift_url};
pub use types::{PlaybackMode, ResolvedStream, StreamLocation, TimeShift, TimeShiftKind};

use crate::error::ResolveError;

static DEFAULT_RULES: LazyLock<Vec<TimeShiftRule>> = LazyLock::new(default_time_shift_rules);

/// Maps a token to a playable stream.
///
/// Implementors only provide the lookup round-trip; the mode-dependent URL
/// derivation is shared through the provided [`StreamResolver::resolve`].
#[async_trait]
pub trait StreamResolver: Send + Sync + 'static {
    /// Fetch the raw `{cdn, link}` pair for `token`.
    async fn lookup(&self, token: &str) -> Result<StreamLocation, ResolveError>;

    fn time_shift_rules(&self) -> &[TimeShiftRule] {
        &DEFAULT_RULES
    }

    async fn resolve(
        &self,
        token: &str,
        mode: PlaybackMode,
    ) -> Result<ResolvedStream, ResolveError> {
        let location = self.lookup(token).await?;
        resolve_location(location, mode, self.time_shift_rules())
    }
}

/// Turn a looked-up location into the URL to open for `mode`.
pub fn resolve_location(
    location: StreamLocation,
    mode: PlaybackMode,
    rules: &[TimeShiftRule],
) -> Result<ResolvedStream, ResolveError> {
    if location.cdn.is_empty() {
        return Err(ResolveError::malformed("empty cdn"));
    }
    if location.link.is_empty() {
        return Err(ResolveError::malformed("empty link"));
    }

    let play_url = match mode {
        PlaybackMode::Live => location.link.clone(),
        PlaybackMode::BackPlay(shift) => time_shift_url(&location, &shift, rules)?,
    };

    Ok(ResolvedStream {
        location,
        play_url,
        mode,
    })
}
