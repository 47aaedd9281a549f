//! Back-play URL derivation.
//!
//! A live link can only be turned into a time-shifted one on CDNs that expose
//! a dedicated time-shift host. Each supported CDN is described by a
//! [`TimeShiftRule`]; CDNs without a rule cannot be played back.

use serde::{Deserialize, Serialize};

use super::types::{StreamLocation, TimeShift};
use crate::error::ResolveError;

/// Rewrite rule for one CDN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeShiftRule {
    /// CDN identifier as returned by the lookup service.
    pub cdn: String,
    /// Host prefix of live links on this CDN.
    pub live_prefix: String,
    /// Host prefix serving the time-shifted variant.
    pub shift_prefix: String,
}

impl TimeShiftRule {
    pub fn new(
        cdn: impl Into<String>,
        live_prefix: impl Into<String>,
        shift_prefix: impl Into<String>,
    ) -> Self {
        Self {
            cdn: cdn.into(),
            live_prefix: live_prefix.into(),
            shift_prefix: shift_prefix.into(),
        }
    }
}

pub fn default_time_shift_rules() -> Vec<TimeShiftRule> {
    vec![TimeShiftRule::new("ws", "rtmp://ws", "rtmp://wsshiyi")]
}

/// Derive the time-shifted URL for `location`.
///
/// The link is split at its first `?`, the live host prefix of the base is
/// swapped for the time-shift host and the offset parameter is spliced in
/// front of the original query: `base + ?wsStreamTimeABS=<v>& + query`.
pub fn time_shift_url(
    location: &StreamLocation,
    shift: &TimeShift,
    rules: &[TimeShiftRule],
) -> Result<String, ResolveError> {
    let rule = rules
        .iter()
        .find(|rule| rule.cdn == location.cdn)
        .ok_or_else(|| ResolveError::UnsupportedForBackPlay {
            cdn: location.cdn.clone(),
        })?;

    let (base, query) = match location.link.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (location.link.as_str(), None),
    };

    let base = base.replacen(&rule.live_prefix, &rule.shift_prefix, 1);
    let fragment = shift.query_fragment();

    let mut url = String::with_capacity(base.len() + fragment.len() + location.link.len());
    url.push_str(&base);
    match query {
        Some(query) => {
            url.push_str(&fragment);
            url.push_str(query);
        }
        // No original query to join with.
        None => url.push_str(fragment.trim_end_matches('&')),
    }

    Ok(url)
}
