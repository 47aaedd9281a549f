use std::borrow::Cow;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::StreamResolver;
use super::rewrite::TimeShiftRule;
use super::types::StreamLocation;
use crate::config::SessionConfig;
use crate::error::ResolveError;

/// Fields we read from the lookup reply; anything else is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LookupResponse {
    cdn: Option<String>,
    link: Option<String>,
}

/// Percent-encode a token for use as a query value.
///
/// `&str` is always valid UTF-8, so encoding cannot fail and the raw-token
/// fallback never has to be taken.
pub fn encode_token(token: &str) -> Cow<'_, str> {
    urlencoding::encode(token)
}

/// Parse a lookup reply body into a location.
///
/// An empty body, unparsable JSON, or a missing/empty `cdn` or `link` are all
/// reported as [`ResolveError::Malformed`].
pub fn parse_lookup_body(body: &[u8]) -> Result<StreamLocation, ResolveError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ResolveError::malformed("empty response body"));
    }

    let response: LookupResponse =
        serde_json::from_slice(body).map_err(|e| ResolveError::malformed(e.to_string()))?;

    let cdn = response
        .cdn
        .filter(|cdn| !cdn.is_empty())
        .ok_or_else(|| ResolveError::malformed("missing cdn"))?;
    let link = response
        .link
        .filter(|link| !link.is_empty())
        .ok_or_else(|| ResolveError::malformed("missing link"))?;

    Ok(StreamLocation { cdn, link })
}

/// Resolver backed by the HTTP lookup service.
#[derive(Debug, Clone)]
pub struct HttpStreamResolver {
    client: Client,
    endpoint: Url,
    token_param: String,
    rules: Vec<TimeShiftRule>,
}

impl HttpStreamResolver {
    pub fn new(config: &SessionConfig) -> Result<Self, ResolveError> {
        let mut builder = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout());
        if let Some(ua) = &config.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        let client = builder.build()?;
        Self::with_client(client, config)
    }

    /// Build a resolver around an existing client, sharing its pool.
    pub fn with_client(client: Client, config: &SessionConfig) -> Result<Self, ResolveError> {
        let endpoint =
            Url::parse(&config.lookup_endpoint).map_err(|e| ResolveError::InvalidEndpoint {
                input: config.lookup_endpoint.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint,
            token_param: config.token_param.clone(),
            rules: config.time_shift_rules.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Endpoint URL carrying the encoded token.
    ///
    /// The query is assembled by hand so the token is encoded exactly once.
    pub fn lookup_url(&self, token: &str) -> Url {
        let mut url = self.endpoint.clone();
        let pair = format!("{}={}", self.token_param, encode_token(token));
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{pair}"),
            _ => pair,
        };
        url.set_query(Some(&query));
        url
    }
}

#[async_trait]
impl StreamResolver for HttpStreamResolver {
    async fn lookup(&self, token: &str) -> Result<StreamLocation, ResolveError> {
        let url = self.lookup_url(token);
        debug!(url = %url, "Looking up stream location");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            warn!(error = %e, "Lookup request failed");
            ResolveError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Lookup returned non-success status");
            return Err(ResolveError::http_status(status, url.as_str()));
        }

        let body = response.bytes().await?;
        debug!(len = body.len(), "Lookup response received");
        parse_lookup_body(&body)
    }

    fn time_shift_rules(&self) -> &[TimeShiftRule] {
        &self.rules
    }
}
