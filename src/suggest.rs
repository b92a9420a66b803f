//! One query against one regional variant of the suggestion endpoint.

use crate::candidates::Candidate;
use crate::error::Result;
use crate::options::normalize_domain;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// `{tld}` is replaced by the candidate's TLD.
pub const DEFAULT_BASE_URL: &str = "https://www.google.{tld}";

const SEARCH_PATH: &str = "/complete/search";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_6) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/60.0.3112.90 Safari/537.36";

const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.8";

const SUGGEST_TYPE_KEY: &str = "google:suggesttype";

/// Tag of a direct site-navigation suggestion.
pub const NAVIGATION_TAG: &str = "NAVIGATION";

/// Outcome of one query. `Banned` is the only signal that stops a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    Found(BTreeSet<String>),
    Banned,
}

impl Suggestion {
    pub fn empty() -> Self { Suggestion::Found(BTreeSet::new()) }
}

#[async_trait]
pub trait Suggest: Send + Sync {
    async fn suggest(&self, candidate: &Candidate) -> Suggestion;
}

pub struct SuggestionClient {
    http: reqwest::Client,
    base_url: String,
}

impl SuggestionClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// `base_url` may contain `{tld}`; without it every TLD hits the same host.
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .default_headers(default_headers())
            .timeout(timeout)
            .build()?;
        Ok(Self { http, base_url: base_url.into() })
    }

    pub fn http(&self) -> &reqwest::Client { &self.http }

    pub fn endpoint(&self, tld: &str) -> String {
        format!("{}{}", self.base_url.replace("{tld}", tld).trim_end_matches('/'), SEARCH_PATH)
    }
}

fn default_headers() -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(CONNECTION, HeaderValue::from_static("close"));
    h.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    h.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_EN));
    h
}

fn query_params(q: &str) -> [(&'static str, &str); 7] {
    [
        ("client", "chrome-omni"),
        ("gs_ri", "chrome-ext-ansg"),
        ("q", q),
        ("oit", "3"),
        ("cp", "1"),
        ("pgcl", "9"),
        ("gs_rn", "42"),
    ]
}

#[async_trait]
impl Suggest for SuggestionClient {
    async fn suggest(&self, c: &Candidate) -> Suggestion {
        debug!(tld = %c.tld, query = %c.query, "scanning");
        let response = match self.http.get(self.endpoint(&c.tld)).query(&query_params(&c.query)).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(tld = %c.tld, query = %c.query, error = %e, "request failed");
                return Suggestion::empty();
            }
        };
        match response.status() {
            StatusCode::OK => {
                let body = match response.text().await {
                    Ok(b) => b,
                    Err(e) => {
                        warn!(tld = %c.tld, query = %c.query, error = %e, "failed to read body");
                        return Suggestion::empty();
                    }
                };
                debug!(tld = %c.tld, body = %body, "result");
                let hosts = parse_suggestions(&body, &c.domain);
                if hosts.is_empty() {
                    debug!(tld = %c.tld, query = %c.query, "got nothing back");
                } else {
                    let list: Vec<&str> = hosts.iter().map(|s| s.as_str()).collect();
                    info!(tld = %c.tld, query = %c.query, "got back {}", list.join(", "));
                }
                Suggestion::Found(hosts)
            }
            StatusCode::FORBIDDEN => {
                warn!(tld = %c.tld, query = %c.query, status = 403, "request forbidden");
                Suggestion::Banned
            }
            status => {
                warn!(tld = %c.tld, query = %c.query, status = status.as_u16(), "got nothing back");
                Suggestion::empty()
            }
        }
    }
}

/// Interpret an omnibox response body: `[query, [urls..], .., .., {"google:suggesttype": [tags..]}]`.
/// Keeps hosts of navigational entries that are strict sub-domains of `domain`.
/// A body that does not have this shape yields an empty set.
pub fn parse_suggestions(body: &str, domain: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "malformed suggestion body");
            return out;
        }
    };
    let (Some(urls), Some(tags)) = (
        value.get(1).and_then(Value::as_array),
        value.get(4).and_then(|v| v.get(SUGGEST_TYPE_KEY)).and_then(Value::as_array),
    ) else {
        debug!("suggestion body has no url/type lists");
        return out;
    };
    let suffix = format!(".{}", normalize_domain(domain));
    for (u, t) in urls.iter().zip(tags.iter()) {
        if t.as_str() != Some(NAVIGATION_TAG) { continue; }
        let Some(host) = u.as_str().and_then(host_of) else { continue };
        if host.ends_with(&suffix) { out.insert(host); }
    }
    out
}

fn host_of(raw: &str) -> Option<String> {
    // `host:port` without a scheme would otherwise parse with the host as the scheme
    let parsed = if raw.contains("://") { Url::parse(raw) } else { Url::parse(&format!("http://{}", raw)) }.ok()?;
    parsed.host_str().map(|h| h.trim_end_matches('.').to_ascii_lowercase())
}
