//! Regional variants of the suggestion service.
//!
//! The built-in list is embedded at compile time from `data/supported_domains.txt`
//! and used whenever the live list cannot be downloaded.

use crate::error::{GoodnsError, Result};
use std::collections::BTreeSet;
use tracing::{info, warn};

const EMBEDDED_SUPPORTED_DOMAINS: &str = include_str!("../data/supported_domains.txt");

/// Where the service publishes its host variants (`.google.com`, `.google.co.uk`, ...).
pub const SUPPORTED_DOMAINS_URL: &str = "https://www.google.com/supported_domains";

const SERVICE_LABEL: &str = "google.";

/// Immutable, non-empty, ordered set of TLD suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TldSet {
    tlds: Vec<String>,
}

impl TldSet {
    /// Build from arbitrary entries; blanks and duplicates are dropped, order is kept.
    /// Returns `None` when nothing usable remains.
    pub fn from_entries<I, S>(entries: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let mut tlds = Vec::new();
        for e in entries {
            let t = e.as_ref().trim().trim_matches('.').to_ascii_lowercase();
            if t.is_empty() { continue; }
            if seen.insert(t.clone()) { tlds.push(t); }
        }
        if tlds.is_empty() { None } else { Some(Self { tlds }) }
    }

    pub fn builtin() -> Self {
        Self::from_entries(EMBEDDED_SUPPORTED_DOMAINS.lines())
            .unwrap_or_else(|| Self { tlds: vec!["com".to_string()] })
    }

    /// Parse the body of the supported-domains document: one `.google.<tld>` per line.
    pub fn parse_supported_domains(body: &str) -> Option<Self> {
        Self::from_entries(body.lines().filter_map(|line| {
            let line = line.trim().trim_start_matches('.');
            line.strip_prefix(SERVICE_LABEL)
        }))
    }

    pub fn contains(&self, tld: &str) -> bool {
        self.tlds.iter().any(|t| t == tld)
    }

    pub fn len(&self) -> usize { self.tlds.len() }

    pub fn is_empty(&self) -> bool { self.tlds.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tlds.iter().map(|s| s.as_str())
    }

    /// Resolve the operator's TLD choice against this set.
    /// An empty request selects every supported TLD.
    pub fn select(&self, requested: &[String]) -> Result<TldSet> {
        if requested.is_empty() {
            return Ok(self.clone());
        }
        let invalid: BTreeSet<String> = requested
            .iter()
            .filter(|t| !self.contains(t))
            .cloned()
            .collect();
        if !invalid.is_empty() {
            return Err(GoodnsError::InvalidTlds(invalid.into_iter().collect()));
        }
        Self::from_entries(requested).ok_or_else(|| GoodnsError::InvalidOption("empty TLD list".into()))
    }
}

/// Download the live list, falling back to the built-in one on any failure.
pub async fn fetch_supported(client: &reqwest::Client, url: &str) -> TldSet {
    info!(url, "downloading supported domains");
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "supported domains download failed, using built-in list");
            return TldSet::builtin();
        }
    };
    let status = response.status();
    if !status.is_success() {
        warn!(status = status.as_u16(), "supported domains download failed, using built-in list");
        return TldSet::builtin();
    }
    match response.text().await.ok().as_deref().and_then(TldSet::parse_supported_domains) {
        Some(set) => {
            info!(count = set.len(), "download complete");
            set
        }
        None => {
            warn!("supported domains document was empty, using built-in list");
            TldSet::builtin()
        }
    }
}
