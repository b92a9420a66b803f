use crate::error::{GoodnsError, Result};
use crate::scanner::DEFAULT_CONCURRENCY;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanMode {
    /// Prefixes come from a file, one per line.
    WordList(PathBuf),
    /// Every prefix of length 1..=max_len over `a-z0-9-`.
    Prefix { max_len: usize },
}

#[derive(Debug, Clone)]
pub struct Options {
    pub domain: String,
    pub mode: ScanMode,
    /// Empty means every supported TLD.
    pub tlds: Vec<String>,
    pub concurrency: usize,
    pub timeout: Duration,
    pub base_url: String,
    pub output: Option<PathBuf>,
    pub output_type: String,
    pub gzip: bool,
    pub not_print: bool,
}

impl Options {
    pub fn new(domain: impl Into<String>, mode: ScanMode) -> Self {
        Options {
            domain: domain.into(),
            mode,
            tlds: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(10),
            base_url: crate::suggest::DEFAULT_BASE_URL.to_string(),
            output: None,
            output_type: "txt".into(),
            gzip: false,
            not_print: false,
        }
    }

    /// Normalise the domain and TLD list and reject unusable values.
    pub fn check(&mut self) -> Result<()> {
        self.domain = normalize_domain(&self.domain);
        if self.domain.is_empty() {
            return Err(GoodnsError::InvalidOption("domain must not be empty".into()));
        }
        if let ScanMode::Prefix { max_len } = self.mode {
            if max_len == 0 {
                return Err(GoodnsError::InvalidOption("prefix length must be at least 1".into()));
            }
        }
        if self.concurrency == 0 {
            return Err(GoodnsError::InvalidOption("concurrency must be at least 1".into()));
        }
        let mut tlds: Vec<String> = Vec::with_capacity(self.tlds.len());
        for t in self.tlds.iter().map(|t| normalize_domain(t)) {
            if !t.is_empty() && !tlds.contains(&t) { tlds.push(t); }
        }
        self.tlds = tlds;
        if !self.gzip {
            if let Some(os) = self.output.as_ref().and_then(|p| p.to_str()) {
                if os.ends_with(".gz") { self.gzip = true; }
            }
        }
        Ok(())
    }
}

/// Trimmed, lower-cased and IDNA-encoded, so it compares equal to the host
/// names `url` extracts from suggestions.
pub fn normalize_domain(raw: &str) -> String {
    let s = raw.trim().trim_matches('.').to_lowercase();
    match url::Host::parse(&s) {
        Ok(url::Host::Domain(ascii)) => ascii,
        _ => s,
    }
}
