//! Wires validated options, the suggestion client and the writers into one scan.

use crate::candidates::PrefixSource;
use crate::error::Result;
use crate::options::{Options, ScanMode};
use crate::output::{build_writers, OutputWriter, Report};
use crate::scanner::{ScanOutcome, Scanner};
use crate::suggest::{Suggest, SuggestionClient};
use crate::tlds::TldSet;
use std::sync::Arc;
use tracing::{error, info};

/// A validated scan, ready to run. Construction does no network I/O.
pub struct Runner<S = SuggestionClient> {
    pub options: Options,
    tlds: TldSet,
    source: PrefixSource,
    client: Arc<S>,
    writers: Vec<Box<dyn OutputWriter>>,
}

impl Runner<SuggestionClient> {
    pub fn new(opt: Options, supported: &TldSet) -> Result<Self> {
        let client = SuggestionClient::with_base_url(opt.base_url.clone(), opt.timeout)?;
        Self::with_client(opt, supported, client)
    }
}

impl<S: Suggest + 'static> Runner<S> {
    pub fn with_client(mut opt: Options, supported: &TldSet, client: S) -> Result<Self> {
        opt.check()?;
        let tlds = supported.select(&opt.tlds)?;
        let source = match &opt.mode {
            ScanMode::WordList(path) => PrefixSource::from_wordlist(path)?,
            ScanMode::Prefix { max_len } => PrefixSource::Combinatorial { max_len: *max_len },
        };
        let writers = build_writers(opt.output.clone(), &opt.output_type, !opt.not_print, opt.gzip)?;
        Ok(Runner { options: opt, tlds, source, client: Arc::new(client), writers })
    }

    pub fn tlds(&self) -> &TldSet { &self.tlds }

    /// Run the scan and write the report. A report that cannot be written or
    /// finalised is an error even though the scan itself finished.
    pub async fn run(&self) -> Result<ScanOutcome> {
        match &self.options.mode {
            ScanMode::WordList(p) => info!(wordlist = %p.display(), "starting word list scan"),
            ScanMode::Prefix { max_len } => info!(max_len, "starting prefix scan"),
        }
        info!(
            domain = %self.options.domain,
            tlds = self.tlds.len(),
            prefixes = self.source.total_prefixes(),
            "scanning"
        );
        let mut scanner = Scanner::new(self.client.clone(), self.options.concurrency);
        let outcome = scanner.run(self.source.batches(&self.options.domain, &self.tlds)).await;
        let report = Report::new(&self.options.domain, &outcome);
        let mut first_err = None;
        for w in self.writers.iter() {
            if let Err(e) = w.write(&report).and_then(|_| w.close()) {
                error!(error = %e, "failed to write report");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(outcome),
        }
    }
}
