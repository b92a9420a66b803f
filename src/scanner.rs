//! Batch-at-a-time scan over a bounded worker pool, stopping on the first ban.

use crate::candidates::Batch;
use crate::metrics::ScanStats;
use crate::output::DiscoverySet;
use crate::suggest::{Suggest, Suggestion};
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

pub const DEFAULT_CONCURRENCY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Running,
    Completed,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The service answered 403: this host has been flagged.
    Banned,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Banned => f.write_str("banned"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed(DiscoverySet),
    Aborted { discovered: DiscoverySet, reason: AbortReason },
}

impl ScanOutcome {
    pub fn discovered(&self) -> &DiscoverySet {
        match self {
            ScanOutcome::Completed(d) => d,
            ScanOutcome::Aborted { discovered, .. } => discovered,
        }
    }

    pub fn is_completed(&self) -> bool { matches!(self, ScanOutcome::Completed(_)) }

    /// 0 on completion, 2 when the scan was cut short by a ban.
    pub fn exit_code(&self) -> u8 {
        match self {
            ScanOutcome::Completed(_) => 0,
            ScanOutcome::Aborted { .. } => 2,
        }
    }
}

/// Drives batches through a bounded pool of workers, one batch at a time.
pub struct Scanner<S> {
    client: Arc<S>,
    concurrency: usize,
    state: ScanState,
    stats: Arc<ScanStats>,
}

impl<S: Suggest + 'static> Scanner<S> {
    pub fn new(client: Arc<S>, concurrency: usize) -> Self {
        Self { client, concurrency: concurrency.max(1), state: ScanState::Idle, stats: ScanStats::new() }
    }

    pub fn state(&self) -> ScanState { self.state }

    pub fn stats(&self) -> Arc<ScanStats> { self.stats.clone() }

    fn transition(&mut self, next: ScanState) {
        debug!(from = ?self.state, to = ?next, "scan state");
        self.state = next;
    }

    pub async fn run<I>(&mut self, batches: I) -> ScanOutcome
    where
        I: IntoIterator<Item = Batch>,
    {
        self.transition(ScanState::Running);
        let sem = Arc::new(Semaphore::new(self.concurrency));
        let mut discovered = DiscoverySet::new();

        for batch in batches {
            let banned = self.run_batch(&sem, batch, &mut discovered).await;
            if banned {
                error!("This machine has been flagged by the suggestion service");
                self.transition(ScanState::Aborted);
                self.stats.log_summary(discovered.len());
                return ScanOutcome::Aborted { discovered, reason: AbortReason::Banned };
            }
        }

        self.transition(ScanState::Completed);
        self.stats.log_summary(discovered.len());
        ScanOutcome::Completed(discovered)
    }

    /// Dispatch every candidate of the batch and wait for all of them.
    /// Found hosts are merged even when a sibling reported a ban.
    async fn run_batch(&self, sem: &Arc<Semaphore>, batch: Batch, discovered: &mut DiscoverySet) -> bool {
        debug!(prefix = %batch.prefix, size = batch.candidates.len(), "dispatching batch");
        self.stats.batches.fetch_add(1, Ordering::Relaxed);
        let mut tasks = FuturesUnordered::new();
        for candidate in batch.candidates {
            let permit = match sem.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => break,
            };
            let client = self.client.clone();
            let stats = self.stats.clone();
            tasks.push(tokio::spawn(async move {
                let _p = permit;
                stats.queries.fetch_add(1, Ordering::Relaxed);
                client.suggest(&candidate).await
            }));
        }

        let mut banned = false;
        while let Some(res) = tasks.next().await {
            match res {
                Ok(Suggestion::Found(hosts)) => {
                    let fresh = discovered.merge(hosts);
                    self.stats.found.fetch_add(fresh.len() as u64, Ordering::Relaxed);
                    for h in fresh {
                        info!(host = %h, "discovered");
                    }
                }
                Ok(Suggestion::Banned) => {
                    self.stats.banned.fetch_add(1, Ordering::Relaxed);
                    banned = true;
                }
                Err(e) => {
                    self.stats.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(error = %e, "task join error");
                }
            }
        }
        banned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::{Candidate, PrefixSource};
    use crate::tlds::TldSet;
    use async_trait::async_trait;
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Mutex;

    /// Scripted responses keyed by (tld, query); anything unscripted is empty.
    #[derive(Default)]
    struct Scripted {
        responses: HashMap<(String, String), Suggestion>,
        seen: Mutex<Vec<Candidate>>,
    }

    impl Scripted {
        fn on(mut self, tld: &str, query: &str, s: Suggestion) -> Self {
            self.responses.insert((tld.into(), query.into()), s);
            self
        }

        fn queries(&self) -> Vec<String> {
            self.seen.lock().unwrap().iter().map(|c| c.query.clone()).collect()
        }
    }

    #[async_trait]
    impl Suggest for Scripted {
        async fn suggest(&self, c: &Candidate) -> Suggestion {
            self.seen.lock().unwrap().push(c.clone());
            self.responses
                .get(&(c.tld.clone(), c.query.clone()))
                .cloned()
                .unwrap_or_else(Suggestion::empty)
        }
    }

    fn found(hosts: &[&str]) -> Suggestion {
        Suggestion::Found(hosts.iter().map(|h| h.to_string()).collect::<BTreeSet<_>>())
    }

    fn tlds(list: &[&str]) -> TldSet {
        TldSet::from_entries(list.iter().copied()).unwrap()
    }

    #[tokio::test]
    async fn merges_all_batches() {
        let client = Arc::new(
            Scripted::default()
                .on("com", "www.example.com", found(&["www.example.com"]))
                .on("co.uk", "www.example.com", found(&["www.example.com", "uk.example.com"]))
                .on("com", "mail.example.com", found(&["mail.example.com"])),
        );
        let src = PrefixSource::from_words(["www", "mail"]);
        let set = tlds(&["com", "co.uk"]);
        let mut scanner = Scanner::new(client.clone(), 4);
        assert_eq!(scanner.state(), ScanState::Idle);
        let outcome = scanner.run(src.batches("example.com", &set)).await;
        assert_eq!(scanner.state(), ScanState::Completed);
        assert!(outcome.is_completed());
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(
            outcome.discovered().iter().collect::<Vec<_>>(),
            vec!["mail.example.com", "uk.example.com", "www.example.com"]
        );
        assert_eq!(client.queries().len(), 4);
        assert_eq!(scanner.stats().queries.load(Ordering::Relaxed), 4);
        // www.example.com came back from two TLDs but counts once
        assert_eq!(scanner.stats().found.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn ban_stops_before_next_batch() {
        let client = Arc::new(
            Scripted::default()
                .on("com", "a.example.com", found(&["a.example.com"]))
                .on("com", "b.example.com", Suggestion::Banned)
                .on("de", "b.example.com", found(&["b.example.com"])),
        );
        let src = PrefixSource::from_words(["a", "b", "c", "d"]);
        let set = tlds(&["com", "de"]);
        let mut scanner = Scanner::new(client.clone(), 32);
        let outcome = scanner.run(src.batches("example.com", &set)).await;
        assert_eq!(scanner.state(), ScanState::Aborted);
        assert_eq!(outcome.exit_code(), 2);
        match &outcome {
            ScanOutcome::Aborted { reason, .. } => assert_eq!(*reason, AbortReason::Banned),
            other => panic!("unexpected outcome {other:?}"),
        }
        // the sibling in the banned batch still contributes
        assert!(outcome.discovered().contains("a.example.com"));
        assert!(outcome.discovered().contains("b.example.com"));
        let queries = client.queries();
        assert!(!queries.iter().any(|q| q == "c.example.com" || q == "d.example.com"));
        assert_eq!(queries.len(), 4);
    }

    #[tokio::test]
    async fn pool_size_one_still_drains_batch() {
        let client = Arc::new(Scripted::default());
        let src = PrefixSource::Combinatorial { max_len: 1 };
        let set = tlds(&["com", "de", "fr"]);
        let mut scanner = Scanner::new(client.clone(), 1);
        let outcome = scanner.run(src.batches("example.com", &set)).await;
        assert!(outcome.is_completed());
        assert!(outcome.discovered().is_empty());
        assert_eq!(client.queries().len(), 36 * 3);
        assert_eq!(scanner.stats().batches.load(Ordering::Relaxed), 36);
    }

    #[tokio::test]
    async fn batches_run_in_generator_order() {
        let client = Arc::new(Scripted::default());
        let src = PrefixSource::from_words(["x", "y", "z"]);
        let set = tlds(&["com"]);
        let mut scanner = Scanner::new(client.clone(), 8);
        scanner.run(src.batches("example.com", &set)).await;
        assert_eq!(client.queries(), vec!["x.example.com", "y.example.com", "z.example.com"]);
    }
}
