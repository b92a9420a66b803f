//! Result aggregation and report writers.

use crate::error::{GoodnsError, Result};
use crate::scanner::ScanOutcome;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

/// Unique host names discovered so far; iteration is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverySet {
    hosts: BTreeSet<String>,
}

impl DiscoverySet {
    pub fn new() -> Self { Self::default() }

    /// Returns `true` if the host was not already present.
    pub fn insert(&mut self, host: impl Into<String>) -> bool {
        self.hosts.insert(host.into())
    }

    /// Union `hosts` into the set and return the ones that were new, in input order.
    pub fn merge<I: IntoIterator<Item = String>>(&mut self, hosts: I) -> Vec<String> {
        hosts.into_iter().filter(|h| self.hosts.insert(h.clone())).collect()
    }

    pub fn contains(&self, host: &str) -> bool { self.hosts.contains(host) }

    pub fn len(&self) -> usize { self.hosts.len() }

    pub fn is_empty(&self) -> bool { self.hosts.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(|s| s.as_str())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Report {
    pub domain: String,
    pub status: &'static str,
    pub count: usize,
    pub hosts: Vec<String>,
}

impl Report {
    pub fn new(domain: &str, outcome: &ScanOutcome) -> Self {
        let d = outcome.discovered();
        Report {
            domain: domain.to_string(),
            status: if outcome.is_completed() { "completed" } else { "banned" },
            count: d.len(),
            hosts: d.iter().map(str::to_string).collect(),
        }
    }

    /// `Discovered N domains` followed by one host per line.
    pub fn render_text(&self) -> String {
        let mut s = format!("Discovered {} domains\n", self.count);
        for h in &self.hosts {
            s.push_str(h);
            s.push('\n');
        }
        s
    }
}

pub trait OutputWriter: Send + Sync {
    fn write(&self, r: &Report) -> Result<()>;
    /// Flush and finalise the destination (gzip trailer). Further writes fail.
    fn close(&self) -> Result<()> { Ok(()) }
}

enum FileSink {
    Plain(File),
    Gzip(GzEncoder<File>),
    Closed,
}

impl FileSink {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            FileSink::Plain(f) => {
                f.write_all(buf)?;
                f.flush()
            }
            FileSink::Gzip(g) => {
                g.write_all(buf)?;
                g.flush()
            }
            FileSink::Closed => Err(io::Error::other("output already closed")),
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        match std::mem::replace(self, FileSink::Closed) {
            FileSink::Plain(mut f) => f.flush(),
            FileSink::Gzip(g) => g.finish()?.flush(),
            FileSink::Closed => Ok(()),
        }
    }
}

type Sink = Mutex<FileSink>;

fn open_sink(path: Option<PathBuf>, gzip: bool) -> Result<Option<Sink>> {
    let Some(p) = path else { return Ok(None) };
    let f = OpenOptions::new().create(true).write(true).truncate(true).open(p)?;
    let sink = if gzip { FileSink::Gzip(GzEncoder::new(f, Compression::default())) } else { FileSink::Plain(f) };
    Ok(Some(Mutex::new(sink)))
}

fn lock(f: &Sink) -> Result<std::sync::MutexGuard<'_, FileSink>> {
    f.lock().map_err(|_| GoodnsError::Output(io::Error::other("output lock poisoned")))
}

fn emit(file: &Option<Sink>, to_stdout: bool, text: &str) -> Result<()> {
    if to_stdout {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()?;
    }
    if let Some(f) = file {
        lock(f)?.write_all(text.as_bytes())?;
    }
    Ok(())
}

fn finish(file: &Option<Sink>) -> Result<()> {
    if let Some(f) = file {
        lock(f)?.finish()?;
    }
    Ok(())
}

pub struct PlainWriter {
    file: Option<Sink>,
    to_stdout: bool,
}

impl PlainWriter {
    pub fn new(path: Option<PathBuf>, to_stdout: bool, gzip: bool) -> Result<Self> {
        Ok(PlainWriter { file: open_sink(path, gzip)?, to_stdout })
    }
}

impl OutputWriter for PlainWriter {
    fn write(&self, r: &Report) -> Result<()> {
        emit(&self.file, self.to_stdout, &r.render_text())
    }

    fn close(&self) -> Result<()> { finish(&self.file) }
}

pub struct JsonWriter {
    file: Option<Sink>,
    to_stdout: bool,
}

impl JsonWriter {
    pub fn new(path: Option<PathBuf>, to_stdout: bool, gzip: bool) -> Result<Self> {
        Ok(JsonWriter { file: open_sink(path, gzip)?, to_stdout })
    }
}

impl OutputWriter for JsonWriter {
    fn write(&self, r: &Report) -> Result<()> {
        let mut line = serde_json::to_string_pretty(r).map_err(|e| GoodnsError::Output(e.into()))?;
        line.push('\n');
        emit(&self.file, self.to_stdout, &line)
    }

    fn close(&self) -> Result<()> { finish(&self.file) }
}

pub fn build_writers(path: Option<PathBuf>, output_type: &str, to_stdout: bool, gzip: bool) -> Result<Vec<Box<dyn OutputWriter>>> {
    let mut v: Vec<Box<dyn OutputWriter>> = Vec::new();
    match output_type {
        "txt" => v.push(Box::new(PlainWriter::new(path, to_stdout, gzip)?)),
        "json" => v.push(Box::new(JsonWriter::new(path, to_stdout, gzip)?)),
        other => return Err(GoodnsError::InvalidOption(format!("unsupported output type: {}", other))),
    }
    Ok(v)
}
