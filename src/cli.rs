use crate::options::{Options, ScanMode};
use crate::scanner::DEFAULT_CONCURRENCY;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "goodns - passive sub-domain discovery through search suggestions",
    after_help = "Examples:\n  goodns example.com -c 2\n  goodns example.com -w words.txt -l com -l co.uk -o found.txt\n\nExit status: 0 completed, 2 flagged by the service (partial results printed), 1 invalid configuration."
)]
pub struct Cli {
    /// Target domain
    #[arg(value_name = "DOMAIN")]
    pub domain: String,

    /// Brute-force every prefix up to this length (ignored with --wordlist)
    #[arg(short = 'c', long = "prefix-length", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub prefix_length: u32,

    /// Word list of prefixes; lines starting with '-' are skipped
    #[arg(short = 'w', long = "wordlist")]
    pub wordlist: Option<PathBuf>,

    /// Service TLD to query (e.g. 'ca' or 'co.uk'), repeatable; default is all
    #[arg(short = 'l', long = "tld")]
    pub tlds: Vec<String>,

    /// Concurrent requests per batch
    #[arg(short = 'j', long = "concurrency", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Per-request timeout (seconds)
    #[arg(long = "timeout", default_value_t = 10)]
    pub timeout: u64,

    /// Output file; a .gz suffix enables gzip
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output type: txt/json
    #[arg(long = "output-type", default_value = "txt", value_parser = ["txt", "json"])]
    pub output_type: String,

    /// Force gzip compression of the output file
    #[arg(long = "gzip")]
    pub gzip: bool,

    /// Do not print the report to stdout
    #[arg(long = "not-print", alias = "np")]
    pub not_print: bool,

    /// Skip downloading the supported domains list and use the built-in one
    #[arg(long = "offline")]
    pub offline: bool,

    /// Suggestion endpoint, `{tld}` is substituted per request
    #[arg(long = "base-url", default_value = crate::suggest::DEFAULT_BASE_URL, hide = true)]
    pub base_url: String,

    /// Log level: error|warn|info|debug|trace
    #[arg(long = "log-level", default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,
}

impl Cli {
    pub fn to_options(&self) -> Options {
        let mode = match &self.wordlist {
            Some(p) => ScanMode::WordList(p.clone()),
            None => ScanMode::Prefix { max_len: self.prefix_length as usize },
        };
        let mut opt = Options::new(self.domain.clone(), mode);
        opt.tlds = self.tlds.clone();
        opt.concurrency = self.concurrency;
        opt.timeout = Duration::from_secs(self.timeout.max(1));
        opt.base_url = self.base_url.clone();
        opt.output = self.output.clone();
        opt.output_type = self.output_type.clone();
        opt.gzip = self.gzip;
        opt.not_print = self.not_print;
        opt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wordlist_selects_wordlist_mode() {
        let cli = Cli::parse_from(["goodns", "example.com", "-w", "words.txt", "-l", "com", "-l", "ca", "-c", "3"]);
        let opt = cli.to_options();
        assert_eq!(opt.mode, ScanMode::WordList(PathBuf::from("words.txt")));
        assert_eq!(opt.tlds, vec!["com".to_string(), "ca".to_string()]);
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["goodns", "example.com"]);
        let opt = cli.to_options();
        assert_eq!(opt.mode, ScanMode::Prefix { max_len: 1 });
        assert!(opt.tlds.is_empty());
        assert_eq!(opt.concurrency, 32);
        assert_eq!(opt.output_type, "txt");
    }

    #[test]
    fn zero_prefix_length_rejected() {
        assert!(Cli::try_parse_from(["goodns", "example.com", "-c", "0"]).is_err());
    }
}
