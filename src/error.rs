use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GoodnsError {
    /// Operator asked for TLDs the service does not serve. Raised before any query is sent.
    #[error("invalid TLD(s) specified: {}", .0.join(", "))]
    InvalidTlds(Vec<String>),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("cannot read word list {}: {source}", path.display())]
    Wordlist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("output: {0}")]
    Output(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, GoodnsError>;
