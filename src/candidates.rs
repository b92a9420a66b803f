//! Candidate generation: word lists and brute-force prefixes.

use crate::error::{GoodnsError, Result};
use crate::tlds::TldSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Characters allowed in a generated prefix, in enumeration order.
pub const PREFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789-";

/// Word-list lines starting with this are never queried.
const SKIP_MARKER: char = '-';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub tld: String,
    pub domain: String,
    /// `<prefix>.<domain>`
    pub query: String,
}

/// All candidates for one prefix, one per TLD.
#[derive(Debug, Clone)]
pub struct Batch {
    pub prefix: String,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone)]
pub enum PrefixSource {
    WordList(Vec<String>),
    Combinatorial { max_len: usize },
}

impl PrefixSource {
    /// Read a word list, one prefix per line.
    pub fn from_wordlist(path: &Path) -> Result<Self> {
        let err = |source: std::io::Error| GoodnsError::Wordlist { path: path.to_path_buf(), source };
        let f = File::open(path).map_err(err)?;
        let mut words = Vec::new();
        for line in BufReader::new(f).lines() {
            words.push(line.map_err(err)?);
        }
        Ok(Self::from_words(words))
    }

    pub fn from_words<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = lines
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty() && !l.starts_with(SKIP_MARKER))
            .collect();
        PrefixSource::WordList(words)
    }

    /// A fresh iterator over prefixes; calling again restarts from the beginning.
    pub fn prefixes(&self) -> Box<dyn Iterator<Item = String> + Send + '_> {
        match self {
            PrefixSource::WordList(words) => Box::new(words.iter().cloned()),
            PrefixSource::Combinatorial { max_len } => Box::new(
                (1..=*max_len).flat_map(|len| PrefixIter::new(len).filter(|p| !p.starts_with(SKIP_MARKER))),
            ),
        }
    }

    pub fn total_prefixes(&self) -> u64 {
        match self {
            PrefixSource::WordList(words) => words.len() as u64,
            PrefixSource::Combinatorial { max_len } => {
                let base = PREFIX_ALPHABET.len() as u64;
                let allowed_first = base - 1;
                (1..=*max_len as u32)
                    .map(|n| allowed_first.saturating_mul(base.saturating_pow(n - 1)))
                    .fold(0u64, |acc, n| acc.saturating_add(n))
            }
        }
    }

    /// One batch per prefix, in generator order.
    pub fn batches<'a>(&'a self, domain: &'a str, tlds: &'a TldSet) -> impl Iterator<Item = Batch> + Send + 'a {
        self.prefixes().map(move |prefix| {
            let query = format!("{}.{}", prefix, domain);
            let candidates = tlds
                .iter()
                .map(|tld| Candidate { tld: tld.to_string(), domain: domain.to_string(), query: query.clone() })
                .collect();
            Batch { prefix, candidates }
        })
    }
}

/// Odometer over every string of a fixed length drawn from [`PREFIX_ALPHABET`],
/// in lexicographic alphabet order (rightmost position changes fastest).
struct PrefixIter {
    digits: Vec<usize>,
    done: bool,
}

impl PrefixIter {
    fn new(len: usize) -> Self {
        Self { digits: vec![0; len], done: len == 0 }
    }
}

impl Iterator for PrefixIter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done { return None; }
        let out: String = self.digits.iter().map(|&d| PREFIX_ALPHABET[d] as char).collect();
        // advance
        let mut pos = self.digits.len();
        loop {
            if pos == 0 {
                self.done = true;
                break;
            }
            pos -= 1;
            self.digits[pos] += 1;
            if self.digits[pos] < PREFIX_ALPHABET.len() { break; }
            self.digits[pos] = 0;
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tlds(list: &[&str]) -> TldSet {
        TldSet::from_entries(list.iter().copied()).unwrap()
    }

    #[test]
    fn wordlist_skips_blank_and_marked() {
        let src = PrefixSource::from_words(["www", "", "  ", "-admin", " mail ", "-"]);
        assert_eq!(src.prefixes().collect::<Vec<_>>(), vec!["www", "mail"]);
        assert_eq!(src.total_prefixes(), 2);
    }

    #[test]
    fn combinatorial_counts() {
        let src = PrefixSource::Combinatorial { max_len: 2 };
        let all: Vec<String> = src.prefixes().collect();
        let len1 = all.iter().filter(|p| p.len() == 1).count();
        let len2 = all.iter().filter(|p| p.len() == 2).count();
        assert_eq!(len1, 36);
        assert_eq!(len2, 37 * 37 - 37);
        assert_eq!(src.total_prefixes(), all.len() as u64);
        assert!(all.iter().all(|p| !p.starts_with('-')));
    }

    #[test]
    fn combinatorial_order() {
        let src = PrefixSource::Combinatorial { max_len: 2 };
        let all: Vec<String> = src.prefixes().collect();
        assert_eq!(all[0], "a");
        assert_eq!(all[35], "9");
        assert_eq!(all[36], "aa");
        assert_eq!(all[37], "ab");
        assert_eq!(all[36 + 36], "a-");
        assert_eq!(all.last().unwrap(), "9-");
        // "-" alone never appears, but a trailing hyphen does
        assert!(!all.contains(&"-".to_string()));
        assert!(all.contains(&"z-".to_string()));
    }

    #[test]
    fn generation_is_restartable() {
        let src = PrefixSource::Combinatorial { max_len: 2 };
        let a: Vec<String> = src.prefixes().collect();
        let b: Vec<String> = src.prefixes().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn batches_fan_out_over_tlds() {
        let src = PrefixSource::from_words(["www", "mail"]);
        let set = tlds(&["com", "co.uk"]);
        let batches: Vec<Batch> = src.batches("example.com", &set).collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].prefix, "www");
        assert_eq!(
            batches[0].candidates,
            vec![
                Candidate { tld: "com".into(), domain: "example.com".into(), query: "www.example.com".into() },
                Candidate { tld: "co.uk".into(), domain: "example.com".into(), query: "www.example.com".into() },
            ]
        );
        assert_eq!(batches[1].candidates[1].query, "mail.example.com");
    }

    #[test]
    fn wordlist_from_file() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "www\n-admin\n\nmail").unwrap();
        let src = PrefixSource::from_wordlist(f.path()).unwrap();
        assert_eq!(src.prefixes().collect::<Vec<_>>(), vec!["www", "mail"]);
    }

    #[test]
    fn missing_wordlist_is_error() {
        let err = PrefixSource::from_wordlist(Path::new("/nonexistent/goodns-words.txt")).unwrap_err();
        assert!(matches!(err, GoodnsError::Wordlist { .. }));
    }
}
