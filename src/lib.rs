//! Passive sub-domain discovery: candidate host names are fed to the
//! omnibox suggestion endpoint of every regional service variant, and
//! navigational suggestions inside the target domain are collected.

pub mod candidates;
pub mod cli;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod options;
pub mod output;
pub mod runner;
pub mod scanner;
pub mod suggest;
pub mod tlds;

pub use error::{GoodnsError, Result};
