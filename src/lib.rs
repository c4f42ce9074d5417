//! gator: a command-line RSS/Atom aggregator.
//!
//! Users register feeds and follow them; `gator agg` then ingests one feed per
//! tick, stalest first, storing each item as a post deduplicated by URL.

pub mod commands;
pub mod config;
pub mod feed;
pub mod scrape;
pub mod storage;
pub mod util;
