//! Feed retrieval and parsing.
//!
//! - [`parser`] - RSS/Atom parsing via `feed-rs` into a [`RawFeedDocument`],
//!   with entity decoding and absent-vs-empty normalization of text fields
//! - [`fetcher`] - single-shot HTTP retrieval with timeout and size limit
//!
//! ```ignore
//! let fetcher = FeedFetcher::new(DEFAULT_USER_AGENT, DEFAULT_FETCH_TIMEOUT)?;
//! let doc = fetcher.fetch("https://blog.boot.dev/index.xml").await?;
//! for item in &doc.items {
//!     println!("{:?}", item.title);
//! }
//! ```

mod fetcher;
mod parser;

pub use fetcher::{FeedFetcher, FetchError, DEFAULT_FETCH_TIMEOUT, DEFAULT_USER_AGENT};
pub use parser::{parse_feed, RawFeedDocument, RawItem};
