//! Utility functions shared by the fetcher and the command layer.
//!
//! - **Text cleaning**: entity decoding and control-character stripping for
//!   feed-supplied text, plus width-aware truncation for terminal output
//! - **URL validation**: checks applied to feed URLs entered by users

mod text;
mod url_validator;

pub use text::{clean_text, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_feed_url, UrlValidationError};
