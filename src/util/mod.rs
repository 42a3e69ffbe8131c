//! Utility functions for common operations.
//!
//! - **Text processing**: HTML entity decoding for feed text, control
//!   character stripping for terminal output
//! - **URL validation**: checks on feed URLs before they are stored
//!
//! # Examples
//!
//! ```
//! use gator::util::{unescape_html, validate_feed_url};
//!
//! assert_eq!(unescape_html("Tom &amp; Jerry"), "Tom & Jerry");
//! assert!(validate_feed_url("https://example.com/feed.xml").is_ok());
//! ```

mod text;
mod url_validator;

pub use text::{strip_control_chars, unescape_html};
pub use url_validator::{validate_feed_url, UrlValidationError};
