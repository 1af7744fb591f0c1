//! Utility functions for common operations.
//!
//! - **URL validation**: shape checks for configured sources and for links
//!   opened from the terminal client
//! - **Text processing**: HTML-to-text snippets, entity decoding, terminal
//!   sanitizing and width-aware truncation

mod text;
mod url_validator;

pub use text::{
    decode_entities, display_width, html_to_snippet, strip_control_chars, truncate_to_width,
};
pub use url_validator::{validate_url, validate_url_for_open, UrlValidationError};
