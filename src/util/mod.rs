//! Shared helpers.
//!
//! - **URL validation**: feed URLs must be public HTTP(S) hosts (SSRF guard)

mod url_validator;

pub use url_validator::{validate_url, UrlValidationError};
