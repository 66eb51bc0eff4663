//! RSS retrieval: HTTP fetch, XML document parsing, and publication-date
//! normalization.
//!
//! - [`fetch_feed`] - one cancellable GET, bounded body read, parse, entity decoding
//! - [`parse_document`] - RSS 2.0 XML to [`FeedDocument`]
//! - [`normalize_pub_date`] - multi-layout `pubDate` parsing to UTC

mod document;
mod fetcher;
mod timestamp;

pub use document::{parse_document, DocumentError, FeedDocument, FeedItem};
pub use fetcher::{build_client, fetch_feed, FetchError, USER_AGENT};
pub use timestamp::{normalize_pub_date, TimestampError};
