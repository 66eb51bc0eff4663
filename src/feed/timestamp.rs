//! Publication-date normalization.
//!
//! RSS `pubDate` values nominally follow RFC 822, but real feeds drift: some
//! drop the leading zero on the day, some use numeric offsets, some omit the
//! weekday. [`normalize_pub_date`] tries a fixed list of layouts in order and
//! returns the first match converted to UTC.

use chrono::{DateTime, FixedOffset, Utc, Weekday};
use thiserror::Error;

/// A `pubDate` that matched none of the accepted layouts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized publication date {raw:?} in channel {channel:?}")]
pub struct TimestampError {
    /// The string as it appeared in the feed
    pub raw: String,
    /// Title of the channel the item came from
    pub channel: String,
}

#[derive(Debug, Clone, Copy)]
enum Layout {
    /// `02 Jan 2006 15:04:05 MST`, `2 Jan 2006 15:04:05 -0700`: chrono's RFC 2822
    /// reader, which takes one- or two-digit days, numeric offsets and the
    /// UT/GMT/Z and North American zone names.
    Rfc2822,
    /// `02 Jan 2006 15:04:05 CEST`: any other alphabetic zone, read as +0000.
    UnknownZone,
}

/// Accepted layouts in priority order, applied after the weekday is split off.
const LAYOUTS: [Layout; 2] = [Layout::Rfc2822, Layout::UnknownZone];

impl Layout {
    fn parse(self, input: &str) -> Option<DateTime<FixedOffset>> {
        match self {
            Layout::Rfc2822 => DateTime::parse_from_rfc2822(input).ok(),
            Layout::UnknownZone => {
                let (date_time, zone) = input.rsplit_once(char::is_whitespace)?;
                if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
                    return None;
                }
                DateTime::parse_from_rfc2822(&format!("{} +0000", date_time)).ok()
            }
        }
    }
}

/// Drop a leading `Mon, `. The name must be a real weekday, but chrono would
/// also reject one that disagrees with the date, and feeds get that wrong.
fn strip_weekday(input: &str) -> Option<&str> {
    match input.split_once(',') {
        Some((weekday, rest)) => {
            weekday.trim().parse::<Weekday>().ok()?;
            Some(rest.trim_start())
        }
        None => Some(input),
    }
}

/// Parse an item's `pubDate` into UTC.
///
/// Surrounding whitespace is ignored. `channel` is only used to make the
/// error readable in logs.
///
/// # Errors
///
/// Returns [`TimestampError`] carrying the raw string when no layout matches.
pub fn normalize_pub_date(raw: &str, channel: &str) -> Result<DateTime<Utc>, TimestampError> {
    strip_weekday(raw.trim())
        .and_then(|rest| LAYOUTS.iter().find_map(|layout| layout.parse(rest)))
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| TimestampError {
            raw: raw.to_string(),
            channel: channel.to_string(),
        })
}
