//! Normalization of feed timestamps into a single, timezone-naive form.
//!
//! Feeds publish dates in whatever format their generator happens to use.
//! Everything is folded into a [`NaiveDateTime`]: any offset or zone name in
//! the input is dropped after parsing, never applied. Comparisons are only
//! meaningful against a "now" computed the same way.

use crate::types::{CrawlerError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;
use std::str::FromStr;

/// Free formats that carry a numeric offset. Tried after RFC 2822 / RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
    "%b %d, %Y %H:%M:%S %z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%b %d, %Y %H:%M:%S",
    "%b %d, %Y %H:%M",
    "%b %d %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%b %d, %Y", "%b %d %Y"];

const WEEKDAYS: &[&str] = &[
    "mon", "tue", "wed", "thu", "fri", "sat", "sun",
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// A parsed, offset-free point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedTimestamp(NaiveDateTime);

impl NormalizedTimestamp {
    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// ISO-8601 without offset. Microseconds are appended only when present.
    pub fn to_iso_string(&self) -> String {
        if self.0.nanosecond() == 0 {
            self.0.format("%Y-%m-%dT%H:%M:%S").to_string()
        } else {
            self.0.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
        }
    }
}

impl From<NaiveDateTime> for NormalizedTimestamp {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

impl fmt::Display for NormalizedTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

impl FromStr for NormalizedTimestamp {
    type Err = CrawlerError;

    fn from_str(s: &str) -> Result<Self> {
        TimestampNormalizer::parse(s)
    }
}

pub struct TimestampNormalizer;

impl TimestampNormalizer {
    pub fn parse(raw: &str) -> Result<NormalizedTimestamp> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CrawlerError::MalformedTimestamp { raw: raw.to_string() });
        }

        Self::parse_standard(trimmed)
            .or_else(|| Self::parse_free(strip_weekday(trimmed)))
            .map(NormalizedTimestamp)
            .ok_or_else(|| CrawlerError::MalformedTimestamp { raw: raw.to_string() })
    }

    fn parse_standard(s: &str) -> Option<NaiveDateTime> {
        DateTime::parse_from_rfc2822(s)
            .or_else(|_| DateTime::parse_from_rfc3339(s))
            .ok()
            .map(|dt| dt.naive_local())
    }

    fn parse_free(s: &str) -> Option<NaiveDateTime> {
        if let Some(dt) = OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
        {
            return Some(dt.naive_local());
        }

        parse_naive(s).or_else(|| strip_zone_name(s).and_then(parse_naive))
    }
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Drops a leading day name such as `Tue,` so a wrong weekday can't fail the parse.
fn strip_weekday(s: &str) -> &str {
    let Some((head, rest)) = s.split_once(|c: char| c == ',' || c.is_whitespace()) else {
        return s;
    };
    if WEEKDAYS.contains(&head.to_ascii_lowercase().as_str()) {
        rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace())
    } else {
        s
    }
}

/// Drops a trailing alphabetic zone token (`UTC`, `JST`, ...).
fn strip_zone_name(s: &str) -> Option<&str> {
    let (rest, zone) = s.rsplit_once(char::is_whitespace)?;
    if !zone.is_empty() && zone.len() <= 5 && zone.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(rest.trim_end())
    } else {
        None
    }
}
