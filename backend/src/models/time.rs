//! Clock-time parsing and start-time resolution.
//!
//! Schedule and trip feeds carry display-formatted clock strings such as
//! `"9:05 AM"` or `"14:30:00"`. Everything downstream compares minutes since
//! midnight, so this module turns those strings into `u32` offsets and derives
//! a start time for a class or group when the schedule leaves it blank.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Minutes in a day; every parsed value is below this.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

const CLOCK_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

fn parse_naive_clock(raw: &str) -> Option<NaiveTime> {
    CLOCK_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}

fn to_minutes(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Split a trailing meridiem marker (`AM`, `PM`, `A`, `P`, any case).
/// Returns the remaining text and whether the marker was PM.
fn split_meridiem(raw: &str) -> Option<(&str, bool)> {
    let upper = raw.to_ascii_uppercase();
    for (suffix, pm) in [("AM", false), ("PM", true), ("A", false), ("P", true)] {
        if upper.ends_with(suffix) {
            let rest = raw[..raw.len() - suffix.len()].trim_end();
            return Some((rest, pm));
        }
    }
    None
}

/// Parse a display clock string into minutes since midnight.
///
/// Accepts 12-hour `H:MM AM/PM` and 24-hour `HH:MM[:SS]`. ISO-style
/// timestamps (`2024-06-10T09:05:00`) are also accepted and read as local
/// wall-clock time. Anything else yields `None`.
pub fn parse_clock(display: &str) -> Option<u32> {
    let raw = display.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some((rest, pm)) = split_meridiem(raw) {
        let time = parse_naive_clock(rest)?;
        let hour12 = time.hour();
        if !(1..=12).contains(&hour12) {
            return None;
        }
        let hour = hour12 % 12 + if pm { 12 } else { 0 };
        return Some(hour * 60 + time.minute());
    }

    if let Some(time) = parse_naive_clock(raw) {
        return Some(to_minutes(time));
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(to_minutes(dt.naive_local().time()));
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| to_minutes(dt.time()))
}

/// Render minutes since midnight as zero-padded `HH:MM`.
pub fn format_minutes(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// A resolved start time. Both fields are `None` when nothing resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTime {
    pub minutes: Option<u32>,
    pub display: Option<String>,
}

impl ResolvedTime {
    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn from_minutes(minutes: u32) -> Self {
        Self {
            minutes: Some(minutes),
            display: Some(format_minutes(minutes)),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.minutes.is_some()
    }
}

/// Resolve a start time from an explicit schedule value, falling back to the
/// earliest of the candidate go-times.
///
/// An explicit value that parses keeps its original display text. A fallback
/// value is displayed as `HH:MM`.
pub fn resolve_group_time<'a, I>(explicit: Option<&str>, candidate_go_times: I) -> ResolvedTime
where
    I: IntoIterator<Item = &'a str>,
{
    resolve_with_minutes(
        explicit,
        candidate_go_times.into_iter().filter_map(parse_clock),
    )
}

/// Same as [`resolve_group_time`] for candidates that are already parsed.
pub fn resolve_with_minutes<I>(explicit: Option<&str>, candidate_minutes: I) -> ResolvedTime
where
    I: IntoIterator<Item = u32>,
{
    if let Some(text) = explicit {
        if let Some(minutes) = parse_clock(text) {
            return ResolvedTime {
                minutes: Some(minutes),
                display: Some(text.trim().to_string()),
            };
        }
    }

    candidate_minutes
        .into_iter()
        .min()
        .map(ResolvedTime::from_minutes)
        .unwrap_or_default()
}
