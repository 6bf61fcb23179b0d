//! Date/time extraction: free-form GMT date and clock fragments to epoch seconds.
//!
//! All construction is UTC. Source announcements label their times "(GMT)",
//! and the wall-clock tuple is taken as-is, never shifted into a local zone.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use regex::Regex;

/// Length of a calendar day in seconds, used for next-day rollover.
pub const SECONDS_PER_DAY: i64 = 86_400;

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// Ante/post meridiem marker of a 12-hour clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    /// Parse `am`, `PM`, `a.m.`, `p. m.` and similar spellings.
    pub fn parse(text: &str) -> Option<Self> {
        let letters: String = text
            .chars()
            .filter(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match letters.as_str() {
            "am" => Some(Self::Am),
            "pm" => Some(Self::Pm),
            _ => None,
        }
    }
}

/// Resolve an English month name or abbreviation (case-insensitive) to 1-12.
pub fn month_number(name: &str) -> Option<u32> {
    let name = name.trim().trim_end_matches('.').to_ascii_lowercase();
    let month = match name.as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Convert a 12-hour clock hour (1-12) to 24-hour form.
///
/// `12am` is midnight (0) and `12pm` is noon (12).
pub fn to_24_hour(hour: u32, meridiem: Meridiem) -> Option<u32> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    Some(match (hour, meridiem) {
        (12, Meridiem::Am) => 0,
        (12, Meridiem::Pm) => 12,
        (h, Meridiem::Pm) => h + 12,
        (h, Meridiem::Am) => h,
    })
}

// ---------------------------------------------------------------------------
// Parsed components
// ---------------------------------------------------------------------------

/// A UTC wall-clock tuple, minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeParts {
    pub day: u32,
    /// 1-12.
    pub month: u32,
    pub year: i32,
    /// 0-23.
    pub hour: u32,
    /// 0-59.
    pub minute: u32,
}

impl DateTimeParts {
    /// Epoch seconds of this tuple read as UTC, or `None` when any field is out of range.
    pub fn timestamp(&self) -> Option<i64> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?
            .and_hms_opt(self.hour, self.minute, 0)
            .map(|dt| dt.and_utc().timestamp())
    }

    /// Break epoch seconds back into UTC components (seconds are dropped).
    pub fn from_timestamp(seconds: i64) -> Option<Self> {
        let dt = DateTime::from_timestamp(seconds, 0)?;
        Some(Self {
            day: dt.day(),
            month: dt.month(),
            year: dt.year(),
            hour: dt.hour(),
            minute: dt.minute(),
        })
    }
}

/// Build epoch seconds from raw captured strings.
///
/// Any unparseable number, unknown month, or out-of-range value yields `None`.
pub fn timestamp_from_parts(
    day: &str,
    month: &str,
    year: &str,
    hour: &str,
    minute: &str,
) -> Option<i64> {
    DateTimeParts {
        day: day.trim().parse().ok()?,
        month: month_number(month)?,
        year: year.trim().parse().ok()?,
        hour: hour.trim().parse().ok()?,
        minute: minute.trim().parse().ok()?,
    }
    .timestamp()
}

/// Whether two epoch-second instants share a UTC calendar date.
pub fn is_same_day(a: i64, b: i64) -> bool {
    match (DateTime::from_timestamp(a, 0), DateTime::from_timestamp(b, 0)) {
        (Some(a), Some(b)) => a.date_naive() == b.date_naive(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Free-form fragments
// ---------------------------------------------------------------------------

static WEEKDAY_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:mon|tues|wednes|thurs|fri|satur|sun)day|mon|tue|wed|thu|fri|sat|sun)\.?,?\s+")
        .expect("valid regex")
});

static DAY_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})(?:st|nd|rd|th)?\s+([A-Za-z]{3,9})\.?(?:,?\s+(\d{4}))?$").expect("valid regex")
});

static MONTH_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s+(\d{4}))?$").expect("valid regex")
});

static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})(?:\s*([AaPp]\.?\s?[Mm]\.?))?$").expect("valid regex")
});

/// Parse a calendar date such as `Oct. 7, 2025`, `6 November 2025`, or
/// `Thursday, 6 November 2025` into `(day, month, year)`.
///
/// A date without a year, such as `Friday, 31 October`, falls in the
/// current UTC year.
pub fn parse_date(text: &str) -> Option<(u32, u32, i32)> {
    parse_date_in(text, Utc::now().year())
}

/// [`parse_date`] with an explicit year for dates that omit one.
pub fn parse_date_in(text: &str, default_year: i32) -> Option<(u32, u32, i32)> {
    let text = text.trim().replace('\u{a0}', " ");
    let text = WEEKDAY_PREFIX_RE.replace(&text, "");

    let (day, month, year) = if let Some(caps) = DAY_FIRST_RE.captures(&text) {
        (caps[1].to_string(), caps[2].to_string(), caps.get(3))
    } else if let Some(caps) = MONTH_FIRST_RE.captures(&text) {
        (caps[2].to_string(), caps[1].to_string(), caps.get(3))
    } else {
        return None;
    };

    let year = match year {
        Some(year) => year.as_str().parse().ok()?,
        None => default_year,
    };
    Some((day.parse().ok()?, month_number(&month)?, year))
}

/// Parse a clock time such as `14:00`, `2:00pm`, or `12:30 a.m.` into 24-hour `(hour, minute)`.
pub fn parse_clock(text: &str) -> Option<(u32, u32)> {
    let caps = CLOCK_RE.captures(text.trim())?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;

    let hour = match caps.get(3) {
        Some(marker) => to_24_hour(hour, Meridiem::parse(marker.as_str())?)?,
        None => hour,
    };
    (hour < 24 && minute < 60).then_some((hour, minute))
}

/// Resolve a date fragment plus a clock fragment to epoch seconds.
pub fn resolve(date: &str, clock: &str) -> Option<i64> {
    let (day, month, year) = parse_date(date)?;
    let (hour, minute) = parse_clock(clock)?;
    DateTimeParts {
        day,
        month,
        year,
        hour,
        minute,
    }
    .timestamp()
}
