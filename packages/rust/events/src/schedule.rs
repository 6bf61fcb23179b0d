//! Event schedules from event page meta descriptions.

use std::sync::LazyLock;

use lodestone_timestamps::resolve;
use regex::Regex;
use scraper::Html;
use tracing::debug;

use crate::page::{DESCRIPTION_SEL, meta_content};
use crate::{EventTimeframe, EventType};

static GMT_TAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*\(?GMT\)?.*$").expect("valid regex"));
static AT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+at\s+").expect("valid regex"));
static DATE_CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<date>.+?)\s+(?P<clock>\d{1,2}:\d{2})\b").expect("valid regex")
});

static TROVE_FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)From\s+(.+?)\s+\(?GMT\)?").expect("valid regex"));
static SPECIAL_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)From\s+(?P<from>.+?)\s+\(?GMT\)?.*?\s+to\s+(?P<to>.+?)(?:\s+\(?GMT\)?|$)")
        .expect("valid regex")
});
static TRAILING_PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^()]*\)\s*$").expect("valid regex"));
static OPEN_PAREN_TAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(.*$").expect("valid regex"));

/// Parse a GMT date-time phrase to epoch milliseconds.
///
/// Accepts an optional weekday, day-first or month-first dates, an optional
/// "at", and anything from a "GMT" marker onwards is ignored:
/// `Wednesday, 31 December 2025 at 15:00 GMT`, `Monday, February 2, 2026 at 8:00 (GMT)`,
/// `31 December 2025 15:00`, `February 2 2026 8:00`.
pub fn parse_gmt_date(text: &str) -> Option<i64> {
    let cleaned = GMT_TAIL_RE.replace(text.trim(), "");
    let cleaned = AT_RE.replace(cleaned.trim(), " ");
    let caps = DATE_CLOCK_RE.captures(cleaned.trim())?;
    resolve(&caps["date"], &caps["clock"]).map(|seconds| seconds * 1000)
}

/// Read an event's schedule from its page HTML.
///
/// The page's meta description must contain "Event Schedule". Trove events
/// run until a patch release, so only their start is returned.
pub fn parse_event_timeframe(html: &str, event_type: EventType) -> Option<EventTimeframe> {
    let doc = Html::parse_document(html);
    let content = meta_content(&doc, &DESCRIPTION_SEL)?;
    if !content.contains("Event Schedule") {
        return None;
    }

    let frame = match event_type {
        EventType::MoogleTreasureTrove => {
            let caps = TROVE_FROM_RE.captures(&content)?;
            EventTimeframe {
                event_type,
                from: parse_gmt_date(caps[1].trim())?,
                to: None,
            }
        }
        EventType::SpecialEvent => {
            let caps = SPECIAL_RANGE_RE.captures(&content)?;
            let from = TRAILING_PAREN_RE.replace(caps["from"].trim(), "");
            let to = OPEN_PAREN_TAIL_RE.replace(caps["to"].trim(), "");
            EventTimeframe {
                event_type,
                from: parse_gmt_date(&from)?,
                to: Some(parse_gmt_date(&to)?),
            }
        }
    };

    debug!(?frame, "event schedule parsed");
    Some(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(date: &str, clock: &str) -> i64 {
        resolve(date, clock).unwrap() * 1000
    }

    fn page(description: &str) -> String {
        format!(r#"<html><head><meta name="description" content="{description}"></head></html>"#)
    }

    #[test]
    fn gmt_date_formats() {
        let expected = ms("31 December 2025", "15:00");
        assert_eq!(parse_gmt_date("Wednesday, 31 December 2025 at 15:00 GMT"), Some(expected));
        assert_eq!(parse_gmt_date("31 December 2025 15:00"), Some(expected));

        let expected = ms("February 2, 2026", "8:00");
        assert_eq!(parse_gmt_date("Monday, February 2, 2026 at 8:00 (GMT)"), Some(expected));
        assert_eq!(parse_gmt_date("February 2, 2026 8:00"), Some(expected));
        assert_eq!(parse_gmt_date("February 2 2026 8:00"), Some(expected));
        assert_eq!(parse_gmt_date("2 Sept 2026 8:00"), Some(ms("2 September 2026", "8:00")));
    }

    #[test]
    fn gmt_date_rejects_garbage() {
        assert_eq!(parse_gmt_date("the release of Patch 7.3"), None);
        assert_eq!(parse_gmt_date("31 Smarch 2025 15:00"), None);
        assert_eq!(parse_gmt_date(""), None);
    }

    #[test]
    fn special_event_range() {
        let html = page(
            "Event Schedule / From Wednesday, 31 December 2025 at 15:00 GMT (2:00 AEDT) to Thursday, 15 January 2026 at 14:59 GMT",
        );
        let frame = parse_event_timeframe(&html, EventType::SpecialEvent).unwrap();
        assert_eq!(frame.from, ms("31 December 2025", "15:00"));
        assert_eq!(frame.to, Some(ms("15 January 2026", "14:59")));
    }

    #[test]
    fn special_event_range_with_parenthesised_gmt() {
        let html = page(
            "Event Schedule / From Monday, February 2, 2026 at 8:00 (GMT) to Monday, February 16, 2026 at 14:59 (GMT)",
        );
        let frame = parse_event_timeframe(&html, EventType::SpecialEvent).unwrap();
        assert_eq!(frame.from, ms("February 2, 2026", "8:00"));
        assert_eq!(frame.to, Some(ms("February 16, 2026", "14:59")));
    }

    #[test]
    fn trove_has_open_end() {
        let html = page(
            "Event Schedule / From Tuesday, 8 July 2025 at 8:00 GMT (18:00 AEST) to the release of Patch 7.3",
        );
        let frame = parse_event_timeframe(&html, EventType::MoogleTreasureTrove).unwrap();
        assert_eq!(frame.event_type, EventType::MoogleTreasureTrove);
        assert_eq!(frame.from, ms("8 July 2025", "8:00"));
        assert_eq!(frame.to, None);
    }

    #[test]
    fn missing_schedule_yields_none() {
        assert_eq!(parse_event_timeframe(&page("News"), EventType::SpecialEvent), None);
        assert_eq!(parse_event_timeframe("<html></html>", EventType::SpecialEvent), None);
    }
}
