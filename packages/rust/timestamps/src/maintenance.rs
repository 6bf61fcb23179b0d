//! Start/end extraction for maintenance announcements.

use std::sync::LazyLock;

use lodestone_shared::MaintenanceTimestamps;
use regex::{Captures, Regex};
use tracing::{debug, instrument};

use crate::extract::{self, SECONDS_PER_DAY};
use crate::patterns::{GMT, SP, at, date, time, weekday_date};

/// One phrasing the extractor recognises.
///
/// Patterns name their groups `sdate`/`stime` and optionally `edate`/`etime`.
/// A missing `edate` means the end shares the start's date.
struct WindowPattern {
    name: &'static str,
    regex: Regex,
    /// Push an end at or before the start onto the next day.
    rollover: bool,
}

static BR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static MERIDIEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<hour>\d{1,2}):(?P<minute>\d{2})\s*[AaPp]\.?[Mm]\b\.?").expect("valid regex")
});

static PATTERNS: LazyLock<Vec<WindowPattern>> = LazyLock::new(|| {
    let from = format!(r"(?:(?i:from){SP})?");
    let to = format!(r"{SP}(?:(?i:to|until)|[-–]){SP}");
    let entry = |name: &'static str, pattern: String, rollover: bool| WindowPattern {
        name,
        regex: Regex::new(&pattern)
            .unwrap_or_else(|e| panic!("maintenance pattern {name} is invalid: {e}")),
        rollover,
    };

    vec![
        entry(
            "full_range",
            format!(
                r"{from}{sd}{at}{st}(?:{GMT})?{to}{ed}{at}{et}{GMT}",
                sd = date("sdate"),
                at = at(),
                st = time("stime"),
                ed = date("edate"),
                et = time("etime"),
            ),
            false,
        ),
        entry(
            "shared_date_range",
            format!(
                r"{from}{sd}{at}{st}{to}{et}{GMT}",
                sd = date("sdate"),
                at = at(),
                st = time("stime"),
                et = time("etime"),
            ),
            true,
        ),
        entry(
            "weekday_until",
            format!(
                r"{sd}{SP}(?i:at){SP}{st}{GMT}.*?(?i:until).*?{ed}{SP}(?i:at){SP}{et}{GMT}",
                sd = weekday_date("sdate"),
                st = time("stime"),
                ed = weekday_date("edate"),
                et = time("etime"),
            ),
            false,
        ),
        entry(
            "between",
            format!(
                r"{sd}{SP}(?i:between){SP}{st}{SP}(?i:and){SP}{et}{GMT}",
                sd = date("sdate"),
                st = time("stime"),
                et = time("etime"),
            ),
            false,
        ),
        entry(
            "date_from_to",
            format!(
                r"{sd}{SP}(?i:from){SP}{st}{to}{et}{GMT}",
                sd = date("sdate"),
                st = time("stime"),
                et = time("etime"),
            ),
            true,
        ),
        entry(
            "weekday_single",
            format!(
                r"{sd}{at}{st}{GMT}",
                sd = weekday_date("sdate"),
                at = at(),
                st = time("stime"),
            ),
            false,
        ),
        entry(
            "date_at",
            format!(
                r"{sd}{SP}(?i:at){SP}{st}{GMT}",
                sd = date("sdate"),
                st = time("stime"),
            ),
            false,
        ),
        entry(
            "date_from_open",
            format!(
                r"{sd}{SP}(?i:from){SP}{st}{GMT}",
                sd = date("sdate"),
                st = time("stime"),
            ),
            false,
        ),
        entry(
            "time_on_date",
            format!(
                r"{st}{GMT}{SP}(?i:on){SP}{sd}",
                st = time("stime"),
                sd = date("sdate"),
            ),
            false,
        ),
        entry(
            "date_time",
            format!(
                r"{sd}{SP}{st}{GMT}",
                sd = date("sdate"),
                st = time("stime"),
            ),
            false,
        ),
    ]
});

/// Flatten announcement HTML to one line of text with 24-hour times.
fn flatten(html: &str) -> String {
    let text = BR_RE.replace_all(html, "\n");
    let text = TAG_RE.replace_all(&text, " ");
    let text = text.replace("&nbsp;", " ").replace('\u{a0}', " ");
    let text = WS_RE.replace_all(&text, " ");
    MERIDIEM_RE
        .replace_all(&text, |caps: &Captures<'_>| {
            let hour: u32 = caps["hour"].parse().unwrap_or(0);
            if hour == 0 || hour > 12 {
                format!("{}:{}", &caps["hour"], &caps["minute"])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

fn window_from(pattern: &WindowPattern, caps: &Captures<'_>) -> Option<MaintenanceTimestamps> {
    let start = extract::resolve(&caps["sdate"], &caps["stime"])?;
    let end = match caps.name("etime") {
        Some(etime) => {
            let edate = caps.name("edate").or_else(|| caps.name("sdate"))?;
            let end = extract::resolve(edate.as_str(), etime.as_str())?;
            Some(if pattern.rollover && end <= start { end + SECONDS_PER_DAY } else { end })
        }
        None => None,
    };
    Some(MaintenanceTimestamps {
        start_timestamp: Some(start),
        end_timestamp: end,
    })
}

/// Best-effort maintenance window from an announcement body.
///
/// Phrasings are tried in a fixed order and the first one that yields a valid
/// start wins. Values are epoch seconds; both fields are `None` when nothing
/// matched.
#[instrument(skip(html), fields(len = html.len()))]
pub fn extract_maintenance_timestamps(html: &str) -> MaintenanceTimestamps {
    let text = flatten(html);

    for pattern in PATTERNS.iter() {
        for caps in pattern.regex.captures_iter(&text) {
            if let Some(window) = window_from(pattern, &caps) {
                debug!(pattern = pattern.name, ?window, "maintenance window found");
                return window;
            }
        }
    }

    debug!("no maintenance window found");
    MaintenanceTimestamps::default()
}
