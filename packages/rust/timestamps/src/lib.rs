//! GMT date extraction and Discord timestamp rewriting for Lodestone text.
//!
//! - [`extract`]: date/clock fragments to UTC epoch seconds
//! - [`rewrite`]: the ordered rule table behind [`convert_dates_to_discord_timestamps`]
//! - [`maintenance`]: start/end window of maintenance announcements

pub mod extract;
pub mod maintenance;
mod patterns;
pub mod rewrite;

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

pub use extract::{
    DateTimeParts, Meridiem, SECONDS_PER_DAY, is_same_day, month_number, resolve,
    timestamp_from_parts, to_24_hour,
};
pub use maintenance::extract_maintenance_timestamps;
pub use rewrite::{Rule, RuleKind, convert_dates_to_discord_timestamps, rules};

static LIVE_LETTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)date\s*(?:&amp;|&|and)\s*time.*?<t:(\d+):[tTdDfFR]>").expect("valid regex")
});

/// Broadcast start of a Live Letter, in epoch milliseconds.
///
/// Looks for a "Date & Time" label and takes the first timestamp tag after it,
/// so the input is expected to have been through the rewriter already.
pub fn extract_live_letter_timestamp(markdown: &str) -> Option<i64> {
    let caps = LIVE_LETTER_RE.captures(markdown)?;
    let seconds: i64 = caps[1].parse().ok()?;
    debug!(seconds, "live letter start found");
    seconds.checked_mul(1000)
}
