//! Ordered rewrite rules that turn GMT date phrasings into Discord timestamp tags.
//!
//! The rule table is evaluated top to bottom. Each rule runs over the whole
//! text produced by the previous one, so the more specific phrasings sit
//! earlier in the table and consume their spans before the general ones run.
//! A rule whose handler returns `None` leaves that match untouched.

use std::borrow::Cow;
use std::sync::LazyLock;

use lodestone_shared::{TimestampStyle, TimestampTag};
use regex::{Captures, Regex};
use tracing::{instrument, trace};

use crate::extract::{self, SECONDS_PER_DAY};
use crate::patterns::{GMT, SP, TAG, ZONED_CLOCK, at, date, time, time_12h, weekday_date};

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// Match handler: returns the replacement, or `None` to keep the original text.
pub type Rewrite = fn(&Captures<'_>) -> Option<String>;

/// What a rule does to the text.
pub enum RuleKind {
    /// Replace every match of `regex` through `rewrite`.
    Pattern { regex: Regex, rewrite: Rewrite },
    /// Transform the whole text at once (line-oriented passes).
    Text(fn(&str) -> String),
}

/// A named entry of the rewrite table.
pub struct Rule {
    pub name: &'static str,
    pub kind: RuleKind,
}

impl Rule {
    fn pattern(name: &'static str, pattern: &str, rewrite: Rewrite) -> Self {
        let regex = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("rewrite rule {name} has an invalid pattern: {e}"));
        Self {
            name,
            kind: RuleKind::Pattern { regex, rewrite },
        }
    }

    fn text(name: &'static str, pass: fn(&str) -> String) -> Self {
        Self {
            name,
            kind: RuleKind::Text(pass),
        }
    }

    /// Apply this rule to `text`.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match &self.kind {
            RuleKind::Pattern { regex, rewrite } => regex.replace_all(text, |caps: &Captures<'_>| {
                rewrite(caps).unwrap_or_else(|| caps[0].to_string())
            }),
            RuleKind::Text(pass) => Cow::Owned(pass(text)),
        }
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(build_rules);

/// The rewrite table, in evaluation order.
pub fn rules() -> &'static [Rule] {
    &RULES
}

fn build_rules() -> Vec<Rule> {
    let from = format!(r"(?P<from>(?i:from){SP})?");
    let range_joiner = format!(r"{SP}(?:(?i:to|until)|[-–]){SP}");

    vec![
        // 1. 24-hour values carrying a stray am/pm.
        Rule::pattern(
            "strip_24h_meridiem",
            r"\b(?P<hour>\d{1,2}):(?P<minute>\d{2})[ \t]*[AaPp]\.?[Mm]\b\.?",
            strip_24h_meridiem,
        ),
        // 2. Explicit 12-hour ranges.
        Rule::pattern(
            "twelve_hour_range",
            &format!(
                r"{from}{sd}{at}{st}{range_joiner}(?:{ed}{at})?{et}{GMT}",
                sd = date("sdate"),
                at = at(),
                st = time_12h("stime"),
                ed = date("edate"),
                et = time_12h("etime"),
            ),
            twelve_hour_range,
        ),
        // 3. Non-GMT restatements of the same instant.
        Rule::pattern(
            "strip_slash_restatements",
            &format!(r"(?P<anchor>\(GMT\)|{TAG})(?P<alts>(?:[ \t]*/[ \t]*[^/\n()<]*?{ZONED_CLOCK})+)"),
            strip_alternates,
        ),
        Rule::pattern(
            "strip_restatements_before_on",
            r"(?P<anchor>\(GMT\))(?P<alts>(?:[ \t]*(?:,|(?i:and|or))[ \t]*\d{1,2}:\d{2}(?:[ \t]?[AaPp]\.?[Mm]\.?)?[ \t]*\([A-Z]{2,5}\))+)(?P<on>[ \t]+(?i:on)\b)",
            strip_alternates,
        ),
        Rule::text("strip_restatement_lines", strip_restatement_lines),
        // 4a. Bold "From ... / Until ..." block over two lines.
        Rule::pattern(
            "bold_from_until_block",
            &format!(
                r"(?:\*\*)?(?i:from):?(?:\*\*)?\s*(?:\*\*)?[ \t]*{sd}{at}{st}{GMT}(?:\*\*)?[ \t]*\n\s*(?:\*\*)?(?P<kw>(?i:until|to)):?(?:\*\*)?\s*(?:\*\*)?[ \t]*{ed}{at}{et}{GMT}(?:\*\*)?",
                sd = date("sdate"),
                at = at(),
                st = time("stime"),
                ed = date("edate"),
                et = time("etime"),
            ),
            bold_from_until_block,
        ),
        // 4b. "Thursday, 6 November 2025 at 8:00 (GMT) until Thursday, ..."
        Rule::pattern(
            "weekday_until",
            &format!(
                r"{sd}{SP}(?i:at){SP}{st}{GMT}{SP}(?i:until){SP}{ed}{SP}(?i:at){SP}{et}{GMT}",
                sd = weekday_date("sdate"),
                st = time("stime"),
                ed = weekday_date("edate"),
                et = time("etime"),
            ),
            weekday_until,
        ),
        // 4c. Two full date-times.
        Rule::pattern(
            "full_range",
            &format!(
                r"{from}{sd}{at}{st}(?:{GMT})?{SP}(?P<joiner>(?i:to|until)){SP}{ed}{at}{et}{GMT}",
                sd = date("sdate"),
                at = at(),
                st = time("stime"),
                ed = date("edate"),
                et = time("etime"),
            ),
            full_range,
        ),
        // 4d. One date, a time range.
        Rule::pattern(
            "shared_date_range",
            &format!(
                r"{from}{sd}{at}{st}{range_joiner}{et}{GMT}",
                sd = date("sdate"),
                at = at(),
                st = time("stime"),
                et = time("etime"),
            ),
            shared_date_range,
        ),
        // 4e. "Nov. 4, 2025 from 7:00 to 8:00 (GMT)"
        Rule::pattern(
            "date_from_to",
            &format!(
                r"{sd}{SP}(?i:from){SP}{st}{range_joiner}{et}{GMT}",
                sd = date("sdate"),
                st = time("stime"),
                et = time("etime"),
            ),
            date_from_to,
        ),
        // 4f. "Sometime on Nov. 4, 2025 between 4:00 and 11:00 (GMT)"
        Rule::pattern(
            "date_between",
            &format!(
                r"(?P<sometime>(?i:sometime){SP}(?i:on){SP})?{sd}{SP}(?i:between){SP}{st}{SP}(?i:and){SP}{et}{GMT}",
                sd = date("sdate"),
                st = time("stime"),
                et = time("etime"),
            ),
            date_between,
        ),
        // 4g. Weekday, full date, single time.
        Rule::pattern(
            "weekday_single",
            &format!(
                r"{sd}{at}{st}{GMT}",
                sd = weekday_date("sdate"),
                at = at(),
                st = time("stime"),
            ),
            weekday_single,
        ),
        // 4h. "Nov. 4, 2025 at 4:00 (GMT)"
        Rule::pattern(
            "date_at",
            &format!(
                r"{sd}{SP}(?i:at){SP}{st}{GMT}",
                sd = date("sdate"),
                st = time("stime"),
            ),
            single,
        ),
        // 4i. "Nov. 11, 2025 from 10:00 (GMT)"
        Rule::pattern(
            "date_from_open",
            &format!(
                r"{sd}{SP}(?i:from){SP}{st}{GMT}",
                sd = date("sdate"),
                st = time("stime"),
            ),
            date_from_open,
        ),
        // 4j. "From Oct. 7, 2025 10:00 (GMT)" or just "Oct. 7, 2025 10:00 (GMT)"
        Rule::pattern(
            "from_date",
            &format!(
                r"{from}{sd}{SP}{st}{GMT}",
                sd = date("sdate"),
                st = time("stime"),
            ),
            single,
        ),
        // 4k. "10:00 (GMT) on Nov. 4, 2025"
        Rule::pattern(
            "time_on_date",
            &format!(
                r"{st}{GMT}{SP}(?i:on){SP}{sd}",
                st = time("stime"),
                sd = date("sdate"),
            ),
            single,
        ),
    ]
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Replace every recognised GMT date phrasing in `text` with Discord timestamp tags.
///
/// Running this on its own output is a no-op.
#[instrument(skip(text), fields(len = text.len()))]
pub fn convert_dates_to_discord_timestamps(text: &str) -> String {
    rewrite_with(text, rules())
}

/// Run an explicit rule sequence over `text`.
pub fn rewrite_with(text: &str, rules: &[Rule]) -> String {
    let mut current = text.to_string();
    for rule in rules {
        let next = match rule.apply(&current) {
            Cow::Borrowed(_) => continue,
            Cow::Owned(next) => next,
        };
        if next != current {
            trace!(rule = rule.name, "rule rewrote text");
            current = next;
        }
    }
    current
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn stamp(caps: &Captures<'_>, date: &str, clock: &str) -> Option<i64> {
    extract::resolve(caps.name(date)?.as_str(), caps.name(clock)?.as_str())
}

fn tag(seconds: i64, style: TimestampStyle) -> TimestampTag {
    TimestampTag::new(seconds, style)
}

/// End tags drop the date when the range stays on one UTC day.
fn end_style(start: i64, end: i64) -> TimestampStyle {
    if extract::is_same_day(start, end) {
        TimestampStyle::ShortTime
    } else {
        TimestampStyle::ShortDateTime
    }
}

/// A time range sharing one date that ends at or before its start crosses midnight.
fn rollover(start: i64, end: i64) -> i64 {
    if end <= start { end + SECONDS_PER_DAY } else { end }
}

fn from_prefix(caps: &Captures<'_>) -> &'static str {
    if caps.name("from").is_some() { "From " } else { "" }
}

fn range(start: i64, end: i64, joiner: &str) -> String {
    format!(
        "{} {joiner} {}",
        tag(start, TimestampStyle::ShortDateTime),
        tag(end, end_style(start, end))
    )
}

fn strip_24h_meridiem(caps: &Captures<'_>) -> Option<String> {
    let hour: u32 = caps["hour"].parse().ok()?;
    (hour == 0 || hour > 12).then(|| format!("{}:{}", &caps["hour"], &caps["minute"]))
}

fn twelve_hour_range(caps: &Captures<'_>) -> Option<String> {
    let start = stamp(caps, "sdate", "stime")?;
    let end = match caps.name("edate") {
        Some(_) => stamp(caps, "edate", "etime")?,
        None => rollover(start, stamp(caps, "sdate", "etime")?),
    };
    Some(format!("{}{}", from_prefix(caps), range(start, end, "to")))
}

fn strip_alternates(caps: &Captures<'_>) -> Option<String> {
    static TZ_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\(([A-Z]{2,5})\)").expect("valid regex"));

    if TZ_RE.captures_iter(&caps["alts"]).any(|tz| &tz[1] == "GMT") {
        return None;
    }
    let on = caps.name("on").map_or("", |m| m.as_str());
    Some(format!("{}{on}", &caps["anchor"]))
}

fn bold_from_until_block(caps: &Captures<'_>) -> Option<String> {
    let start = stamp(caps, "sdate", "stime")?;
    let end = stamp(caps, "edate", "etime")?;
    let keyword = capitalize(&caps["kw"]);
    Some(format!(
        "**From** {}\n**{keyword}** {}",
        tag(start, TimestampStyle::ShortDateTime),
        tag(end, end_style(start, end))
    ))
}

fn weekday_until(caps: &Captures<'_>) -> Option<String> {
    let start = stamp(caps, "sdate", "stime")?;
    let end = stamp(caps, "edate", "etime")?;
    Some(format!(
        "{} until {}",
        tag(start, TimestampStyle::LongDateTime),
        tag(end, end_style(start, end))
    ))
}

fn full_range(caps: &Captures<'_>) -> Option<String> {
    let start = stamp(caps, "sdate", "stime")?;
    let end = stamp(caps, "edate", "etime")?;
    let joiner = caps["joiner"].to_ascii_lowercase();
    Some(format!("{}{}", from_prefix(caps), range(start, end, &joiner)))
}

fn shared_date_range(caps: &Captures<'_>) -> Option<String> {
    let start = stamp(caps, "sdate", "stime")?;
    let end = rollover(start, stamp(caps, "sdate", "etime")?);
    Some(format!("{}{}", from_prefix(caps), range(start, end, "to")))
}

fn date_from_to(caps: &Captures<'_>) -> Option<String> {
    let start = stamp(caps, "sdate", "stime")?;
    let end = rollover(start, stamp(caps, "sdate", "etime")?);
    Some(format!("From {}", range(start, end, "to")))
}

fn date_between(caps: &Captures<'_>) -> Option<String> {
    let start = stamp(caps, "sdate", "stime")?;
    let end = stamp(caps, "sdate", "etime")?;
    let lead = if caps.name("sometime").is_some() {
        "Sometime between"
    } else {
        "between"
    };
    Some(format!("{lead} {}", range(start, end, "and")))
}

fn weekday_single(caps: &Captures<'_>) -> Option<String> {
    let start = stamp(caps, "sdate", "stime")?;
    Some(tag(start, TimestampStyle::LongDateTime).to_string())
}

fn date_from_open(caps: &Captures<'_>) -> Option<String> {
    let start = stamp(caps, "sdate", "stime")?;
    Some(format!("From {}", tag(start, TimestampStyle::ShortDateTime)))
}

fn single(caps: &Captures<'_>) -> Option<String> {
    let start = stamp(caps, "sdate", "stime")?;
    Some(format!(
        "{}{}",
        from_prefix(caps),
        tag(start, TimestampStyle::ShortDateTime)
    ))
}

fn capitalize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Line pass: drop whole lines restating a GMT time in another zone
// ---------------------------------------------------------------------------

static ZONED_CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ZONED_CLOCK).expect("valid regex"));

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\(GMT\)|{TAG}")).expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Anchor,
    Restatement,
    Other,
}

fn classify(line: &str) -> LineKind {
    if ANCHOR_RE.is_match(line) {
        return LineKind::Anchor;
    }
    if ZONED_CLOCK_RE
        .captures_iter(line)
        .any(|caps| &caps[1] != "GMT")
    {
        LineKind::Restatement
    } else {
        LineKind::Other
    }
}

/// Remove lines that restate a neighbouring GMT line in another timezone.
///
/// Neighbouring means part of the same run of time-bearing lines. A blank
/// line ends the run unless the next line is itself a restatement. Runs
/// without a GMT line are kept whole.
fn strip_restatement_lines(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let kinds: Vec<LineKind> = lines.iter().map(|l| classify(l)).collect();
    let mut keep = vec![true; lines.len()];

    let mut run: Vec<usize> = Vec::new();
    let flush = |run: &mut Vec<usize>, keep: &mut Vec<bool>| {
        if run.iter().any(|&i| kinds[i] == LineKind::Anchor) {
            for &i in run.iter() {
                if kinds[i] == LineKind::Restatement {
                    keep[i] = false;
                }
            }
        }
        run.clear();
    };

    let mut after_blank = false;
    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            after_blank = true;
            continue;
        }
        if after_blank && kinds[i] != LineKind::Restatement {
            flush(&mut run, &mut keep);
        }
        after_blank = false;
        match kinds[i] {
            LineKind::Anchor | LineKind::Restatement => run.push(i),
            LineKind::Other => flush(&mut run, &mut keep),
        }
    }
    flush(&mut run, &mut keep);

    if keep.iter().all(|&k| k) {
        return text.to_string();
    }

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut dropped_since_last = false;
    for (i, line) in lines.iter().enumerate() {
        if !keep[i] {
            dropped_since_last = true;
            continue;
        }
        let blank = line.trim().is_empty();
        if blank && out.last().is_some_and(|l| l.trim().is_empty()) {
            continue;
        }
        if dropped_since_last && blank {
            // A dropped line may have been the target of a hard break.
            if let Some(last) = out.last_mut() {
                *last = last.trim_end().to_string();
            }
        }
        dropped_since_last = false;
        out.push((*line).to_string());
    }
    if dropped_since_last {
        if let Some(last) = out.last_mut() {
            *last = last.trim_end().to_string();
        }
    }
    while out.first().is_some_and(|l| l.trim().is_empty()) {
        out.remove(0);
    }

    out.join("\n")
}
