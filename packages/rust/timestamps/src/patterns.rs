//! Regex fragments shared by the rewrite rules and the maintenance extractor.
//!
//! Fragments expose named capture groups; callers choose the names so a single
//! pattern can hold a start and an end date.

/// Horizontal whitespace, including the no-break space `&nbsp;` decodes to.
pub(crate) const SP: &str = r"[ \t\u{A0}]+";

/// The authoritative timezone label.
pub(crate) const GMT: &str = r"[ \t\u{A0}]*\(GMT\)";

pub(crate) const WEEKDAY: &str = r"(?i:(?:mon|tues|wednes|thurs|fri|satur|sun)day)";

pub(crate) const MONTH: &str = r"(?i:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

/// A clock time directly followed by a zone label, capturing the zone.
pub(crate) const ZONED_CLOCK: &str =
    r"\d{1,2}:\d{2}(?:[ \t]?[AaPp]\.?[Mm]\.?)?[ \t\u{A0}]*\(([A-Z]{2,5})\)";

/// A rendered Discord timestamp tag.
pub(crate) const TAG: &str = r"<t:-?\d+:[tTdDfFR]>";

/// Day-first or month-first calendar date with an optional weekday.
pub(crate) fn date(name: &str) -> String {
    format!(
        r"(?P<{name}>\b(?:{WEEKDAY},?{SP})?{body})",
        body = date_body(true)
    )
}

/// Calendar date that must open with a weekday name. The year may be left out.
pub(crate) fn weekday_date(name: &str) -> String {
    format!(
        r"(?P<{name}>\b{WEEKDAY},?{SP}{body})",
        body = date_body(false)
    )
}

fn date_body(year_required: bool) -> String {
    let year = if year_required {
        format!(r",?{SP}\d{{4}}")
    } else {
        format!(r"(?:,?{SP}\d{{4}})?")
    };
    format!(
        r"(?:\d{{1,2}}(?:st|nd|rd|th)?{SP}{MONTH}\.?{year}|{MONTH}\.?{SP}\d{{1,2}}(?:st|nd|rd|th)?{year})"
    )
}

/// Clock time, 24-hour or with an am/pm marker.
pub(crate) fn time(name: &str) -> String {
    format!(r"(?P<{name}>\b\d{{1,2}}:\d{{2}}(?:[ \t]?[AaPp]\.?[Mm]\b\.?)?)")
}

/// Clock time that must carry an am/pm marker.
pub(crate) fn time_12h(name: &str) -> String {
    format!(r"(?P<{name}>\b\d{{1,2}}:\d{{2}}[ \t]?[AaPp]\.?[Mm]\b\.?)")
}

/// Optional "at " connector between a date and a time.
pub(crate) fn at() -> String {
    format!(r"(?:{SP}(?i:at))?{SP}")
}
