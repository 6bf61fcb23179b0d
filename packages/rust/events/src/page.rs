//! Event page classification.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use crate::EventType;

static TROVE_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/lodestone/special/mogmog-collection/\d{6}/[^/]+").expect("valid regex")
});
static SPECIAL_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/lodestone/special/\d{4}/[^/]+/[^/]+").expect("valid regex"));

pub(crate) static DESCRIPTION_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="description"]"#).expect("valid selector")
});
static OG_URL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:url"]"#).expect("valid selector"));

/// A classified event page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPage {
    /// Canonical page URL.
    pub url: String,
    pub event_type: EventType,
}

/// Classify an event page by its URL path alone.
pub fn detect_event_type(url: &str) -> Option<EventType> {
    if TROVE_PATH_RE.is_match(url) {
        Some(EventType::MoogleTreasureTrove)
    } else if SPECIAL_PATH_RE.is_match(url) {
        Some(EventType::SpecialEvent)
    } else {
        None
    }
}

pub(crate) fn meta_content(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string)
}

/// Classify a fetched page, given the URL it was served from after redirects.
///
/// The URL path decides when it can. Otherwise the page must carry an
/// "Event Schedule" meta description; its `og:url` is tried next, and failing
/// that a schedule ending "to the release of Patch" marks a Trove.
pub fn event_type_from_page(html: &str, final_url: &str) -> Option<EventPage> {
    if let Some(event_type) = detect_event_type(final_url) {
        return Some(EventPage {
            url: final_url.to_string(),
            event_type,
        });
    }

    let doc = Html::parse_document(html);
    let description = meta_content(&doc, &DESCRIPTION_SEL)?;
    if !description.contains("Event Schedule") {
        debug!(url = final_url, "page has no event schedule");
        return None;
    }

    if let Some(og_url) = meta_content(&doc, &OG_URL_SEL) {
        if let Some(event_type) = detect_event_type(&og_url) {
            return Some(EventPage {
                url: og_url,
                event_type,
            });
        }
    }

    let event_type = if description.contains("to the release of Patch") {
        EventType::MoogleTreasureTrove
    } else {
        EventType::SpecialEvent
    };
    Some(EventPage {
        url: final_url.to_string(),
        event_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(description: &str, og_url: &str) -> String {
        format!(
            r#"<html><head><meta name="description" content="{description}"><meta property="og:url" content="{og_url}"></head><body></body></html>"#
        )
    }

    #[test]
    fn url_patterns() {
        assert_eq!(
            detect_event_type("https://eu.finalfantasyxiv.com/lodestone/special/mogmog-collection/202507/a1b2c3"),
            Some(EventType::MoogleTreasureTrove)
        );
        assert_eq!(
            detect_event_type("https://eu.finalfantasyxiv.com/lodestone/special/2025/Starlight_Celebration/abcd"),
            Some(EventType::SpecialEvent)
        );
        assert_eq!(detect_event_type("https://eu.finalfantasyxiv.com/lodestone/topics/"), None);
    }

    #[test]
    fn final_url_wins() {
        let url = "https://eu.finalfantasyxiv.com/lodestone/special/2025/event/x";
        let found = event_type_from_page("", url).unwrap();
        assert_eq!(found.event_type, EventType::SpecialEvent);
        assert_eq!(found.url, url);
    }

    #[test]
    fn og_url_used_when_redirect_is_opaque() {
        let html = page(
            "Event Schedule / From Tuesday, 8 July 2025 at 8:00 GMT",
            "https://eu.finalfantasyxiv.com/lodestone/special/mogmog-collection/202507/zz",
        );
        let found = event_type_from_page(&html, "https://sqex.to/abc").unwrap();
        assert_eq!(found.event_type, EventType::MoogleTreasureTrove);
        assert!(found.url.ends_with("/202507/zz"));
    }

    #[test]
    fn schedule_text_decides_last() {
        let html = page(
            "Event Schedule / From Tuesday, 8 July 2025 at 8:00 GMT to the release of Patch 7.3",
            "https://eu.finalfantasyxiv.com/",
        );
        let found = event_type_from_page(&html, "https://sqex.to/abc").unwrap();
        assert_eq!(found.event_type, EventType::MoogleTreasureTrove);
        assert_eq!(found.url, "https://sqex.to/abc");

        let html = page("Event Schedule / From A to B", "");
        let found = event_type_from_page(&html, "https://sqex.to/abc").unwrap();
        assert_eq!(found.event_type, EventType::SpecialEvent);
    }

    #[test]
    fn pages_without_schedule_are_not_events() {
        let html = page("The latest news", "https://eu.finalfantasyxiv.com/lodestone/");
        assert_eq!(event_type_from_page(&html, "https://sqex.to/abc"), None);
        assert_eq!(event_type_from_page("<p>no meta</p>", "https://sqex.to/abc"), None);
    }
}
