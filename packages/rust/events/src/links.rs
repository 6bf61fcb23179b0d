//! Event links inside topic descriptions.

use std::sync::LazyLock;

use lodestone_shared::{LodestoneError, Result};
use regex::Regex;
use url::Url;

static READ_ON_HTML_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a[^>]+href=["']([^"']+)["'][^>]*>\s*Read on\s*</a>\s*for details"#)
        .expect("valid regex")
});
static READ_ON_MD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[Read on\]\(([^)\s]+)\)\s*for details").expect("valid regex")
});
static TROVE_HTML_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a[^>]+href=["']([^"']+)["'][^>]*>[^<]*?Moogle Treasure Trove[^<]*</a>"#)
        .expect("valid regex")
});
static SPECIAL_SITE_HTML_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a[^>]+href=["']([^"']+)["'][^>]*>[^<]*?special site</a>"#)
        .expect("valid regex")
});
static TROVE_MD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[[^\]]*?Moogle Treasure Trove[^\]]*\]\(([^)\s]+)\)").expect("valid regex")
});

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|caps| caps[1].to_string())
}

/// The "Read on for details" link of a topic, from its HTML or else its Markdown.
pub fn extract_short_url(html: &str, markdown: &str) -> Option<String> {
    first_capture(&READ_ON_HTML_RE, html).or_else(|| first_capture(&READ_ON_MD_RE, markdown))
}

/// The Moogle Treasure Trove special-site link of a topic.
pub fn extract_moogle_treasure_trove_url(html: &str, markdown: &str) -> Option<String> {
    first_capture(&TROVE_HTML_RE, html)
        .or_else(|| first_capture(&SPECIAL_SITE_HTML_RE, html))
        .or_else(|| first_capture(&TROVE_MD_RE, markdown))
}

/// The link worth following for an event: the short link first, then the Trove link.
pub fn find_event_link(html: &str, markdown: &str) -> Option<String> {
    extract_short_url(html, markdown).or_else(|| extract_moogle_treasure_trove_url(html, markdown))
}

/// Resolve a possibly root-relative Lodestone link against `origin`.
pub fn absolute_lodestone_url(url: &str, origin: &str) -> Result<String> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(url.to_string());
    }
    let base = Url::parse(origin)
        .map_err(|e| LodestoneError::parse(format!("site origin {origin:?}: {e}")))?;
    base.join(url)
        .map(|resolved| resolved.to_string())
        .map_err(|e| LodestoneError::parse(format!("link {url:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://eu.finalfantasyxiv.com";

    #[test]
    fn short_url_prefers_html() {
        let html = r#"<p>The event is back! <a href="https://sqex.to/AbCd1" target="_blank">Read on</a> for details.</p>"#;
        let markdown = "[Read on](https://sqex.to/other) for details.";
        assert_eq!(
            extract_short_url(html, markdown).as_deref(),
            Some("https://sqex.to/AbCd1")
        );
    }

    #[test]
    fn short_url_falls_back_to_markdown() {
        let markdown = "The event is back! [Read on](https://sqex.to/XyZ) for details.";
        assert_eq!(
            extract_short_url("", markdown).as_deref(),
            Some("https://sqex.to/XyZ")
        );
        assert_eq!(extract_short_url("<p>nothing</p>", "nothing"), None);
    }

    #[test]
    fn trove_link_from_anchor_text() {
        let html = r#"<p>Visit the <a href="/lodestone/special/mogmog-collection/202507/abc">Moogle Treasure Trove special site</a>.</p>"#;
        assert_eq!(
            extract_moogle_treasure_trove_url(html, "").as_deref(),
            Some("/lodestone/special/mogmog-collection/202507/abc")
        );

        let html = r#"<a href="/x/">the special site</a>"#;
        assert_eq!(extract_moogle_treasure_trove_url(html, "").as_deref(), Some("/x/"));

        let markdown = "See the [Moogle Treasure Trove site](https://x.example/trove).";
        assert_eq!(
            extract_moogle_treasure_trove_url("", markdown).as_deref(),
            Some("https://x.example/trove")
        );
    }

    #[test]
    fn event_link_order() {
        let html = r#"<a href="https://sqex.to/s">Read on</a> for details. <a href="/t">Moogle Treasure Trove</a>"#;
        assert_eq!(find_event_link(html, "").as_deref(), Some("https://sqex.to/s"));
    }

    #[test]
    fn relative_links_resolve_against_origin() {
        assert_eq!(
            absolute_lodestone_url("/lodestone/special/2025/x/y", ORIGIN).unwrap(),
            "https://eu.finalfantasyxiv.com/lodestone/special/2025/x/y"
        );
        assert_eq!(
            absolute_lodestone_url("https://sqex.to/a", ORIGIN).unwrap(),
            "https://sqex.to/a"
        );
        assert!(absolute_lodestone_url("/x", "not an origin").is_err());
    }
}
