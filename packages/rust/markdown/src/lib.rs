//! Lodestone HTML to Discord Markdown conversion.
//!
//! Converts announcement HTML to Markdown with the `htmd` crate, then applies
//! a series of cleanup passes, rewrites GMT dates into Discord timestamp tags,
//! and trims the result to Discord's message limit. A second entry point
//! splits the same HTML into Components v2 blocks.

mod cleanup;
mod components;
mod fields;
mod preprocess;
mod truncate;

use std::fmt;
use std::sync::LazyLock;

use lodestone_shared::{ComponentsMessage, ConverterConfig, LodestoneError, Result};
use lodestone_timestamps::convert_dates_to_discord_timestamps;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use cleanup::HeadingStyle;

pub use fields::decode_title;
pub use preprocess::canonical_video_url;
pub use truncate::cut_message_at_max_length;

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// The HTML-to-Markdown pipeline with its settings.
///
/// Holds no per-call state, so one instance can serve any number of
/// conversions.
pub struct LodestoneConverter {
    config: ConverterConfig,
    html: htmd::HtmlToMarkdown,
}

impl fmt::Debug for LodestoneConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LodestoneConverter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for LodestoneConverter {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}

impl LodestoneConverter {
    pub fn new(config: ConverterConfig) -> Self {
        let html = htmd::HtmlToMarkdown::builder()
            .skip_tags(vec!["script", "style", "iframe", "noscript"])
            .build();
        Self { config, html }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert announcement HTML to a Discord-ready Markdown message.
    ///
    /// `link` is the article URL used in the "continue reading" suffix when
    /// the message has to be truncated.
    #[instrument(skip(self, html), fields(len = html.len()))]
    pub fn convert(&self, html: &str, link: Option<&str>) -> String {
        let html = preprocess::run(html);
        let raw = self.html_to_markdown(&html);
        debug!(raw_len = raw.len(), "htmd conversion complete");

        let cleaned = cleanup::run_pipeline(&raw, &self.config.site_origin, HeadingStyle::BoldUnderline);
        let dated = convert_dates_to_discord_timestamps(&cleaned);
        let message = cut_message_at_max_length(&dated, link, &self.config);

        message.trim().to_string()
    }

    /// Split announcement HTML into Components v2 blocks.
    pub fn parse_to_components(&self, html: &str, link: Option<&str>) -> ComponentsMessage {
        components::split(self, html, link)
    }

    /// Add Markdown and component renderings to a parsed Lodestone JSON value.
    pub fn add_markdown_fields(&self, data: Value) -> Value {
        fields::add_markdown_fields(self, data)
    }

    /// Markdown for one text block of a component message.
    pub(crate) fn text_block(&self, html: &str, link: Option<&str>) -> String {
        let raw = self.html_to_markdown(html);
        let cleaned = cleanup::run_pipeline(&raw, &self.config.site_origin, HeadingStyle::Native);
        let dated = convert_dates_to_discord_timestamps(&cleaned);
        cut_message_at_max_length(&dated, link, &self.config)
            .trim()
            .to_string()
    }

    fn try_html_to_markdown(&self, html: &str) -> Result<String> {
        self.html
            .convert(html)
            .map_err(|e| LodestoneError::conversion(e.to_string()))
    }

    /// htmd output, or the tag-stripped text if htmd gives up.
    fn html_to_markdown(&self, html: &str) -> String {
        match self.try_html_to_markdown(html) {
            Ok(markdown) => markdown,
            Err(e) => {
                warn!(error = %e, "falling back to tag stripping");
                strip_tags(html)
            }
        }
    }
}

fn strip_tags(html: &str) -> String {
    static BR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</p>").expect("valid regex"));
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

    let text = BR_RE.replace_all(html, "\n");
    let text = TAG_RE.replace_all(&text, "");
    html_escape::decode_html_entities(&text).into_owned()
}

// ---------------------------------------------------------------------------
// Free-function entry points
// ---------------------------------------------------------------------------

/// [`LodestoneConverter::convert`] with default settings.
pub fn convert(html: &str, link: Option<&str>) -> String {
    LodestoneConverter::default().convert(html, link)
}

/// [`LodestoneConverter::parse_to_components`] with default settings.
pub fn parse_to_components(html: &str, link: Option<&str>) -> ComponentsMessage {
    LodestoneConverter::default().parse_to_components(html, link)
}

/// [`LodestoneConverter::add_markdown_fields`] with default settings.
pub fn add_markdown_fields(data: Value) -> Value {
    LodestoneConverter::default().add_markdown_fields(data)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_shared::DiscordComponent;
    use std::fs;

    fn fixture_path(name: &str) -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name)
    }

    fn load_fixture(name: &str) -> String {
        fs::read_to_string(fixture_path(name))
            .unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"))
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> i64 {
        chrono::NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|date| date.and_hms_opt(h, mi, 0))
            .map(|dt| dt.and_utc().timestamp())
            .expect("valid date")
    }

    // --- Core conversion tests ---

    #[test]
    fn convert_simple_paragraph() {
        assert_eq!(convert("<p>hello</p>", None), "hello");
    }

    #[test]
    fn convert_headings_to_bold_underline() {
        let md = convert("<p>Intro</p><h3>Overview</h3><p>Text</p>", None);
        assert_eq!(md, "Intro\n\n**__Overview__**\n\nText");
    }

    #[test]
    fn convert_rewrites_gmt_dates() {
        let html = "<p>Oct. 7, 2025 10:00 (GMT) / Oct. 7, 2025 11:00 (BST) / Oct. 7, 2025 21:00 (AEDT)</p>";
        assert_eq!(convert(html, None), "<t:1759831200:f>");
    }

    #[test]
    fn convert_counts_images_and_drops_banner() {
        let html = r#"<img src="a.png"><img src="b.png"><img src="c.png">"#;
        assert_eq!(convert(html, None), "");

        let html = r#"<p>Text</p><img src="a.png"><img src="b.png"><img src="c.png">"#;
        assert_eq!(convert(html, None), "Text\n\n_3 images_");
    }

    #[test]
    fn convert_makes_lodestone_links_absolute() {
        let html = r#"<p>See <a href="/lodestone/news/">the news</a>.</p>"#;
        assert_eq!(
            convert(html, None),
            "See [the news](https://eu.finalfantasyxiv.com/lodestone/news/)."
        );
    }

    #[test]
    fn convert_respects_configured_origin() {
        let converter = LodestoneConverter::new(ConverterConfig {
            site_origin: "https://na.finalfantasyxiv.com".into(),
            ..ConverterConfig::default()
        });
        let html = r#"<p><a href="/lodestone/">Home</a></p>"#;
        assert_eq!(
            converter.convert(html, None),
            "[Home](https://na.finalfantasyxiv.com/lodestone/)"
        );
    }

    #[test]
    fn convert_output_never_exceeds_limit() {
        let html = format!("<p>{}</p>", "Adventurers ".repeat(400));
        let md = convert(&html, Some("https://eu.finalfantasyxiv.com/lodestone/topics/detail/x"));
        assert!(md.chars().count() <= 2000);
        assert!(md.contains("[Continue reading]"));
    }

    #[test]
    fn convert_replaces_video_embed() {
        let html = r#"<div class="mdl-youtube"><iframe src="https://www.youtube.com/embed/XYZ"></iframe></div>"#;
        assert_eq!(convert(html, None), "Stream: https://www.youtube.com/watch?v=XYZ");
    }

    #[test]
    fn convert_list_items_with_glyphs() {
        let md = convert("<ul><li>・one</li><li>■ two</li></ul>", None);
        assert!(md.contains("* one"), "{md}");
        assert!(md.contains("* two"), "{md}");
        assert!(!md.contains('・') && !md.contains('■'), "{md}");
    }

    #[test]
    fn strip_tags_fallback_keeps_text() {
        assert_eq!(strip_tags("<p>a &amp; b</p><p>c<br>d</p>"), "a & b\nc\nd\n");
    }

    // --- Fixture-based tests ---

    #[test]
    fn maintenance_fixture_converts_to_single_window() {
        let html = load_fixture("html/maintenance.html");
        let md = convert(&html, None);

        let start = utc(2025, 11, 4, 7, 0);
        let end = utc(2025, 11, 4, 8, 0);
        assert!(md.contains(&format!("<t:{start}:f> to <t:{end}:t>")), "{md}");
        assert!(!md.contains("(BST)"));
        assert!(!md.contains("(AEDT)"));
        assert!(md.contains("**__Date & Time__**"));
    }

    #[test]
    fn topic_fixture_components() {
        let html = load_fixture("html/topic.html");
        let message = parse_to_components(&html, None);

        assert!(message.components.iter().any(|c| matches!(c, DiscordComponent::Separator)));
        assert!(message.components.iter().any(|c| matches!(c, DiscordComponent::Stream { .. })));
        assert!(
            message
                .components
                .iter()
                .any(|c| matches!(c, DiscordComponent::MediaGallery { urls } if urls.len() == 2))
        );
    }

    #[test]
    fn live_letter_fixture_yields_start() {
        let html = load_fixture("html/live_letter.html");
        let md = convert(&html, None);
        assert_eq!(
            lodestone_timestamps::extract_live_letter_timestamp(&md),
            Some(utc(2025, 11, 6, 11, 0) * 1000)
        );
    }
}
