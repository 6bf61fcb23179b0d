//! HTML fix-ups applied before the htmd conversion.
//!
//! Lodestone markup has a few habits that convert badly: empty headings used
//! as spacers, `<br>` right before `</li>`, emphasis wrapped around a whole
//! paragraph, and embedded video players.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::trace;
use url::Url;

/// Run every pre-conversion pass over the HTML.
pub(crate) fn run(html: &str) -> String {
    let mut result = html.to_string();

    result = drop_empty_headings(&result);
    result = merge_trailing_breaks(&result);
    result = unwrap_emphasised_paragraphs(&result);
    result = replace_video_embeds(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Empty headings
// ---------------------------------------------------------------------------

fn drop_empty_headings(html: &str) -> String {
    static EMPTY_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)<h([1-6])(?:\s[^>]*)?>(?:\s|&nbsp;|<br\s*/?>)*</h([1-6])>")
            .expect("valid regex")
    });

    EMPTY_HEADING_RE
        .replace_all(html, |caps: &Captures<'_>| {
            if caps[1] == caps[2] {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

// ---------------------------------------------------------------------------
// Pass 2: Line breaks closing a list item
// ---------------------------------------------------------------------------

fn merge_trailing_breaks(html: &str) -> String {
    static BR_BEFORE_LI_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)(?:<br\s*/?>\s*)+</li>").expect("valid regex"));

    BR_BEFORE_LI_RE.replace_all(html, "</li>").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 3: Emphasis around a single paragraph
// ---------------------------------------------------------------------------

/// `<strong><p>text</p></strong>` becomes `<p><strong>text</strong></p>`.
fn unwrap_emphasised_paragraphs(html: &str) -> String {
    static WRAPPED_P_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?is)<(?P<open>strong|b|em|i)(?:\s[^>]*)?>\s*<p(?:\s[^>]*)?>(?P<body>.*?)</p>\s*</(?P<close>strong|b|em|i)>",
        )
        .expect("valid regex")
    });
    static P_OPEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)<p[\s>]").expect("valid regex"));

    WRAPPED_P_RE
        .replace_all(html, |caps: &Captures<'_>| {
            let open = caps["open"].to_ascii_lowercase();
            let body = &caps["body"];
            if open != caps["close"].to_ascii_lowercase() || P_OPEN_RE.is_match(body) {
                return caps[0].to_string();
            }
            format!("<p><{open}>{body}</{open}></p>")
        })
        .into_owned()
}

// ---------------------------------------------------------------------------
// Pass 4: Video embeds
// ---------------------------------------------------------------------------

static VIDEO_EMBED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div[^>]*mdl-youtube[^>]*>.*?<iframe[^>]+src=["']([^"']+)["'][^>]*>.*?</div>"#)
        .expect("valid regex")
});

/// Replace embedded players with a `<p>Stream: URL</p>` marker paragraph.
pub(crate) fn replace_video_embeds(html: &str) -> String {
    VIDEO_EMBED_RE
        .replace_all(html, |caps: &Captures<'_>| {
            let src = html_escape::decode_html_entities(&caps[1]);
            let url = canonical_video_url(&src);
            trace!(%url, "video embed replaced");
            format!("<p>Stream: {url}</p>")
        })
        .into_owned()
}

/// Rebuild a player `src` as the provider's canonical watch URL.
///
/// Twitch players carry the VOD id in a `video` query parameter, YouTube
/// embeds in the path after `/embed/`. Anything else is returned unchanged.
pub fn canonical_video_url(src: &str) -> String {
    let absolute = if src.starts_with("//") {
        format!("https:{src}")
    } else {
        src.to_string()
    };
    let Ok(url) = Url::parse(&absolute) else {
        return src.to_string();
    };
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();

    if host == "twitch.tv" || host.ends_with(".twitch.tv") {
        let video = url
            .query_pairs()
            .find(|(key, _)| key == "video")
            .map(|(_, value)| value.trim_start_matches(['v', 'V']).to_string());
        if let Some(id) = video.filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())) {
            return format!("https://www.twitch.tv/videos/{id}");
        }
    } else if host.contains("youtube") {
        let mut segments = url.path_segments().into_iter().flatten();
        if segments.by_ref().any(|segment| segment == "embed") {
            if let Some(id) = segments.next().filter(|id| !id.is_empty()) {
                return format!("https://www.youtube.com/watch?v={id}");
            }
        }
    }

    src.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_headings_are_removed() {
        let html = "<h3>&nbsp;</h3><h2 class=\"x\"> <br> </h2><h3>Keep</h3>";
        assert_eq!(drop_empty_headings(html), "<h3>Keep</h3>");
    }

    #[test]
    fn breaks_before_list_close_are_merged() {
        let html = "<ul><li>One<br><br/>\n</li><li>Two</li></ul>";
        assert_eq!(merge_trailing_breaks(html), "<ul><li>One</li><li>Two</li></ul>");
    }

    #[test]
    fn emphasis_around_single_paragraph_moves_inside() {
        let html = "<strong><p>Important</p></strong>";
        assert_eq!(
            unwrap_emphasised_paragraphs(html),
            "<p><strong>Important</strong></p>"
        );
    }

    #[test]
    fn emphasis_around_two_paragraphs_is_left_alone() {
        let html = "<b><p>One</p><p>Two</p></b>";
        assert_eq!(unwrap_emphasised_paragraphs(html), html);
    }

    #[test]
    fn mismatched_emphasis_is_left_alone() {
        let html = "<em><p>One</p></strong>";
        assert_eq!(unwrap_emphasised_paragraphs(html), html);
    }

    #[test]
    fn twitch_player_becomes_vod_link() {
        assert_eq!(
            canonical_video_url("https://player.twitch.tv/?video=v2589123456&parent=eu.finalfantasyxiv.com"),
            "https://www.twitch.tv/videos/2589123456"
        );
        assert_eq!(
            canonical_video_url("//player.twitch.tv/?video=123&autoplay=false"),
            "https://www.twitch.tv/videos/123"
        );
    }

    #[test]
    fn youtube_embed_becomes_watch_link() {
        assert_eq!(
            canonical_video_url("https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn other_providers_pass_through() {
        let src = "https://player.vimeo.com/video/1";
        assert_eq!(canonical_video_url(src), src);
        assert_eq!(canonical_video_url("not a url"), "not a url");
        assert_eq!(
            canonical_video_url("https://player.twitch.tv/?channel=ffxiv"),
            "https://player.twitch.tv/?channel=ffxiv"
        );
    }

    #[test]
    fn embed_block_becomes_stream_paragraph() {
        let html = r#"<p>Watch:</p><div class="mdl-youtube"><iframe src="https://www.youtube.com/embed/abc123" allowfullscreen></iframe></div><p>After</p>"#;
        assert_eq!(
            run(html),
            "<p>Watch:</p><p>Stream: https://www.youtube.com/watch?v=abc123</p><p>After</p>"
        );
    }
}
