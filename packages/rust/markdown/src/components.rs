//! Split announcement HTML into Discord components.
//!
//! A document becomes text, gallery, stream and separator blocks in reading
//! order. `<hr>` separates parts; inside a part, `<img>` tags and
//! `<p>Stream: URL</p>` markers are pulled out as their own blocks and the
//! HTML between them goes through the normal Markdown path.

use std::sync::LazyLock;

use lodestone_shared::{ComponentsMessage, DiscordComponent};
use regex::Regex;
use tracing::{debug, instrument};
use url::Url;

use crate::{LodestoneConverter, preprocess};

static LIST_IMAGE_ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*class=["'][^"']*news__list--img[^"']*["'][^>]*>(.*?)</a>"#)
        .expect("valid regex")
});

static HR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<hr\b[^>]*/?>").expect("valid regex"));

static IMG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\bsrc=["']([^"']+)["'][^>]*>"#).expect("valid regex")
});

static STREAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<p>\s*Stream:\s*(\S+?)\s*</p>").expect("valid regex")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Image(String),
    Stream(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    start: usize,
    end: usize,
    kind: TokenKind,
}

/// Images and stream markers of one part, in document order.
fn tokens(part: &str) -> Vec<Token> {
    let images = IMG_RE.captures_iter(part).filter_map(|caps| {
        let m = caps.get(0)?;
        Some(Token {
            start: m.start(),
            end: m.end(),
            kind: TokenKind::Image(decode(&caps[1])),
        })
    });
    let streams = STREAM_RE.captures_iter(part).filter_map(|caps| {
        let m = caps.get(0)?;
        Some(Token {
            start: m.start(),
            end: m.end(),
            kind: TokenKind::Stream(decode(&caps[1])),
        })
    });

    let mut tokens: Vec<Token> = images.chain(streams).collect();
    tokens.sort_by_key(|t| t.start);
    tokens
}

fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Whether an HTML fragment has anything visible besides tags and spacing.
fn has_text(html: &str) -> bool {
    let text = TAG_RE.replace_all(html, "");
    !text.replace("&nbsp;", " ").trim().is_empty()
}

fn resolve_image(src: &str, origin: Option<&Url>) -> String {
    if src.starts_with("//") {
        return format!("https:{src}");
    }
    match origin.map(|base| base.join(src)) {
        Some(Ok(url)) => url.to_string(),
        _ => src.to_string(),
    }
}

/// Builder for one document's component list.
struct Splitter<'a> {
    converter: &'a LodestoneConverter,
    link: Option<&'a str>,
    origin: Option<Url>,
    message: ComponentsMessage,
    gallery: Vec<String>,
}

impl Splitter<'_> {
    fn flush_gallery(&mut self) {
        if !self.gallery.is_empty() {
            let urls = std::mem::take(&mut self.gallery);
            self.message.push(DiscordComponent::MediaGallery { urls });
        }
    }

    fn text(&mut self, html: &str) {
        if !has_text(html) {
            return;
        }
        self.flush_gallery();
        let content = self.converter.text_block(html, self.link);
        self.message.push_text(&content);
    }

    fn part(&mut self, part: &str) {
        let mut cursor = 0;
        for token in tokens(part) {
            // Overlapping matches (an image inside a stream paragraph) are skipped.
            if token.start < cursor {
                continue;
            }
            self.text(&part[cursor..token.start]);
            match token.kind {
                TokenKind::Image(src) => {
                    let url = resolve_image(&src, self.origin.as_ref());
                    self.gallery.push(url);
                }
                TokenKind::Stream(url) => {
                    self.flush_gallery();
                    self.message.push(DiscordComponent::Stream { url });
                }
            }
            cursor = token.end;
        }
        self.text(&part[cursor..]);
        self.flush_gallery();
    }
}

/// Build the component list for `html`.
#[instrument(skip(converter, html), fields(len = html.len()))]
pub(crate) fn split(converter: &LodestoneConverter, html: &str, link: Option<&str>) -> ComponentsMessage {
    let html = LIST_IMAGE_ANCHOR_RE.replace_all(html, "$1");
    let html = preprocess::run(&html);

    let mut splitter = Splitter {
        converter,
        link,
        origin: Url::parse(&converter.config().site_origin).ok(),
        message: ComponentsMessage::new(),
        gallery: Vec::new(),
    };

    let parts = HR_RE
        .split(&html)
        .filter(|part| has_text(part) || !tokens(part).is_empty());
    for (index, part) in parts.enumerate() {
        if index > 0 {
            splitter.message.push(DiscordComponent::Separator);
        }
        splitter.part(part);
    }

    let mut message = splitter.message;
    message.merge_adjacent_text();
    debug!(components = message.components.len(), "components built");
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_shared::ConverterConfig;

    fn converter() -> LodestoneConverter {
        LodestoneConverter::new(ConverterConfig::default())
    }

    fn text(content: &str) -> DiscordComponent {
        DiscordComponent::TextDisplay {
            content: content.to_string(),
        }
    }

    #[test]
    fn hr_between_paragraphs_gives_separator() {
        let message = split(&converter(), "<p>First</p><hr><p>Second</p>", None);
        assert_eq!(
            message.components,
            vec![text("First"), DiscordComponent::Separator, text("Second")]
        );
    }

    #[test]
    fn empty_parts_do_not_add_separators() {
        let message = split(&converter(), "<hr><p>Only</p><hr/>  <hr>", None);
        assert_eq!(message.components, vec![text("Only")]);
    }

    #[test]
    fn consecutive_images_form_one_gallery() {
        let html = r#"<p>Intro</p><img src="https://img.example/a.png"><img src="https://img.example/b.png"><p>Outro</p>"#;
        let message = split(&converter(), html, None);
        assert_eq!(
            message.components,
            vec![
                text("Intro"),
                DiscordComponent::MediaGallery {
                    urls: vec![
                        "https://img.example/a.png".into(),
                        "https://img.example/b.png".into()
                    ]
                },
                text("Outro"),
            ]
        );
    }

    #[test]
    fn text_between_images_splits_galleries() {
        let html = r#"<img src="/a.png"><p>Caption</p><img src="/b.png">"#;
        let message = split(&converter(), html, None);
        assert_eq!(
            message.components,
            vec![
                DiscordComponent::MediaGallery {
                    urls: vec!["https://eu.finalfantasyxiv.com/a.png".into()]
                },
                text("Caption"),
                DiscordComponent::MediaGallery {
                    urls: vec!["https://eu.finalfantasyxiv.com/b.png".into()]
                },
            ]
        );
    }

    #[test]
    fn stream_flushes_pending_gallery() {
        let html = r#"<img src="https://img.example/a.png"><div class="mdl-youtube"><iframe src="https://player.twitch.tv/?video=v42&parent=x"></iframe></div><p>Tune in!</p>"#;
        let message = split(&converter(), html, None);
        assert_eq!(
            message.components,
            vec![
                DiscordComponent::MediaGallery {
                    urls: vec!["https://img.example/a.png".into()]
                },
                DiscordComponent::Stream {
                    url: "https://www.twitch.tv/videos/42".into()
                },
                text("Tune in!"),
            ]
        );
    }

    #[test]
    fn list_image_anchor_is_unwrapped() {
        let html = r#"<a href="/lodestone/topics/detail/1" class="news__list--img"><img src="https://img.example/banner.png"></a><p>Body</p>"#;
        let message = split(&converter(), html, None);
        assert_eq!(message.components.len(), 2);
        assert!(matches!(message.components[0], DiscordComponent::MediaGallery { .. }));
    }

    #[test]
    fn headings_use_native_markdown() {
        let message = split(&converter(), "<h2>Overview</h2><p>Details</p>", None);
        assert_eq!(message.components, vec![text("### Overview\n\nDetails")]);
    }

    #[test]
    fn no_two_text_blocks_are_adjacent() {
        let html = "<p>a</p><img src=\"x.png\" style=\"display:none\"><p>b</p>";
        let message = split(&converter(), html, None);
        let adjacent = message.components.windows(2).any(|w| {
            matches!(
                (&w[0], &w[1]),
                (DiscordComponent::TextDisplay { .. }, DiscordComponent::TextDisplay { .. })
            )
        });
        assert!(!adjacent);
    }
}
