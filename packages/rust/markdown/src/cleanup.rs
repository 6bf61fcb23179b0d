//! Post-conversion cleanup pipeline for Markdown output.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.
//! The pipeline undoes htmd escaping, repairs Lodestone list and heading
//! quirks, and prepares links for Discord.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// How headings are rendered for the target message format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeadingStyle {
    /// `**__Title__**`, for plain Markdown messages.
    BoldUnderline,
    /// `### Title`, for component text blocks.
    Native,
}

impl HeadingStyle {
    fn render(self, title: &str) -> String {
        match self {
            Self::BoldUnderline => format!("**__{title}__**"),
            Self::Native => format!("### {title}"),
        }
    }

    fn is_heading(self, line: &str) -> bool {
        let line = line.trim();
        match self {
            Self::BoldUnderline => line.len() > 8 && line.starts_with("**__") && line.ends_with("__**"),
            Self::Native => line.starts_with("### "),
        }
    }
}

/// Run the full cleanup pipeline on raw Markdown text.
pub(crate) fn run_pipeline(md: &str, site_origin: &str, headings: HeadingStyle) -> String {
    let mut result = md.to_string();

    result = strip_escapes(&result);
    result = absolutize_lodestone_links(&result, site_origin);
    result = collapse_self_links(&result);
    result = normalize_bullets(&result);
    result = collapse_blank_lines(&result);
    result = merge_split_bold(&result);
    result = join_bullet_runs(&result);
    result = count_images(&result);
    result = convert_headings(&result, headings);
    result = normalize_heading_spacing(&result, headings);
    result = wrap_unsafe_urls(&result);

    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Undo converter escaping
// ---------------------------------------------------------------------------

/// Drop backslashes htmd puts in front of Markdown punctuation.
fn strip_escapes(md: &str) -> String {
    static ESCAPE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\\([!-/:-@\[-`{-~])").expect("valid regex")
    });

    ESCAPE_RE.replace_all(md, "$1").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 2: Root-relative Lodestone links
// ---------------------------------------------------------------------------

fn absolutize_lodestone_links(md: &str, site_origin: &str) -> String {
    md.replace("](/lodestone", &format!("]({site_origin}/lodestone"))
}

// ---------------------------------------------------------------------------
// Pass 3: Links whose text is their own URL
// ---------------------------------------------------------------------------

fn collapse_self_links(md: &str) -> String {
    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("valid regex"));

    LINK_RE
        .replace_all(md, |caps: &Captures<'_>| {
            let Some(full) = caps.get(0) else {
                return String::new();
            };
            // Images keep their syntax.
            if md[..full.start()].ends_with('!') {
                return caps[0].to_string();
            }
            let (text, href) = (caps[1].trim(), caps[2].trim());
            if text == href {
                href.to_string()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

// ---------------------------------------------------------------------------
// Pass 4: Bullet glyphs
// ---------------------------------------------------------------------------

fn normalize_bullets(md: &str) -> String {
    static GLYPH_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)(?:[*+-][ \t]+)?[・■][ \t]*").expect("valid regex"));
    static MARKER_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)[*+-][ \t]+").expect("valid regex"));

    let md = GLYPH_RE.replace_all(md, "$1* ");
    MARKER_RE.replace_all(&md, "$1* ").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 5: Blank lines
// ---------------------------------------------------------------------------

/// Any run of blank lines becomes exactly one.
fn collapse_blank_lines(md: &str) -> String {
    static BLANK_RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[ \t]*\n(?:[ \t\u{A0}]*\n)+[ \t]*").expect("valid regex"));

    BLANK_RUN_RE.replace_all(md, "\n\n").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 6: Bold lines split by a hard break
// ---------------------------------------------------------------------------

fn merge_split_bold(md: &str) -> String {
    // "**Title  \n**" where the closing marker fell onto the next line.
    static DANGLING_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^\*\*(?P<body>[^*\s](?:[^*\n]*[^*\s])?)[ \t]*\n[ \t]*\*\*[ \t]*$")
            .expect("valid regex")
    });
    // "**First half  \nsecond half**"
    static SPLIT_BODY_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^\*\*(?P<head>[^*\n]*[^*\s])[ \t]*\n(?P<tail>[^*\n]+)\*\*[ \t]*$")
            .expect("valid regex")
    });

    let md = DANGLING_CLOSE_RE.replace_all(md, "**$body**");
    SPLIT_BODY_RE.replace_all(&md, "**$head $tail**").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 7: List continuity
// ---------------------------------------------------------------------------

/// Remove the blank line between two bullet lines.
fn join_bullet_runs(md: &str) -> String {
    let lines: Vec<&str> = md.split('\n').collect();
    let is_bullet = |line: &str| line.trim_start().starts_with("* ");

    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let blank = line.trim().is_empty();
        let between_bullets = i > 0
            && out.last().is_some_and(|prev| is_bullet(prev))
            && lines.get(i + 1).is_some_and(|next| is_bullet(next));
        if blank && between_bullets {
            continue;
        }
        out.push(*line);
    }
    out.join("\n")
}

// ---------------------------------------------------------------------------
// Pass 8: Image runs
// ---------------------------------------------------------------------------

static IMAGE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    let image = r"\[?!\[[^\]]*\]\([^)]+\)\]?(?:\([^)]+\))?";
    Regex::new(&format!(r"{image}(?:\s*{image})*")).expect("valid regex")
});

static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]+\)").expect("valid regex"));

static LEADING_PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*_\d+ images?_[ \t]*(?:\n+|$)").expect("valid regex")
});

/// Replace runs of images with `_N image(s)_`, dropping a leading banner run.
fn count_images(md: &str) -> String {
    let replaced = IMAGE_RUN_RE.replace_all(md, |caps: &Captures<'_>| {
        match IMAGE_RE.find_iter(&caps[0]).count() {
            0 => caps[0].to_string(),
            1 => "_1 image_".to_string(),
            n => format!("_{n} images_"),
        }
    });
    LEADING_PLACEHOLDER_RE.replace(&replaced, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 9: Headings
// ---------------------------------------------------------------------------

fn convert_headings(md: &str, style: HeadingStyle) -> String {
    static ATX_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^#{1,6}[ \t]+(.+?)[ \t]*$").expect("valid regex"));
    static BRACKET_TITLE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^\[([^\]\n]+)\][ \t]*$").expect("valid regex"));

    let render = |caps: &Captures<'_>| {
        let title = caps[1].trim().trim_matches('*').trim();
        if title.is_empty() {
            String::new()
        } else {
            style.render(title)
        }
    };

    let md = ATX_RE.replace_all(md, render);
    BRACKET_TITLE_RE.replace_all(&md, render).into_owned()
}

// ---------------------------------------------------------------------------
// Pass 10: Heading spacing
// ---------------------------------------------------------------------------

/// One blank line before a heading that follows content, and one after it.
fn normalize_heading_spacing(md: &str, style: HeadingStyle) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut after_heading = false;

    for line in md.split('\n') {
        let blank = line.trim().is_empty();
        if blank {
            if !after_heading && out.last().is_some_and(|l| !l.trim().is_empty()) {
                out.push("");
            }
            continue;
        }

        let heading = style.is_heading(line);
        if after_heading || (heading && out.last().is_some_and(|l| !l.trim().is_empty())) {
            out.push("");
        }
        out.push(line);
        after_heading = heading;
    }

    while out.last().is_some_and(|l| l.trim().is_empty()) {
        out.pop();
    }
    out.join("\n")
}

// ---------------------------------------------------------------------------
// Pass 11: URLs Discord would mangle
// ---------------------------------------------------------------------------

/// Box-drawing mojibake, the replacement character, or a punycode label.
fn is_unsafe_url(url: &str) -> bool {
    url.contains("xn--")
        || url
            .chars()
            .any(|c| ('\u{2500}'..='\u{257F}').contains(&c) || c == '\u{FFFD}')
}

fn wrap_unsafe_urls(md: &str) -> String {
    static MD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"!?\[[^\]]*\]\((?P<url>https?://[^)\s]+)\)").expect("valid regex")
    });
    static BARE_URL_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"https?://[^\s<>()\[\]`]+").expect("valid regex"));

    let md = MD_LINK_RE.replace_all(md, |caps: &Captures<'_>| {
        let url = &caps["url"];
        if is_unsafe_url(url) {
            format!("`{url}`")
        } else {
            caps[0].to_string()
        }
    });

    BARE_URL_RE
        .replace_all(&md, |caps: &Captures<'_>| {
            let url = &caps[0];
            let quoted = caps
                .get(0)
                .is_some_and(|m| md[..m.start()].ends_with('`'));
            if quoted || !is_unsafe_url(url) {
                url.to_string()
            } else {
                format!("`{url}`")
            }
        })
        .into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
