//! Length limiting for Discord messages.
//!
//! Lengths are counted in characters. The cut never leaves a half-written
//! `[text](url)` behind.

use lodestone_shared::ConverterConfig;
use tracing::debug;

const ELLIPSIS: &str = "...";

/// Trim `markdown` to `config.max_length` characters.
///
/// Text at or under the limit is returned unchanged. Longer text is cut at a
/// word or line boundary near the limit, backed out of any unfinished link,
/// and closed with an ellipsis plus a "continue reading" link when `link` is
/// given and fits.
pub fn cut_message_at_max_length(markdown: &str, link: Option<&str>, config: &ConverterConfig) -> String {
    let max = config.max_length;
    let total = markdown.chars().count();
    if total <= max {
        return markdown.to_string();
    }

    let suffix = suffix_for(link, config);
    let suffix_len = suffix.chars().count();
    let chars: Vec<char> = markdown.chars().collect();
    if suffix_len > max {
        return chars[..max].iter().collect();
    }

    let budget = max - suffix_len;
    let mut cut = budget;
    // `budget < total`, so the boundary search may look at index `budget` itself.
    if let Some(boundary) = chars[..=budget].iter().rposition(|c| *c == ' ' || *c == '\n') {
        if boundary > 0 && boundary + config.truncation_window > budget {
            cut = boundary;
        }
    }

    let cut = link_safe_cut(&chars[..cut]);
    let kept: String = chars[..cut].iter().collect();
    debug!(total, cut, "message truncated");

    format!("{}{suffix}", kept.trim_end())
}

fn suffix_for(link: Option<&str>, config: &ConverterConfig) -> String {
    match link {
        Some(link) if !link.is_empty() => {
            let with_link = format!(
                "{ELLIPSIS}\n\n*[{}]({link})*",
                config.continue_reading_label
            );
            if with_link.chars().count() < config.max_length {
                with_link
            } else {
                ELLIPSIS.to_string()
            }
        }
        _ => ELLIPSIS.to_string(),
    }
}

/// Largest prefix length of `text` that does not end inside a Markdown link.
///
/// Scans bracket and paren depth, skipping backslash-escaped characters. When
/// the text ends inside a link the cut moves to the end of the last complete
/// link, or failing that to where the open link starts.
fn link_safe_cut(text: &[char]) -> usize {
    let mut brackets = 0usize;
    let mut parens = 0usize;
    let mut in_target = false;
    let mut link_start: Option<usize> = None;
    let mut last_link_end: Option<usize> = None;

    for (i, &c) in text.iter().enumerate() {
        if i > 0 && text[i - 1] == '\\' {
            continue;
        }
        match c {
            '[' if !in_target => {
                if brackets == 0 {
                    let image = i > 0 && text[i - 1] == '!';
                    link_start = Some(if image { i - 1 } else { i });
                }
                brackets += 1;
            }
            ']' if !in_target && brackets > 0 => {
                brackets -= 1;
                if brackets == 0 {
                    if text.get(i + 1) == Some(&'(') {
                        in_target = true;
                    } else {
                        link_start = None;
                    }
                }
            }
            '(' if in_target => parens += 1,
            ')' if in_target && parens > 0 => {
                parens -= 1;
                if parens == 0 {
                    in_target = false;
                    link_start = None;
                    last_link_end = Some(i + 1);
                }
            }
            _ => {}
        }
    }

    if brackets == 0 && !in_target {
        return text.len();
    }
    match (last_link_end, link_start) {
        (Some(end), _) => end,
        (None, Some(start)) => start,
        (None, None) => 0,
    }
}
