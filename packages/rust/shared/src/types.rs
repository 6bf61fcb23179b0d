//! Output types shared by the timestamp rewriter and the Markdown converter.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Discord timestamp markup
// ---------------------------------------------------------------------------

/// Rendering style of a Discord `<t:SECONDS:STYLE>` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampStyle {
    /// `t`, e.g. "16:20".
    ShortTime,
    /// `f`, e.g. "20 April 2021 16:20".
    ShortDateTime,
    /// `F`, e.g. "Tuesday, 20 April 2021 16:20".
    LongDateTime,
}

impl TimestampStyle {
    /// The single-letter style code used in the tag.
    pub fn code(self) -> char {
        match self {
            Self::ShortTime => 't',
            Self::ShortDateTime => 'f',
            Self::LongDateTime => 'F',
        }
    }
}

/// A fully resolved Discord timestamp tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimestampTag {
    /// Unix epoch seconds.
    pub seconds: i64,
    pub style: TimestampStyle,
}

impl TimestampTag {
    pub fn new(seconds: i64, style: TimestampStyle) -> Self {
        Self { seconds, style }
    }
}

impl fmt::Display for TimestampTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<t:{}:{}>", self.seconds, self.style.code())
    }
}

// ---------------------------------------------------------------------------
// Components v2
// ---------------------------------------------------------------------------

/// A typed display block of a structured Discord message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscordComponent {
    /// A run of Markdown text.
    TextDisplay { content: String },
    /// Consecutive images, in document order.
    MediaGallery { urls: Vec<String> },
    /// Visual divider (from an `<hr>`).
    Separator,
    /// Link to a video stream or VOD.
    Stream { url: String },
}

/// Ordered block sequence produced by the components splitter.
///
/// Never holds two consecutive [`DiscordComponent::TextDisplay`] entries
/// once [`ComponentsMessage::merge_adjacent_text`] has run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentsMessage {
    pub components: Vec<DiscordComponent>,
}

impl ComponentsMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, component: DiscordComponent) {
        self.components.push(component);
    }

    /// Append a text block unless it is blank after trimming.
    pub fn push_text(&mut self, content: &str) {
        let content = content.trim();
        if !content.is_empty() {
            self.components.push(DiscordComponent::TextDisplay {
                content: content.to_string(),
            });
        }
    }

    /// Concatenate runs of adjacent text blocks with a blank line between them.
    pub fn merge_adjacent_text(&mut self) {
        let mut merged: Vec<DiscordComponent> = Vec::with_capacity(self.components.len());
        for component in self.components.drain(..) {
            match (merged.last_mut(), component) {
                (
                    Some(DiscordComponent::TextDisplay { content: previous }),
                    DiscordComponent::TextDisplay { content },
                ) => {
                    previous.push_str("\n\n");
                    previous.push_str(&content);
                }
                (_, component) => merged.push(component),
            }
        }
        self.components = merged;
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Maintenance window
// ---------------------------------------------------------------------------

/// Start/end of a maintenance window extracted from an announcement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceTimestamps {
    pub start_timestamp: Option<i64>,
    pub end_timestamp: Option<i64>,
}

impl MaintenanceTimestamps {
    /// Convert both bounds from epoch seconds to epoch milliseconds.
    pub fn in_millis(self) -> Self {
        Self {
            start_timestamp: self.start_timestamp.map(|s| s * 1000),
            end_timestamp: self.end_timestamp.map(|s| s * 1000),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_timestamp.is_none() && self.end_timestamp.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_tag_renders() {
        let tag = TimestampTag::new(1759831200, TimestampStyle::ShortDateTime);
        assert_eq!(tag.to_string(), "<t:1759831200:f>");
        assert_eq!(
            TimestampTag::new(0, TimestampStyle::LongDateTime).to_string(),
            "<t:0:F>"
        );
    }

    #[test]
    fn components_serialize_with_type_tag() {
        let message = ComponentsMessage {
            components: vec![
                DiscordComponent::TextDisplay {
                    content: "hello".into(),
                },
                DiscordComponent::Separator,
                DiscordComponent::MediaGallery {
                    urls: vec!["https://img.example/a.png".into()],
                },
                DiscordComponent::Stream {
                    url: "https://www.twitch.tv/videos/1".into(),
                },
            ],
        };

        let json = serde_json::to_value(&message).expect("serialize");
        assert_eq!(json["components"][0]["type"], "text_display");
        assert_eq!(json["components"][1], serde_json::json!({"type": "separator"}));
        assert_eq!(json["components"][2]["urls"][0], "https://img.example/a.png");
        assert_eq!(json["components"][3]["type"], "stream");
    }

    #[test]
    fn merge_adjacent_text_joins_runs() {
        let mut message = ComponentsMessage::new();
        message.push_text("one");
        message.push_text("two");
        message.push(DiscordComponent::Separator);
        message.push_text("three");
        message.push_text("   ");
        message.merge_adjacent_text();

        assert_eq!(
            message.components,
            vec![
                DiscordComponent::TextDisplay {
                    content: "one\n\ntwo".into()
                },
                DiscordComponent::Separator,
                DiscordComponent::TextDisplay {
                    content: "three".into()
                },
            ]
        );
    }

    #[test]
    fn maintenance_in_millis() {
        let window = MaintenanceTimestamps {
            start_timestamp: Some(10),
            end_timestamp: None,
        };
        let ms = window.in_millis();
        assert_eq!(ms.start_timestamp, Some(10_000));
        assert_eq!(ms.end_timestamp, None);
        assert!(MaintenanceTimestamps::default().is_empty());
    }
}
