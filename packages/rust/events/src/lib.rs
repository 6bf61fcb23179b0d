//! Event links and schedules from Lodestone topics.
//!
//! Topic descriptions point at special-event pages through a "Read on for
//! details" short link or a Moogle Treasure Trove link. This crate finds those
//! links, classifies the event page, and reads its schedule from the page's
//! meta description. Fetching pages is left to the caller.

mod links;
mod page;
mod schedule;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use links::{
    absolute_lodestone_url, extract_moogle_treasure_trove_url, extract_short_url, find_event_link,
};
pub use page::{EventPage, detect_event_type, event_type_from_page};
pub use schedule::{parse_event_timeframe, parse_gmt_date};

/// Kind of event a topic links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "Special Event")]
    SpecialEvent,
    /// Runs until the next patch release, so it has no fixed end.
    #[serde(rename = "Moogle Treasure Trove")]
    MoogleTreasureTrove,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SpecialEvent => "Special Event",
            Self::MoogleTreasureTrove => "Moogle Treasure Trove",
        })
    }
}

/// Start and optional end of an event, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTimeframe {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub from: i64,
    pub to: Option<i64>,
}
