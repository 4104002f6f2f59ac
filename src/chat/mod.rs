use chrono::{DateTime, Utc};

pub use presenter::{RowPresentation, SeparatorLayout, ViewerZone};
pub use source::{
    parse_seed, MessageSource, ScriptedSource, DEFAULT_REPEAT_COUNT, DEFAULT_SEED, MAX_REPEAT_COUNT,
};

pub mod presenter;
pub mod source;

/// Which side of the conversation a message belongs to, from the viewer's
/// point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub body: String,
    pub direction: Direction,
}

impl Message {
    pub fn new(timestamp: DateTime<Utc>, author: &str, body: &str, direction: Direction) -> Self {
        Self {
            timestamp,
            author: author.to_string(),
            body: body.to_string(),
            direction,
        }
    }
}
