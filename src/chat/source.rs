use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use super::{Direction, Message};

pub const DEFAULT_SEED: &str = "2020-01-03T10:44:00+0000";
pub const DEFAULT_REPEAT_COUNT: usize = 8;
/// Upper bound on repetitions; the clock gains almost three days per pass.
pub const MAX_REPEAT_COUNT: usize = 10_000;

const RICKY: &str = "Ricky Bobby";
const CAL: &str = "Cal Naughton Jr";

/// One step of the sample conversation: who says what, and how far the clock
/// moves before the next message.
struct ScriptStep {
    author: &'static str,
    body: &'static str,
    direction: Direction,
    advance_minutes: i64,
}

const DAY_MINUTES: i64 = 24 * 60;

const SCRIPT: [ScriptStep; 6] = [
    ScriptStep {
        author: RICKY,
        body: "Hello",
        direction: Direction::Received,
        advance_minutes: 5,
    },
    ScriptStep {
        author: RICKY,
        body: "Are you there?",
        direction: Direction::Received,
        advance_minutes: 5,
    },
    ScriptStep {
        author: CAL,
        body: "Yes, I'm here.",
        direction: Direction::Sent,
        advance_minutes: 12,
    },
    ScriptStep {
        author: CAL,
        body: "What do you want?",
        direction: Direction::Sent,
        advance_minutes: DAY_MINUTES + 20,
    },
    ScriptStep {
        author: RICKY,
        body: "Just testing the chat layout.",
        direction: Direction::Received,
        advance_minutes: DAY_MINUTES + 37,
    },
    ScriptStep {
        author: RICKY,
        body: "If we've done this right, everything is working as it should!",
        direction: Direction::Received,
        advance_minutes: 5,
    },
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid seed timestamp '{input}': expected ISO-8601 such as 2020-01-03T10:44:00+0000")]
pub struct SeedError {
    pub input: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Repeat count {requested} exceeds the maximum of {max}")]
    TooManyRepetitions { requested: usize, max: usize },

    #[error("Message {index} is older than the message before it ({current} < {previous})")]
    OutOfOrder {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
}

/// Parse a seed timestamp. Accepts RFC 3339 (`Z` or `+00:00`) as well as the
/// compact `+0000` offset form.
pub fn parse_seed(input: &str) -> Result<DateTime<Utc>, SeedError> {
    let trimmed = input.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| SeedError {
            input: input.to_string(),
        })
}

/// Anything that can hand the chat screen its messages. The scripted
/// conversation is the only implementation; a network or storage backed
/// source plugs in here.
pub trait MessageSource {
    fn load(&self) -> Result<Vec<Message>, SourceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedSource {
    pub seed: DateTime<Utc>,
    pub repeat_count: usize,
}

impl ScriptedSource {
    pub fn new(seed: DateTime<Utc>, repeat_count: usize) -> Self {
        Self { seed, repeat_count }
    }

    pub fn from_seed_str(seed: &str, repeat_count: usize) -> Result<Self, SeedError> {
        Ok(Self::new(parse_seed(seed)?, repeat_count))
    }

    /// Runs the script at most `MAX_REPEAT_COUNT` times; `load` rejects
    /// larger counts outright.
    pub fn generate(&self) -> Vec<Message> {
        let repetitions = self.repeat_count.min(MAX_REPEAT_COUNT);
        let mut messages = Vec::with_capacity(SCRIPT.len() * repetitions);
        let mut clock = self.seed;

        // The clock keeps running across repetitions.
        for _ in 0..repetitions {
            for step in &SCRIPT {
                messages.push(Message::new(clock, step.author, step.body, step.direction));
                clock += Duration::minutes(step.advance_minutes);
            }
        }

        number_bodies(&mut messages);
        messages
    }
}

impl MessageSource for ScriptedSource {
    fn load(&self) -> Result<Vec<Message>, SourceError> {
        if self.repeat_count > MAX_REPEAT_COUNT {
            return Err(SourceError::TooManyRepetitions {
                requested: self.repeat_count,
                max: MAX_REPEAT_COUNT,
            });
        }
        let messages = self.generate();
        check_order(&messages)?;
        tracing::debug!(
            count = messages.len(),
            seed = %self.seed,
            repeat_count = self.repeat_count,
            "Generated scripted conversation"
        );
        Ok(messages)
    }
}

/// Prefix every body with its 1-based position.
fn number_bodies(messages: &mut [Message]) {
    for (i, message) in messages.iter_mut().enumerate() {
        message.body = format!("{}: {}", i + 1, message.body);
    }
}

/// Verify that timestamps never go backwards.
pub fn check_order(messages: &[Message]) -> Result<(), SourceError> {
    for (index, pair) in messages.windows(2).enumerate() {
        if pair[1].timestamp < pair[0].timestamp {
            return Err(SourceError::OutOfOrder {
                index: index + 1,
                previous: pair[0].timestamp,
                current: pair[1].timestamp,
            });
        }
    }
    Ok(())
}
