use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;

use super::{Direction, Message};

const SEPARATOR_RULE: &str = "————";

/// Medium-style date, e.g. "Jan 3, 2020".
const MEDIUM_DATE: &str = "%b %-d, %Y";
/// Short-style time, e.g. "10:44 AM".
const SHORT_TIME: &str = "%-I:%M %p";

/// Which of the two row layouts wins for this render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorLayout {
    Shown,
    Hidden,
}

impl SeparatorLayout {
    pub fn from_visible(visible: bool) -> Self {
        if visible {
            SeparatorLayout::Shown
        } else {
            SeparatorLayout::Hidden
        }
    }

    /// Rows the separator occupies.
    pub fn height(self) -> u16 {
        match self {
            SeparatorLayout::Shown => 1,
            SeparatorLayout::Hidden => 0,
        }
    }
}

/// Display strings derived for one row. Computed on every render, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPresentation<'a> {
    pub date_separator: String,
    pub header: String,
    pub body: &'a str,
    pub direction: Direction,
    pub show_date_separator: bool,
}

impl RowPresentation<'_> {
    pub fn separator_layout(&self) -> SeparatorLayout {
        SeparatorLayout::from_visible(self.show_date_separator)
    }
}

/// The viewer's time zone, used for calendar-day comparison and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewerZone {
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl ViewerZone {
    pub fn present<'a>(&self, messages: &'a [Message], index: usize) -> Option<RowPresentation<'a>> {
        match self {
            ViewerZone::Local => present_row(messages, index, &Local),
            ViewerZone::Utc => present_row(messages, index, &Utc),
            ViewerZone::Fixed(offset) => present_row(messages, index, offset),
        }
    }
}

impl Display for ViewerZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerZone::Local => write!(f, "local"),
            ViewerZone::Utc => write!(f, "utc"),
            ViewerZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{input}' is not local, utc, or an offset like +05:30")]
pub struct ZoneError {
    pub input: String,
}

impl FromStr for ViewerZone {
    type Err = ZoneError;

    /// Accepts `local`, `utc`, or an offset like `+05:30` / `-0800`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "local" => Ok(ViewerZone::Local),
            "utc" | "z" => Ok(ViewerZone::Utc),
            _ => s
                .parse::<FixedOffset>()
                .map(ViewerZone::Fixed)
                .map_err(|_| ZoneError { input: s.to_string() }),
        }
    }
}

/// True when both instants fall on the same calendar day in `tz`.
pub fn same_local_day<Tz: TimeZone>(a: &DateTime<Utc>, b: &DateTime<Utc>, tz: &Tz) -> bool {
    a.with_timezone(tz).date_naive() == b.with_timezone(tz).date_naive()
}

/// Present row `index` of `messages` in the viewer's zone `tz`.
///
/// Returns `None` when `index` is out of range. The date separator is visible
/// on the first row and whenever the calendar day differs from the row above.
pub fn present_row<'a, Tz>(messages: &'a [Message], index: usize, tz: &Tz) -> Option<RowPresentation<'a>>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let message = messages.get(index)?;
    let local = message.timestamp.with_timezone(tz);

    let show_date_separator = match index.checked_sub(1) {
        None => true,
        Some(prev) => !same_local_day(&message.timestamp, &messages[prev].timestamp, tz),
    };

    Some(RowPresentation {
        date_separator: format!(
            "{} {} {}",
            SEPARATOR_RULE,
            local.format(MEDIUM_DATE),
            SEPARATOR_RULE
        ),
        header: format!("{}, {}", message.author, local.format(SHORT_TIME)),
        body: &message.body,
        direction: message.direction,
        show_date_separator,
    })
}
