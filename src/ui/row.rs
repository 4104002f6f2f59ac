use ratatui::{
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::Paragraph,
    Frame,
};
use textwrap::{Options, WrapAlgorithm};
use unicode_width::UnicodeWidthStr;

use super::bubble::{Bubble, BubbleCache, BUBBLE_PAD_X, BUBBLE_PAD_Y};
use crate::chat::{Direction, RowPresentation, SeparatorLayout};

/// The two row templates. They differ only in which side the bubble and
/// header hug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTemplate {
    Received,
    Sent,
}

impl RowTemplate {
    pub fn for_direction(direction: Direction) -> Self {
        match direction {
            Direction::Received => RowTemplate::Received,
            Direction::Sent => RowTemplate::Sent,
        }
    }

    pub fn alignment(self) -> Alignment {
        match self {
            RowTemplate::Received => Alignment::Left,
            RowTemplate::Sent => Alignment::Right,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            RowTemplate::Received => Direction::Received,
            RowTemplate::Sent => Direction::Sent,
        }
    }
}

/// Measured layout of one row at a given list width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout {
    pub template: RowTemplate,
    pub separator: SeparatorLayout,
    pub lines: Vec<String>,
    pub bubble_cols: u16,
    pub bubble_rows: u16,
}

impl RowLayout {
    pub fn measure(row: &RowPresentation<'_>, width: u16, max_bubble_percent: u16) -> Self {
        let max_cols = (u32::from(width) * u32::from(max_bubble_percent.clamp(1, 100)) / 100) as u16;
        let text_width = max_cols.saturating_sub(2 * BUBBLE_PAD_X).max(1);
        let lines = wrap_body(row.body, usize::from(text_width));
        let widest = lines
            .iter()
            .map(|line| UnicodeWidthStr::width(line.as_str()))
            .max()
            .unwrap_or(0) as u16;

        Self {
            template: RowTemplate::for_direction(row.direction),
            separator: row.separator_layout(),
            bubble_cols: (widest.max(1) + 2 * BUBBLE_PAD_X).min(width.max(1)),
            bubble_rows: lines.len().max(1) as u16 + 2 * BUBBLE_PAD_Y,
            lines,
        }
    }

    /// Separator, header, bubble, then one blank spacer row.
    pub fn constraints(&self) -> [Constraint; 4] {
        [
            Constraint::Length(self.separator.height()),
            Constraint::Length(1),
            Constraint::Length(self.bubble_rows),
            Constraint::Length(1),
        ]
    }

    pub fn height(&self) -> u16 {
        self.separator.height() + 1 + self.bubble_rows + 1
    }
}

/// Wrap a message body to `width` columns: greedy, by display width, keeping
/// the author's line breaks and splitting words longer than a line.
pub fn wrap_body(text: &str, width: usize) -> Vec<String> {
    let options = Options::new(width.max(1)).wrap_algorithm(WrapAlgorithm::FirstFit);
    textwrap::wrap(text, options)
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

pub fn render_row(
    f: &mut Frame<'_>,
    area: Rect,
    row: &RowPresentation<'_>,
    layout: &RowLayout,
    bubbles: &mut BubbleCache,
) {
    let chunks = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints(layout.constraints())
        .split(area);

    if layout.separator == SeparatorLayout::Shown {
        let separator = Paragraph::new(row.date_separator.as_str())
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(separator, chunks[0]);
    }

    let alignment = layout.template.alignment();
    let header = Paragraph::new(row.header.as_str())
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .alignment(alignment);
    f.render_widget(header, chunks[1]);

    let bubble_area = chunks[2];
    let cols = layout.bubble_cols.min(bubble_area.width);
    let x = match alignment {
        Alignment::Right => bubble_area.right().saturating_sub(cols),
        _ => bubble_area.x,
    };
    let target = Rect::new(x, bubble_area.y, cols, bubble_area.height);

    let shape = bubbles.shape(layout.template.direction(), layout.bubble_cols, layout.bubble_rows);
    f.render_widget(Bubble::new(shape, &layout.lines), target);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presentation(body: &str, direction: Direction, shown: bool) -> RowPresentation<'_> {
        RowPresentation {
            date_separator: "———— Jan 3, 2020 ————".to_string(),
            header: "Ricky Bobby, 10:44 AM".to_string(),
            body,
            direction,
            show_date_separator: shown,
        }
    }

    #[test]
    fn template_follows_direction() {
        assert_eq!(RowTemplate::for_direction(Direction::Received).alignment(), Alignment::Left);
        assert_eq!(RowTemplate::for_direction(Direction::Sent).alignment(), Alignment::Right);
        assert_eq!(RowTemplate::Sent.direction(), Direction::Sent);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            wrap_body("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
        assert_eq!(wrap_body("", 10), vec![""]);
    }

    #[test]
    fn splits_words_longer_than_the_line() {
        assert_eq!(wrap_body("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_body("ab abcdefgh", 4), vec!["ab", "abcd", "efgh"]);
    }

    #[test]
    fn keeps_line_breaks_in_the_body() {
        assert_eq!(wrap_body("one\ntwo three", 20), vec!["one", "two three"]);

        let row = presentation("first line\nsecond", Direction::Received, false);
        let layout = RowLayout::measure(&row, 80, 75);
        assert_eq!(layout.lines, vec!["first line", "second"]);
        assert_eq!(layout.bubble_rows, 2 + 2 * BUBBLE_PAD_Y);
    }

    #[test]
    fn measures_wide_characters_by_display_width() {
        // Each ideograph takes two columns.
        assert_eq!(wrap_body("日本語テキスト", 6), vec!["日本語", "テキス", "ト"]);
    }

    #[test]
    fn bubble_width_capped_by_percentage() {
        let text = "1: This message has enough text to cause word-wrap in a narrow list";
        let row = presentation(text, Direction::Sent, false);
        let layout = RowLayout::measure(&row, 40, 75);
        assert!(layout.bubble_cols <= 30);
        assert!(layout.lines.len() > 1);
        assert_eq!(layout.bubble_rows, layout.lines.len() as u16 + 2);
    }

    #[test]
    fn short_message_gets_a_snug_bubble() {
        let row = presentation("1: Hello", Direction::Received, true);
        let layout = RowLayout::measure(&row, 80, 75);
        assert_eq!(layout.lines, vec!["1: Hello"]);
        assert_eq!(layout.bubble_cols, 8 + 2 * BUBBLE_PAD_X);
        assert_eq!(layout.height(), 1 + 1 + 3 + 1);
    }

    #[test]
    fn hidden_separator_collapses_its_row() {
        let row = presentation("2: Are you there?", Direction::Received, false);
        let layout = RowLayout::measure(&row, 80, 75);
        assert_eq!(layout.constraints()[0], Constraint::Length(0));
        assert_eq!(layout.height(), 5);
    }
}
