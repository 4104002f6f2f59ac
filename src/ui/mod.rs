use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::chat::{Message, ViewerZone};

pub mod bubble;
pub mod row;

use row::{render_row, RowLayout};

pub fn draw(f: &mut Frame<'_>, app: &mut App) {
    let size = f.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Chat list
            Constraint::Length(3), // Key hints
        ])
        .split(size);

    // The list clamps the scroll offset, so draw it before the title reads it.
    draw_chat_list(f, app, chunks[1]);
    draw_title_bar(f, app, chunks[0]);
    draw_key_hints(f, chunks[2]);
}

fn draw_title_bar(f: &mut Frame, app: &App, area: Rect) {
    let total = app.messages.len();
    let title = format!(
        " {} messages | zone: {} | row {}/{} ",
        total,
        app.zone,
        if total == 0 { 0 } else { app.scroll_offset + 1 },
        total
    );

    let title_block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Cyan))
        .title(" ChatLayout ");

    let title_paragraph = Paragraph::new(title)
        .block(title_block)
        .alignment(Alignment::Center);

    f.render_widget(title_paragraph, area);
}

fn draw_chat_list(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Chat ")
        .style(Style::default().fg(Color::White));

    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.messages.is_empty() {
        let hint = Paragraph::new(Line::from(Span::styled(
            "No messages.",
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )));
        f.render_widget(hint, inner);
        return;
    }
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let last_page = bottom_offset(
        &app.messages,
        app.zone,
        inner.width,
        inner.height,
        app.max_bubble_width_percent,
    );
    app.scroll_offset = app.scroll_offset.min(last_page);

    let mut y = inner.y;
    let mut shown = 0;
    for index in app.scroll_offset..app.messages.len() {
        let Some(row) = app.zone.present(&app.messages, index) else {
            break;
        };
        let layout = RowLayout::measure(&row, inner.width, app.max_bubble_width_percent);

        let remaining = inner.bottom().saturating_sub(y);
        // A row taller than the whole list is drawn clipped; otherwise only whole rows.
        if remaining == 0 || (layout.height() > remaining && shown > 0) {
            break;
        }

        let row_area = Rect::new(inner.x, y, inner.width, layout.height().min(remaining));
        render_row(f, row_area, &row, &layout, &mut app.bubbles);

        y += row_area.height;
        shown += 1;
    }
    app.page_rows = shown.max(1);
}

/// Smallest offset whose rows from there to the end all fit in `height`.
pub fn bottom_offset(
    messages: &[Message],
    zone: ViewerZone,
    width: u16,
    height: u16,
    max_bubble_percent: u16,
) -> usize {
    let mut used: u32 = 0;
    let mut offset = messages.len();
    while offset > 0 {
        let Some(row) = zone.present(messages, offset - 1) else {
            break;
        };
        used += u32::from(RowLayout::measure(&row, width, max_bubble_percent).height());
        if used > u32::from(height) {
            break;
        }
        offset -= 1;
    }
    offset.min(messages.len().saturating_sub(1))
}

fn draw_key_hints(f: &mut Frame, area: Rect) {
    let hints = Line::from(vec![
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" scroll  "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" page  "),
        Span::styled("Home/End", Style::default().fg(Color::Yellow)),
        Span::raw(" top/bottom  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]);

    let hints_paragraph = Paragraph::new(hints)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    f.render_widget(hints_paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{parse_seed, ScriptedSource};
    use crate::config::Config;
    use ratatui::{backend::TestBackend, Terminal};

    fn app(repeat: usize) -> App {
        let source = ScriptedSource::new(parse_seed("2020-01-03T10:44:00Z").unwrap(), repeat);
        let config = Config {
            time_zone: "utc".to_string(),
            ..Config::default()
        };
        App::new(&source, &config).unwrap()
    }

    fn render(app: &mut App, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        (0..height)
            .map(|y| (0..width).map(|x| buffer.get(x, y).symbol().to_string()).collect())
            .collect()
    }

    fn find(lines: &[String], needle: &str) -> Option<usize> {
        lines.iter().position(|line| line.contains(needle))
    }

    #[test]
    fn first_page_shows_separator_header_and_body() {
        let mut app = app(8);
        let lines = render(&mut app, 80, 30);

        let separator = find(&lines, "Jan 3, 2020").expect("date separator");
        let header = find(&lines, "Ricky Bobby, 10:44 AM").expect("header");
        let body = find(&lines, "1: Hello").expect("bubble text");
        assert!(separator < header && header < body);

        // Same day: only one separator before the day changes.
        assert_eq!(lines.iter().filter(|l| l.contains("Jan 3, 2020")).count(), 1);
    }

    #[test]
    fn sent_rows_hug_the_right_edge() {
        let mut app = app(1);
        let lines = render(&mut app, 80, 40);

        let received = &lines[find(&lines, "Ricky Bobby, 10:44 AM").unwrap()];
        let sent = &lines[find(&lines, "Cal Naughton Jr, 10:54 AM").unwrap()];
        let col = |line: &str, needle: &str| line.find(needle).unwrap();
        assert!(col(received, "Ricky") < 10);
        assert!(col(sent, "Cal") > 40);
    }

    #[test]
    fn end_key_reaches_the_last_message() {
        let mut app = app(8);
        app.scroll_to_bottom();
        let lines = render(&mut app, 80, 30);
        assert!(find(&lines, "48: If we've done this right").is_some());
        assert!(app.scroll_offset < 47);
        assert!(app.page_rows > 1);
    }

    #[test]
    fn bottom_offset_leaves_everything_visible_when_it_fits() {
        let app = app(1);
        assert_eq!(bottom_offset(&app.messages, app.zone, 80, 200, 75), 0);
        assert_eq!(bottom_offset(&app.messages, app.zone, 80, 1, 75), 5);
    }

    #[test]
    fn bubble_shapes_are_reused_across_draws() {
        let mut app = app(8);
        render(&mut app, 80, 30);
        let after_first = app.bubbles.computed();
        render(&mut app, 80, 30);
        assert_eq!(app.bubbles.computed(), after_first);
    }

    #[test]
    fn empty_list_shows_hint() {
        let mut app = app(1);
        app.messages.clear();
        let lines = render(&mut app, 60, 12);
        assert!(find(&lines, "No messages.").is_some());
    }
}
