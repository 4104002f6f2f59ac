use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};

use crate::chat::{Direction, Message, MessageSource, RowPresentation, ViewerZone};
use crate::config::Config;
use crate::ui::bubble::BubbleCache;

pub struct App {
    pub should_quit: bool,
    pub messages: Vec<Message>,
    pub zone: ViewerZone,
    pub max_bubble_width_percent: u16,

    /// Index of the topmost visible row. Clamped on every draw.
    pub scroll_offset: usize,
    /// Rows that fit on screen in the last draw.
    pub page_rows: usize,

    pub bubbles: BubbleCache,
}

impl App {
    pub fn new(source: &dyn MessageSource, config: &Config) -> Result<Self> {
        let messages = source.load()?;
        let zone = config.zone()?;
        tracing::info!(count = messages.len(), %zone, "Loaded messages");

        Ok(Self {
            should_quit: false,
            messages,
            zone,
            max_bubble_width_percent: config.max_bubble_width_percent,
            scroll_offset: 0,
            page_rows: 1,
            bubbles: BubbleCache::new(config.corner_radius),
        })
    }

    pub fn handle_input(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key_event(key),
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => self.scroll_up(1),
                MouseEventKind::ScrollDown => self.scroll_down(1),
                _ => {}
            },
            _ => {}
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(self.page_rows),
            KeyCode::PageDown => self.scroll_down(self.page_rows),
            KeyCode::Home | KeyCode::Char('g') => self.scroll_offset = 0,
            KeyCode::End | KeyCode::Char('G') => self.scroll_to_bottom(),
            _ => {}
        }
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: usize) {
        let last = self.messages.len().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + rows).min(last);
    }

    /// The next draw pulls this back to the last full page.
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.messages.len().saturating_sub(1);
    }

    pub fn row(&self, index: usize) -> Option<RowPresentation<'_>> {
        self.zone.present(&self.messages, index)
    }

    /// Plain-text rendering of every row, top to bottom.
    pub fn transcript(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for index in 0..self.messages.len() {
            let Some(row) = self.row(index) else { break };
            if row.show_date_separator {
                lines.push(row.date_separator.clone());
            }
            let marker = match row.direction {
                Direction::Received => '<',
                Direction::Sent => '>',
            };
            lines.push(format!("{} {}", marker, row.header));
            lines.push(format!("  {}", row.body));
        }
        lines
    }
}
