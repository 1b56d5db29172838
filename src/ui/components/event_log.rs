use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::checker::{KeyDirection, LogEntry};
use crate::ui::theme::Theme;

/// Scrolling key event log, newest line at the bottom.
pub struct EventLog<'a> {
    entries: &'a [LogEntry],
    theme: &'a Theme,
}

impl<'a> EventLog<'a> {
    pub fn new(entries: &'a [LogEntry], theme: &'a Theme) -> Self {
        Self { entries, theme }
    }
}

/// The entries that fit in `height` rows, oldest first.
pub fn visible_tail(entries: &[LogEntry], height: usize) -> &[LogEntry] {
    &entries[entries.len().saturating_sub(height)..]
}

impl Widget for EventLog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Event Log ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.entries.is_empty() {
            Paragraph::new(Line::styled(
                "Press any key to start",
                Style::default().fg(colors.text_pending()),
            ))
            .render(inner, buf);
            return;
        }

        let lines: Vec<Line> = visible_tail(self.entries, inner.height as usize)
            .iter()
            .map(|entry| {
                let color = match entry.direction {
                    KeyDirection::Down => colors.fg(),
                    KeyDirection::Up => colors.text_pending(),
                };
                Line::styled(entry.line(), Style::default().fg(color))
            })
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }
}
