use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget};

use crate::session::result::TypingResult;
use crate::ui::theme::Theme;

/// Results popup for a finished typing run.
pub struct Dashboard<'a> {
    pub result: &'a TypingResult,
    pub theme: &'a Theme,
}

impl<'a> Dashboard<'a> {
    pub fn new(result: &'a TypingResult, theme: &'a Theme) -> Self {
        Self { result, theme }
    }
}

impl Widget for Dashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        Clear.render(area, buf);
        let block = Block::bordered()
            .title(" Results ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        let title = Paragraph::new(Line::styled(
            format!("{} WPM", self.result.wpm),
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center);
        title.render(layout[0], buf);

        let acc_color = if self.result.accuracy >= 95 {
            colors.success()
        } else if self.result.accuracy >= 85 {
            colors.warning()
        } else {
            colors.error()
        };
        Paragraph::new(Line::styled(
            self.result.accuracy_line(),
            Style::default().fg(acc_color),
        ))
        .alignment(Alignment::Center)
        .render(layout[1], buf);

        Paragraph::new(Line::styled(
            self.result.wpm_line(),
            Style::default().fg(colors.fg()),
        ))
        .alignment(Alignment::Center)
        .render(layout[2], buf);

        Paragraph::new(Line::from(vec![
            Span::styled("[Enter] Retry  ", Style::default().fg(colors.accent())),
            Span::styled("[Esc] New prompt", Style::default().fg(colors.accent())),
        ]))
        .alignment(Alignment::Center)
        .render(layout[4], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_result_lines() {
        let result = TypingResult {
            correct: 2,
            expected: 3,
            accuracy: 67,
            elapsed_minutes: 0.5,
            wpm: 10,
        };
        let theme = Theme::default();
        let area = Rect::new(0, 0, 60, 12);
        let mut buf = Buffer::empty(area);
        Dashboard::new(&result, &theme).render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("2/3 characters = 67% accuracy"));
        assert!(text.contains("10 WPM"));
    }
}
