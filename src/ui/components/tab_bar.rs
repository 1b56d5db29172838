use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use crate::app::Tab;
use crate::ui::theme::Theme;

pub struct TabBar<'a> {
    active: Tab,
    status: &'a str,
    theme: &'a Theme,
}

impl<'a> TabBar<'a> {
    pub fn new(active: Tab, status: &'a str, theme: &'a Theme) -> Self {
        Self {
            active,
            status,
            theme,
        }
    }
}

impl Widget for TabBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let base = Style::default().fg(colors.header_fg()).bg(colors.header_bg());

        let mut spans = vec![Span::styled(
            " keycheck ",
            base.add_modifier(Modifier::BOLD),
        )];
        for tab in Tab::ALL {
            let style = if tab == self.active {
                Style::default()
                    .fg(colors.bg())
                    .bg(colors.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                base.fg(colors.text_pending())
            };
            spans.push(Span::styled(format!(" {} ", tab.title()), style));
            spans.push(Span::styled(" ", base));
        }
        spans.push(Span::styled(format!(" {}", self.status), base.fg(colors.text_pending())));

        Paragraph::new(Line::from(spans)).style(base).render(area, buf);
    }
}
