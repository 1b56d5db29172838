use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::typing::{CharClass, Stage, TypingTest};
use crate::ui::theme::{Theme, ThemeColors};

pub struct TypingArea<'a> {
    typing: &'a TypingTest,
    theme: &'a Theme,
}

impl<'a> TypingArea<'a> {
    pub fn new(typing: &'a TypingTest, theme: &'a Theme) -> Self {
        Self { typing, theme }
    }
}

fn class_style(class: CharClass, colors: &ThemeColors) -> Style {
    match class {
        CharClass::Matched => Style::default().fg(colors.text_correct()),
        CharClass::Mismatched => Style::default()
            .fg(colors.text_incorrect())
            .bg(colors.text_incorrect_bg())
            .add_modifier(Modifier::UNDERLINED),
        CharClass::Cursor => Style::default()
            .fg(colors.text_cursor_fg())
            .bg(colors.text_cursor_bg()),
        CharClass::Pending => Style::default().fg(colors.text_pending()),
    }
}

/// Merge runs of equally classified characters into spans.
fn quote_spans(classes: &[(char, CharClass)], colors: &ThemeColors) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut run = String::new();
    let mut run_class = None;
    for &(ch, class) in classes {
        if run_class != Some(class) && !run.is_empty() {
            if let Some(prev) = run_class {
                spans.push(Span::styled(std::mem::take(&mut run), class_style(prev, colors)));
            }
        }
        run_class = Some(class);
        run.push(ch);
    }
    if let Some(class) = run_class {
        if !run.is_empty() {
            spans.push(Span::styled(run, class_style(class, colors)));
        }
    }
    spans
}

impl Widget for TypingArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let session = &self.typing.session;

        let title = format!(
            " {} | {} ",
            self.typing.pack_title(),
            session.tier.display_name()
        );
        let border = if session.stage == Stage::Running {
            colors.border_focused()
        } else {
            colors.border()
        };
        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        if session.target().is_empty() {
            Paragraph::new(Line::styled(
                "No prompts available for this pack",
                Style::default().fg(colors.warning()),
            ))
            .render(layout[0], buf);
            return;
        }

        let spans = quote_spans(&self.typing.classify(), colors);
        Paragraph::new(Line::from(spans))
            .wrap(Wrap { trim: false })
            .render(layout[0], buf);

        if !session.prompt.source.is_empty() {
            Paragraph::new(Line::styled(
                format!("  \u{2014} {}", session.prompt.source),
                Style::default()
                    .fg(colors.text_pending())
                    .add_modifier(Modifier::ITALIC),
            ))
            .render(layout[1], buf);
        }

        let focus = self.typing.focus();
        let letter = if focus.letter == " " {
            "\u{2423}".to_string()
        } else {
            focus.letter
        };
        let status = match session.stage {
            Stage::Idle => "type or press Enter to start",
            Stage::Running => "running",
            Stage::Done => "done",
        };
        let label = Style::default().fg(colors.text_pending());
        let value = Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD);
        Paragraph::new(Line::from(vec![
            Span::styled("  Word: ", label),
            Span::styled(focus.word, value),
            Span::styled("   Letter: ", label),
            Span::styled(letter, value),
            Span::styled(format!("   [{status}]"), label),
        ]))
        .render(layout[2], buf);
    }
}
