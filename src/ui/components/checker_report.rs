use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::keyboard::display::keycap_label;
use crate::session::checker::KeyChecker;
use crate::session::result::CheckerOutcome;
use crate::ui::theme::Theme;

/// Status panel under the board: awaiting input, the finish prompt, or the
/// missing-key report once the session is over.
pub struct CheckerReport<'a> {
    checker: &'a KeyChecker,
    theme: &'a Theme,
}

impl<'a> CheckerReport<'a> {
    pub fn new(checker: &'a KeyChecker, theme: &'a Theme) -> Self {
        Self { checker, theme }
    }
}

/// `Label (Code)` for each missing key.
pub fn missing_lines(checker: &KeyChecker, missing: &[&'static str]) -> Vec<String> {
    let layout = checker.session.layout();
    missing
        .iter()
        .map(|code| match layout.find(code) {
            Some(key) => format!("{} ({code})", keycap_label(key, checker.os)),
            None => (*code).to_string(),
        })
        .collect()
}

impl Widget for CheckerReport<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let pending = Style::default().fg(colors.text_pending());

        let (title, border, lines) = match &self.checker.outcome {
            Some(CheckerOutcome::Complete) => (
                " Complete ",
                colors.success(),
                vec![
                    Line::styled(
                        "Every key on this layout works!",
                        Style::default()
                            .fg(colors.success())
                            .add_modifier(Modifier::BOLD),
                    ),
                    Line::styled("Ctrl+R to test again", pending),
                ],
            ),
            Some(CheckerOutcome::Missing(missing)) => {
                let mut lines = vec![Line::styled(
                    format!("{} key(s) never pressed:", missing.len()),
                    Style::default()
                        .fg(colors.warning())
                        .add_modifier(Modifier::BOLD),
                )];
                let names = missing_lines(self.checker, missing).join(", ");
                lines.push(Line::styled(names, Style::default().fg(colors.fg())));
                lines.push(Line::styled("Ctrl+R to test again", pending));
                (" Missing keys ", colors.warning(), lines)
            }
            None if self.checker.confirm_open => (
                " Finish ",
                colors.accent(),
                vec![Line::from(vec![
                    Span::styled(
                        "Did you press every key? ",
                        Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled("[y] finish  [n] keep testing", pending),
                ])],
            ),
            None => {
                let pressed = self.checker.session.ever_pressed.len();
                let expected = self.checker.session.layout().expected_keys().len();
                let status = if self.checker.session.started {
                    format!("{pressed}/{expected} keys seen")
                } else {
                    "Awaiting input: press any key".to_string()
                };
                let mut lines = vec![Line::styled(status, Style::default().fg(colors.fg()))];
                if let Some(hint) = self.checker.hint {
                    lines.push(Line::styled(hint, Style::default().fg(colors.accent())));
                }
                (" Status ", colors.border(), lines)
            }
        };

        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(colors.bg()));
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::display::HostOs;
    use crate::keyboard::layout::FormFactor;
    use crate::store::prefs::MemoryPrefStore;

    #[test]
    fn test_missing_lines_use_keycap_labels() {
        let checker =
            KeyChecker::initialize(&MemoryPrefStore::default(), FormFactor::Sixty, HostOs::Mac);
        let lines = missing_lines(&checker, &["MetaLeft", "KeyZ"]);
        assert_eq!(lines, vec!["Cmd (MetaLeft)", "Z (KeyZ)"]);
    }
}
