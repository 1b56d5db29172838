use std::collections::HashMap;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Widget};

use crate::keyboard::display::{HostOs, keycap_label};
use crate::keyboard::layout::{KeyDef, Layout};
use crate::session::checker::KeyVisual;
use crate::ui::theme::Theme;

const MIN_COLS_PER_UNIT: u16 = 2;
const MAX_COLS_PER_UNIT: u16 = 6;

/// Terminal cell for one keycap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyCell {
    pub code: &'static str,
    pub rect: Rect,
}

/// Terminal columns per layout unit and rows per layout row for `area`, or
/// `None` when the board does not fit.
pub fn scale(layout: &Layout, area: Rect) -> Option<(u16, u16)> {
    let width_units = layout.width_units();
    if width_units <= 0.0 {
        return None;
    }
    let cols = ((area.width as f32) / width_units).floor() as u16;
    if cols < MIN_COLS_PER_UNIT {
        return None;
    }
    let rows_needed = layout.height_units() as u16;
    let rows = if area.height >= rows_needed * 2 {
        2
    } else if area.height >= rows_needed {
        1
    } else {
        return None;
    };
    Some((cols.min(MAX_COLS_PER_UNIT), rows))
}

/// Map every interactive key of `layout` to a cell inside `area`. Keys are
/// separated by one blank column, and by one blank row when there is room.
pub fn key_cells(layout: &'static Layout, area: Rect) -> Vec<KeyCell> {
    let Some((cols, rows)) = scale(layout, area) else {
        return Vec::new();
    };
    let board_width = (layout.width_units() * cols as f32).round() as u16;
    let left = area.x + area.width.saturating_sub(board_width) / 2;

    layout
        .place()
        .into_iter()
        .map(|placed| {
            let x0 = (placed.x * cols as f32).round() as u16;
            let x1 = ((placed.x + placed.key.width) * cols as f32).round() as u16;
            let y0 = (placed.y * rows as f32).round() as u16;
            let y1 = ((placed.y + placed.key.height) * rows as f32).round() as u16;
            let width = x1.saturating_sub(x0).saturating_sub(1).max(1);
            let height = y1.saturating_sub(y0).saturating_sub(rows - 1).max(1);
            KeyCell {
                code: placed.key.code,
                rect: Rect::new(left + x0, area.y + y0, width, height),
            }
        })
        .collect()
}

pub struct KeyboardView<'a> {
    layout: &'static Layout,
    states: &'a [(&'static KeyDef, KeyVisual)],
    os: HostOs,
    title: String,
    theme: &'a Theme,
}

impl<'a> KeyboardView<'a> {
    pub fn new(
        layout: &'static Layout,
        states: &'a [(&'static KeyDef, KeyVisual)],
        os: HostOs,
        title: String,
        theme: &'a Theme,
    ) -> Self {
        Self {
            layout,
            states,
            os,
            title,
            theme,
        }
    }
}

impl Widget for KeyboardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.is_empty() {
            return;
        }

        let cells = key_cells(self.layout, inner);
        if cells.is_empty() {
            buf.set_stringn(
                inner.x,
                inner.y,
                "Terminal too small for this layout",
                inner.width as usize,
                Style::default().fg(colors.warning()),
            );
            return;
        }

        let states: HashMap<&str, (&KeyDef, KeyVisual)> = self
            .states
            .iter()
            .map(|(key, visual)| (key.code, (*key, *visual)))
            .collect();

        for cell in cells {
            let Some((key, visual)) = states.get(cell.code) else {
                continue;
            };
            let style = match visual {
                KeyVisual::Held => Style::default()
                    .fg(colors.key_held_fg())
                    .bg(colors.key_held())
                    .add_modifier(Modifier::BOLD),
                KeyVisual::Seen => Style::default()
                    .fg(colors.key_seen_fg())
                    .bg(colors.key_seen()),
                KeyVisual::Idle => Style::default()
                    .fg(colors.key_idle_fg())
                    .bg(colors.key_idle()),
            };

            buf.set_style(cell.rect, style);
            let label = keycap_label(key, self.os);
            let label: String = label.chars().take(cell.rect.width as usize).collect();
            let pad = (cell.rect.width as usize).saturating_sub(label.chars().count()) / 2;
            buf.set_string(cell.rect.x + pad as u16, cell.rect.y, &label, style);
        }
    }
}
