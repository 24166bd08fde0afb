use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::screen::Panel;
use crate::ui::layout::centered_rect;

/// Modal box used for the help and info panels.
pub fn render_panel(f: &mut Frame<'_>, area: Rect, panel: &Panel) {
    let content_width = panel
        .lines
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(panel.title.chars().count()))
        .max()
        .unwrap_or(0) as u16;
    let width = content_width.saturating_add(4);
    let height = (panel.lines.len() as u16).saturating_add(2);
    let popup_area = centered_rect(width, height, area);

    f.render_widget(Clear, popup_area);

    let lines: Vec<Line> = panel.lines.iter().map(|l| Line::from(l.as_str())).collect();
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            .title(format!(" {} ", panel.title)),
    );
    f.render_widget(paragraph, popup_area);
}
