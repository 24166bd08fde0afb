use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::screen::{ScreenModel, Tone};

const SHORT_NAV: &str = "Up/Down - Navigate | h - Help | q - Quit";

fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Info => Style::default().fg(Color::Green),
        Tone::Success => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        Tone::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Tone::Prompt => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    }
}

/// A message wins over the spinner until it is cleared.
pub fn render_status_line(f: &mut Frame<'_>, area: Rect, model: &ScreenModel) {
    let (text, tone) = match &model.progress {
        Some(progress) if model.status.text.is_empty() => (progress.as_str(), Tone::Prompt),
        _ => (model.status.text.as_str(), model.status.tone),
    };
    let line = Line::from(Span::styled(text, tone_style(tone)));
    f.render_widget(Paragraph::new(line), area);
}

/// Full command list when it fits, a short form otherwise.
pub fn nav_text(model: &ScreenModel, width: u16) -> String {
    let full = model
        .nav_hints
        .iter()
        .map(|(key, desc)| format!("{} - {}", key, desc))
        .collect::<Vec<_>>()
        .join(" | ");
    let width = width as usize;
    if full.chars().count() <= width {
        return full;
    }
    if SHORT_NAV.len() <= width {
        return SHORT_NAV.to_string();
    }
    let mut cut: String = SHORT_NAV.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

pub fn render_nav_bar(f: &mut Frame<'_>, area: Rect, model: &ScreenModel) {
    let text = nav_text(model, area.width);
    let bar = Paragraph::new(text).style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nav_text_falls_back_to_short_form() {
        let mut model = ScreenModel::default();
        model.nav_hints = vec![
            ("Up/Down".into(), "Navigate".into()),
            ("x".into(), "Stop/Start".into()),
            ("q".into(), "Quit".into()),
        ];
        assert_eq!(nav_text(&model, 200), "Up/Down - Navigate | x - Stop/Start | q - Quit");
        assert_eq!(nav_text(&model, 42), SHORT_NAV);
        assert_eq!(nav_text(&model, 10), "Up/Down...");
    }
}
