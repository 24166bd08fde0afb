use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style, Stylize},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::screen::ScreenModel;
use crate::types::ContainerState;

const ID_WIDTH: u16 = 6;
const HOSTNAME_WIDTH: u16 = 20;
const STATE_WIDTH: u16 = 10;
const UNPRIV_WIDTH: u16 = 12;

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut out: String = text.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

pub fn render_container_list(f: &mut Frame<'_>, area: Rect, model: &ScreenModel) {
    let header_cells = ["ID", "HOSTNAME", "STATE", "IP ADDRESSES", "UNPRIVILEGED"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().bold()));
    let header = Row::new(header_cells).height(1);

    let fixed = ID_WIDTH + HOSTNAME_WIDTH + STATE_WIDTH + UNPRIV_WIDTH + 6;
    let ip_width = area.width.saturating_sub(fixed).max(8);

    let rows = model.records.iter().map(|c| {
        let color = match c.state {
            ContainerState::Running => Color::Green,
            _ => Color::Red,
        };
        let cells = vec![
            Cell::from(c.id.clone()),
            Cell::from(truncate(&c.hostname, HOSTNAME_WIDTH as usize)),
            Cell::from(c.state.to_string()),
            Cell::from(truncate(&c.ip_list(), ip_width as usize)),
            Cell::from(c.unprivileged.clone()),
        ];
        Row::new(cells).height(1).style(Style::default().fg(color))
    });

    let widths = [
        Constraint::Length(ID_WIDTH),
        Constraint::Length(HOSTNAME_WIDTH),
        Constraint::Length(STATE_WIDTH),
        Constraint::Length(ip_width),
        Constraint::Length(UNPRIV_WIDTH),
    ];

    let running = model
        .records
        .iter()
        .filter(|c| c.state.is_running())
        .count();
    let refreshed = model
        .refreshed_at
        .map(|t| format!(", refreshed {}", t.format("%H:%M:%S")))
        .unwrap_or_default();
    let filter = if model.include_stopped { "all" } else { "running" };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .title(format!(
                    " Containers ({}, {} running, showing {}{}) ",
                    model.records.len(),
                    running,
                    filter,
                    refreshed
                ))
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    let selected = if model.records.is_empty() {
        None
    } else {
        Some(model.selected.min(model.records.len() - 1))
    };
    let mut state = TableState::default().with_selected(selected);
    f.render_stateful_widget(table, area, &mut state);
}
