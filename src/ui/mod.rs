pub mod container_list;
pub mod help;
pub mod layout;
pub mod status_bar;

use ratatui::{text::Line, widgets::Paragraph, Frame};

use crate::screen::ScreenModel;
use crate::ui::container_list::render_container_list;
use crate::ui::help::render_panel;
use crate::ui::layout::{get_main_layout, is_too_small, MIN_HEIGHT, MIN_WIDTH};
use crate::ui::status_bar::{render_nav_bar, render_status_line};

pub fn draw(f: &mut Frame<'_>, model: &ScreenModel) {
    let area = f.area();
    if is_too_small(area) {
        let msg = format!(
            "Terminal too small. Enlarge to {} lines, {} cols.",
            MIN_HEIGHT, MIN_WIDTH
        );
        f.render_widget(Paragraph::new(Line::from(msg)), area);
        return;
    }

    let (list, status, nav) = get_main_layout(area);
    render_container_list(f, list, model);
    render_status_line(f, status, model);
    render_nav_bar(f, nav, model);

    if let Some(panel) = &model.panel {
        render_panel(f, area, panel);
    }
}
