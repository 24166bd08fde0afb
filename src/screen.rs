//! The shared terminal surface.
//!
//! `Screen` keeps a model of everything on the display and repaints it through
//! ratatui, whose buffer diff only emits the cells that changed: moving the
//! highlight rewrites two rows, a spinner tick rewrites one glyph.
//! `ScreenGuard` is the only way to reach a `Screen` from more than one task.

use chrono::{DateTime, Local};
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, Terminal};
use std::io;
use std::sync::{Arc, Mutex};

use crate::types::{AppError, ContainerRecord, Result};
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Info,
    Success,
    Error,
    Prompt,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScreenModel {
    pub records: Vec<ContainerRecord>,
    pub selected: usize,
    pub include_stopped: bool,
    pub status: StatusLine,
    /// Spinner text for the running operation. Shown only while `status` is empty.
    pub progress: Option<String>,
    pub refreshed_at: Option<DateTime<Local>>,
    pub panel: Option<Panel>,
    pub nav_hints: Vec<(String, String)>,
}

pub struct Screen<B: Backend> {
    terminal: Terminal<B>,
    model: ScreenModel,
    owns_tty: bool,
}

impl<B: Backend> Screen<B> {
    /// `owns_tty` is true when the backend writes to the process terminal, which
    /// then has to be handed back while an attach session runs.
    pub fn new(terminal: Terminal<B>, owns_tty: bool) -> Self {
        Self {
            terminal,
            model: ScreenModel::default(),
            owns_tty,
        }
    }

    pub fn model(&self) -> &ScreenModel {
        &self.model
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.terminal.backend_mut()
    }

    fn repaint(&mut self) -> Result<()> {
        let model = &self.model;
        self.terminal
            .draw(|f| ui::draw(f, model))
            .map(|_| ())
            .map_err(|e| AppError::Display(e.to_string()))
    }

    pub fn render_frame(
        &mut self,
        records: Vec<ContainerRecord>,
        selected: usize,
        include_stopped: bool,
    ) -> Result<()> {
        self.model.records = records;
        self.model.selected = selected;
        self.model.include_stopped = include_stopped;
        self.repaint()
    }

    /// Moves the highlight without touching the record list.
    pub fn render_selection(&mut self, selected: usize) -> Result<()> {
        self.model.selected = selected;
        self.repaint()
    }

    pub fn render_status_line(&mut self, text: impl Into<String>, tone: Tone) -> Result<()> {
        self.model.status = StatusLine {
            text: text.into(),
            tone,
        };
        self.repaint()
    }

    pub fn render_progress(&mut self, text: impl Into<String>) -> Result<()> {
        self.model.progress = Some(text.into());
        self.repaint()
    }

    pub fn clear_progress(&mut self) -> Result<()> {
        self.model.progress = None;
        self.repaint()
    }

    pub fn clear_status_line(&mut self) -> Result<()> {
        self.render_status_line(String::new(), Tone::Info)
    }

    pub fn render_help_overlay(
        &mut self,
        title: impl Into<String>,
        lines: Vec<String>,
    ) -> Result<()> {
        self.model.panel = Some(Panel {
            title: title.into(),
            lines,
        });
        self.repaint()
    }

    pub fn close_overlay(&mut self) -> Result<()> {
        self.model.panel = None;
        self.repaint()
    }

    pub fn render_refresh_stamp(&mut self, at: DateTime<Local>) -> Result<()> {
        self.model.refreshed_at = Some(at);
        self.repaint()
    }

    pub fn set_nav_hints(&mut self, hints: Vec<(String, String)>) {
        self.model.nav_hints = hints;
    }

    /// Full re-layout after a terminal size change.
    pub fn relayout(&mut self) -> Result<()> {
        self.terminal
            .autoresize()
            .and_then(|_| self.terminal.clear())
            .map_err(|e| AppError::Display(e.to_string()))?;
        self.repaint()
    }

    /// Hands the terminal to `f` (an interactive session) and takes it back
    /// afterwards with a full redraw.
    pub fn suspend<T>(&mut self, f: impl FnOnce() -> T) -> Result<T> {
        if self.owns_tty {
            disable_raw_mode()?;
            execute!(io::stdout(), LeaveAlternateScreen, Show)?;
        }
        let result = f();
        if self.owns_tty {
            enable_raw_mode()?;
            execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        }
        self.terminal
            .clear()
            .map_err(|e| AppError::Display(e.to_string()))?;
        self.repaint()?;
        Ok(result)
    }
}

/// Mutual exclusion around every write to the shared terminal. The lock is held
/// only for the duration of the closure and released on every exit path.
pub struct ScreenGuard<B: Backend> {
    inner: Arc<Mutex<Screen<B>>>,
}

impl<B: Backend> Clone for ScreenGuard<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> ScreenGuard<B> {
    pub fn new(screen: Screen<B>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(screen)),
        }
    }

    pub fn with_screen<T>(&self, f: impl FnOnce(&mut Screen<B>) -> T) -> T {
        // A panic while painting leaves the screen usable; keep going.
        let mut screen = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut screen)
    }

    /// Runs a paint call, logging instead of propagating a rejected write.
    pub fn paint(&self, f: impl FnOnce(&mut Screen<B>) -> Result<()>) {
        if let Err(e) = self.with_screen(f) {
            tracing::warn!("Paint failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{buffer_text, record, test_screen};
    use std::thread;

    #[test]
    fn frame_shows_records_and_status() {
        let screen = test_screen(100, 12);
        screen.paint(|s| {
            s.render_frame(
                vec![record("100", "web1", "RUNNING"), record("101", "db1", "STOPPED")],
                1,
                true,
            )
        });
        screen.paint(|s| s.render_status_line("Stopped 100", Tone::Success));

        let text = screen.with_screen(|s| buffer_text(s.backend()));
        assert!(text.contains("web1"));
        assert!(text.contains("db1"));
        assert!(text.contains("STOPPED"));
        assert!(text.contains("Stopped 100"));
        assert_eq!(screen.with_screen(|s| s.model().selected), 1);
    }

    #[test]
    fn status_message_takes_precedence_over_progress() {
        let screen = test_screen(80, 10);
        screen.paint(|s| s.render_progress("| Stopping 100..."));
        screen.paint(|s| s.render_status_line("Invalid Key", Tone::Error));
        screen.paint(|s| s.render_progress("/ Stopping 100..."));

        let text = screen.with_screen(|s| buffer_text(s.backend()));
        assert!(text.contains("Invalid Key"));
        assert!(!text.contains("Stopping 100"));

        screen.paint(|s| s.clear_status_line());
        let text = screen.with_screen(|s| buffer_text(s.backend()));
        assert!(text.contains("/ Stopping 100..."));
    }

    #[test]
    fn small_terminal_degrades_to_message() {
        let screen = test_screen(30, 3);
        screen.paint(|s| s.render_frame(vec![record("100", "web1", "RUNNING")], 0, false));
        let text = screen.with_screen(|s| buffer_text(s.backend()));
        assert!(text.contains("Terminal too"));
        assert!(!text.contains("web1"));
    }

    #[test]
    fn overlay_is_drawn_and_removed() {
        let screen = test_screen(80, 12);
        screen.paint(|s| s.render_help_overlay("Help Menu", vec!["q: Quit the TUI".into()]));
        let shown = screen.with_screen(|s| buffer_text(s.backend()));
        assert!(shown.contains("q: Quit the TUI"));

        screen.paint(|s| s.close_overlay());
        let hidden = screen.with_screen(|s| buffer_text(s.backend()));
        assert!(!hidden.contains("q: Quit the TUI"));
    }

    #[test]
    fn concurrent_painters_are_serialized() {
        let screen = test_screen(80, 10);
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let screen = screen.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let text = format!("painter {} step {}", n, i);
                        screen.paint(|s| s.render_status_line(text, Tone::Info));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let status = screen.with_screen(|s| s.model().status.text.clone());
        assert!(status.starts_with("painter ") && status.ends_with("step 49"));
    }
}
