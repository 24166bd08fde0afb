//! The dispatcher: single consumer of terminal input.
//!
//! Each tick waits a short, bounded time for input and then does its periodic
//! bookkeeping (message expiry, completed-operation pickup, repaint after a
//! background refresh), so one thread serves both the operator and the
//! background tasks.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::backend::Backend;
use std::collections::BTreeMap;
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::app::Shared;
use crate::events::input::InputSource;
use crate::events::key_bindings::{Command, Keymap};
use crate::executor::{CommandExecutor, OperationHandle};
use crate::screen::Tone;
use crate::signals::{OperationDone, PauseGuard};
use crate::types::{
    AppConfig, AppError, ContainerRecord, LifecycleAction, OperationOutcome, OperationRequest,
    Result,
};

#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    pub input_poll: Duration,
    pub message_timeout: Duration,
    pub operation_timeout: Duration,
    pub spinner_interval: Duration,
}

impl From<&AppConfig> for DispatchSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            input_poll: Duration::from_millis(config.input_poll_ms),
            message_timeout: Duration::from_secs(config.message_timeout_secs),
            operation_timeout: Duration::from_secs(config.operation_timeout_secs),
            spinner_interval: Duration::from_millis(config.spinner_interval_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ModalConfirm,
    OperationPending,
    ShuttingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

struct PendingOperation {
    request: OperationRequest,
    handle: OperationHandle,
    // Keeps the poller off the store until the post-operation refresh is done.
    pause: PauseGuard,
}

enum DispatchState {
    Idle,
    ModalConfirm,
    OperationPending(PendingOperation),
    ShuttingDown,
}

pub struct Dispatcher<B: Backend, I: InputSource> {
    shared: Shared<B>,
    input: I,
    keymap: Keymap,
    executor: CommandExecutor<B>,
    done: Arc<OperationDone>,
    settings: DispatchSettings,
    poller: Option<JoinHandle<()>>,
    state: DispatchState,
    selected: usize,
    message_deadline: Option<Instant>,
    shown_generation: Option<u64>,
}

impl<B, I> Dispatcher<B, I>
where
    B: Backend + Send + 'static,
    I: InputSource,
{
    pub fn new(shared: Shared<B>, input: I, keymap: Keymap, settings: DispatchSettings) -> Self {
        let done = OperationDone::new();
        let executor = CommandExecutor::new(
            Arc::clone(&shared.runtime),
            shared.screen.clone(),
            Arc::clone(&done),
            settings.operation_timeout,
            settings.spinner_interval,
        );
        Self {
            shared,
            input,
            keymap,
            executor,
            done,
            settings,
            poller: None,
            state: DispatchState::Idle,
            selected: 0,
            message_deadline: None,
            shown_generation: None,
        }
    }

    /// Poller task joined on shutdown.
    pub fn attach_poller(&mut self, handle: JoinHandle<()>) {
        self.poller = Some(handle);
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            DispatchState::Idle => Phase::Idle,
            DispatchState::ModalConfirm => Phase::ModalConfirm,
            DispatchState::OperationPending(_) => Phase::OperationPending,
            DispatchState::ShuttingDown => Phase::ShuttingDown,
        }
    }

    pub fn operation_in_progress(&self) -> bool {
        matches!(self.state, DispatchState::OperationPending(_))
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub async fn run(&mut self) -> Result<()> {
        self.repaint_frame();
        loop {
            if self.tick().await? == Flow::Quit {
                break;
            }
        }
        self.shutdown().await;
        Ok(())
    }

    /// One pass of the loop: bookkeeping, then at most one input event.
    pub async fn tick(&mut self) -> Result<Flow> {
        self.expire_message();

        if self.operation_in_progress() && self.done.is_set() {
            self.complete_operation().await;
        }

        if self.shown_generation != Some(self.shared.store.generation()) {
            self.repaint_frame();
        }

        match self.poll_input()? {
            Some(event) => self.handle_event(event).await,
            None => Ok(Flow::Continue),
        }
    }

    fn poll_input(&mut self) -> Result<Option<Event>> {
        let timeout = self.settings.input_poll;
        let input = &mut self.input;
        tokio::task::block_in_place(|| input.poll_event(timeout))
    }

    fn read_input(&mut self) -> Result<Event> {
        let input = &mut self.input;
        tokio::task::block_in_place(|| input.read_event())
    }

    async fn handle_event(&mut self, event: Event) -> Result<Flow> {
        match event {
            Event::Resize(cols, rows) => {
                tracing::debug!("Terminal resized to {}x{}", cols, rows);
                self.relayout();
                Ok(Flow::Continue)
            }
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key).await,
            _ => Ok(Flow::Continue),
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) -> Result<Flow> {
        let Some(command) = self.keymap.lookup(key.code) else {
            self.flash("Invalid Key", Tone::Error);
            return Ok(Flow::Continue);
        };

        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Up => self.navigate(-1),
            Command::Down => self.navigate(1),
            Command::ToggleStopped => self.toggle_stopped().await,
            Command::Help => self.show_help(),
            Command::Info => self.show_info().await,
            Command::Attach
            | Command::ToggleRun
            | Command::Start
            | Command::Stop
            | Command::Restart => self.request_operation(command).await,
        }
        Ok(Flow::Continue)
    }

    fn visible_len(&self) -> usize {
        self.shared.store.visible().len()
    }

    fn selected_record(&self) -> Option<ContainerRecord> {
        self.shared.store.visible().get(self.selected).cloned()
    }

    fn navigate(&mut self, delta: isize) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let old = self.selected;
        let new = old.saturating_add_signed(delta).min(len - 1);
        if new == old {
            return;
        }
        self.selected = new;
        // Only the two highlight rows differ from the last frame.
        self.shared.screen.paint(|s| s.render_selection(new));
    }

    async fn toggle_stopped(&mut self) {
        if self.operation_in_progress() {
            self.flash("Operation in progress, please wait", Tone::Error);
            return;
        }
        let _pause = self.shared.pause.raise();
        let include_stopped = self.shared.store.toggle_filter();
        tracing::debug!("Stopped containers {}", if include_stopped { "shown" } else { "hidden" });
        self.refresh_store().await;
        self.selected = 0;
        self.repaint_frame();
    }

    async fn request_operation(&mut self, command: Command) {
        if self.operation_in_progress() {
            self.flash("Operation in progress, please wait", Tone::Error);
            return;
        }
        let Some(record) = self.selected_record() else {
            return;
        };
        let id = record.id.clone();
        let running = record.state.is_running();

        let (mut request, prompt) = match command {
            Command::Attach if running => {
                self.attach(&id).await;
                return;
            }
            Command::Attach => {
                let mut request = OperationRequest::new(&id, LifecycleAction::Start);
                request.attach_after = true;
                (request, format!("{} is currently stopped. Start and attach? (y/n)", id))
            }
            Command::ToggleRun if running => (
                OperationRequest::new(&id, LifecycleAction::Stop),
                format!("Stopping container {}... (y/n)", id),
            ),
            Command::ToggleRun | Command::Start => {
                if running {
                    self.flash(format!("Container {} is already running", id), Tone::Error);
                    return;
                }
                (
                    OperationRequest::new(&id, LifecycleAction::Start),
                    format!("Starting container {}... (y/n)", id),
                )
            }
            Command::Stop => {
                if !running {
                    self.flash(format!("Container {} is not running", id), Tone::Error);
                    return;
                }
                (
                    OperationRequest::new(&id, LifecycleAction::Stop),
                    format!("Stopping container {}... (y/n)", id),
                )
            }
            Command::Restart => {
                if !running {
                    self.flash(
                        format!("Container {} is not running, cannot restart", id),
                        Tone::Error,
                    );
                    return;
                }
                (
                    OperationRequest::new(&id, LifecycleAction::Restart),
                    format!("Restarting container {}... (y/n)", id),
                )
            }
            _ => return,
        };

        let _pause = self.shared.pause.raise();
        self.state = DispatchState::ModalConfirm;
        // Start-and-attach insists on an explicit answer; the others treat
        // any other key as "no".
        request.confirmed = self.confirm(&prompt, request.attach_after);
        self.state = DispatchState::Idle;

        if !request.confirmed {
            tracing::debug!("{} on {} declined", request.action, request.container_id);
            self.flash("Action canceled", Tone::Prompt);
            return;
        }

        if let Err(e) = self.start_operation(request) {
            self.flash(e.to_string(), Tone::Error);
        }
    }

    /// Blocking yes/no prompt on the status line. With `strict`, keys other
    /// than y/n are ignored.
    fn confirm(&mut self, prompt: &str, strict: bool) -> bool {
        self.message_deadline = None;
        self.shared
            .screen
            .paint(|s| s.render_status_line(prompt, Tone::Prompt));
        loop {
            match self.read_input() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => return true,
                    KeyCode::Char('n') | KeyCode::Char('N') => return false,
                    _ if !strict => return false,
                    _ => {}
                },
                Ok(Event::Resize(_, _)) => self.relayout(),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Confirmation read failed: {}", e);
                    return false;
                }
            }
        }
    }

    /// Hands a confirmed request to the executor. Refused while another
    /// operation is in flight.
    pub fn start_operation(&mut self, request: OperationRequest) -> Result<()> {
        if self.operation_in_progress() {
            return Err(AppError::Operation(format!(
                "cannot {} {}: another operation is in progress",
                request.action, request.container_id
            )));
        }
        let pause = self.shared.pause.raise();
        self.done.clear();
        let handle = self.executor.execute(request.action, &request.container_id);
        // Drop the prompt so the progress indicator shows through.
        self.message_deadline = None;
        self.shared.screen.paint(|s| s.clear_status_line());
        self.state = DispatchState::OperationPending(PendingOperation {
            request,
            handle,
            pause,
        });
        Ok(())
    }

    async fn complete_operation(&mut self) {
        let DispatchState::OperationPending(pending) =
            mem::replace(&mut self.state, DispatchState::Idle)
        else {
            return;
        };
        let PendingOperation {
            request,
            handle,
            pause,
        } = pending;

        let outcome = handle.finish().await;
        let id = &request.container_id;
        let (message, tone) = match outcome {
            OperationOutcome::Succeeded => (
                format!("{} {}", request.action.past_tense(), id),
                Tone::Success,
            ),
            OperationOutcome::Failed => (
                format!("Failed to {} {}", request.action.verb(), id),
                Tone::Error,
            ),
            OperationOutcome::TimedOut => (
                format!("Timed out trying to {} {}", request.action.verb(), id),
                Tone::Error,
            ),
        };

        self.refresh_store().await;
        self.repaint_frame();
        self.flash(message, tone);
        drop(pause);

        if outcome.success() && request.attach_after {
            self.attach(id).await;
        }
    }

    async fn refresh_store(&mut self) {
        let include_stopped = self.shared.store.include_stopped();
        match self.shared.runtime.list_containers(include_stopped).await {
            Ok(records) => self.shared.store.replace(records),
            Err(e) => {
                tracing::warn!("Refresh after operation failed: {}", e);
                self.flash("Failed to refresh containers", Tone::Error);
            }
        }
    }

    async fn attach(&mut self, id: &str) {
        let _pause = self.shared.pause.raise();
        tracing::info!("Attaching to container {}", id);
        let runtime = Arc::clone(&self.shared.runtime);
        let result = self
            .shared
            .screen
            .with_screen(|s| s.suspend(|| tokio::task::block_in_place(|| runtime.attach(id))));

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("Attach to {} failed: {}", id, e);
                self.flash(format!("Failed to attach to {}", id), Tone::Error);
            }
            Err(e) => tracing::warn!("Could not hand over terminal: {}", e),
        }

        self.refresh_store().await;
        self.repaint_frame();
    }

    fn show_help(&mut self) {
        let lines = self.keymap.help_lines(self.shared.store.include_stopped());
        self.show_panel("Help Menu", lines);
    }

    async fn show_info(&mut self) {
        let Some(record) = self.selected_record() else {
            return;
        };
        let _pause = self.shared.pause.raise();
        let details = self.shared.runtime.container_details(&record.id).await;
        self.show_panel(&format!("LXC Information (ID: {})", record.id), info_lines(&details));
    }

    /// Modal panel closed by any key.
    fn show_panel(&mut self, title: &str, lines: Vec<String>) {
        let _pause = self.shared.pause.raise();
        self.shared
            .screen
            .paint(|s| s.render_help_overlay(title, lines));
        loop {
            match self.read_input() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => break,
                Ok(Event::Resize(_, _)) => self.relayout(),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Panel read failed: {}", e);
                    break;
                }
            }
        }
        self.shared.screen.paint(|s| s.close_overlay());
    }

    fn flash(&mut self, text: impl Into<String>, tone: Tone) {
        let text = text.into();
        self.shared
            .screen
            .paint(|s| s.render_status_line(text, tone));
        self.message_deadline = Some(Instant::now() + self.settings.message_timeout);
    }

    fn expire_message(&mut self) {
        if let Some(deadline) = self.message_deadline {
            if Instant::now() >= deadline {
                self.message_deadline = None;
                self.shared.screen.paint(|s| s.clear_status_line());
            }
        }
    }

    fn repaint_frame(&mut self) {
        let generation = self.shared.store.generation();
        let records = self.shared.store.visible();
        self.selected = match records.len() {
            0 => 0,
            n => self.selected.min(n - 1),
        };
        let selected = self.selected;
        let include_stopped = self.shared.store.include_stopped();
        let hints = self.keymap.nav_hints(include_stopped);
        self.shared.screen.paint(|s| {
            s.set_nav_hints(hints);
            s.render_frame(records, selected, include_stopped)
        });
        self.shown_generation = Some(generation);
    }

    fn relayout(&mut self) {
        self.shared.screen.paint(|s| s.relayout());
    }

    /// Stops the poller and lets an in-flight operation run to its own end.
    pub async fn shutdown(&mut self) {
        let previous = mem::replace(&mut self.state, DispatchState::ShuttingDown);
        self.shared.stop.trigger();
        self.shared
            .screen
            .paint(|s| s.render_status_line("Goodbye!", Tone::Success));

        if let DispatchState::OperationPending(pending) = previous {
            tracing::info!(
                "Waiting for {} on {} before exit",
                pending.request.action,
                pending.request.container_id
            );
            let outcome = pending.handle.finish().await;
            tracing::info!("Pending operation ended: {:?}", outcome);
        }

        if let Some(poller) = self.poller.take() {
            if let Err(e) = poller.await {
                tracing::warn!("Poller task ended abnormally: {}", e);
            }
        }
    }
}

pub fn info_lines(details: &BTreeMap<String, String>) -> Vec<String> {
    let mut lines = vec![format!("{:<20}{:<30}", "Property", "Value"), "-".repeat(50)];
    for (key, value) in details {
        lines.push(format!("{:<20}{:<30}", capitalize(key), value));
    }
    lines
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
