use crossterm::event::KeyCode;

use crate::types::BindingSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Up,
    Down,
    Attach,
    /// Stop when running, start otherwise.
    ToggleRun,
    Start,
    Stop,
    Restart,
    Info,
    Help,
    ToggleStopped,
    Quit,
}

impl Command {
    pub fn parse(action: &str) -> Option<Self> {
        let command = match action.trim().to_ascii_lowercase().as_str() {
            "up" => Command::Up,
            "down" => Command::Down,
            "attach" => Command::Attach,
            "toggle" => Command::ToggleRun,
            "start" => Command::Start,
            "stop" => Command::Stop,
            "restart" => Command::Restart,
            "info" => Command::Info,
            "help" => Command::Help,
            "filter" => Command::ToggleStopped,
            "quit" => Command::Quit,
            _ => return None,
        };
        Some(command)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::Up => "Move up",
            Command::Down => "Move down",
            Command::Attach => "Attach",
            Command::ToggleRun => "Stop/Start",
            Command::Start => "Start",
            Command::Stop => "Stop",
            Command::Restart => "Restart",
            Command::Info => "Info",
            Command::Help => "Help",
            Command::ToggleStopped => "Show/Hide Stopped",
            Command::Quit => "Quit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub command: Command,
    pub label: String,
    pub description: String,
    /// Shown in the help panel and navigation bar.
    pub listed: bool,
}

impl KeyBinding {
    fn builtin(
        key: KeyCode,
        command: Command,
        label: &str,
        description: &str,
        listed: bool,
    ) -> Self {
        Self {
            key,
            command,
            label: label.to_string(),
            description: description.to_string(),
            listed,
        }
    }
}

fn default_bindings() -> Vec<KeyBinding> {
    vec![
        KeyBinding::builtin(KeyCode::Up, Command::Up, "Up/Down", "Navigate", true),
        KeyBinding::builtin(KeyCode::Char('k'), Command::Up, "k", "Move up", false),
        KeyBinding::builtin(KeyCode::Down, Command::Down, "Down", "Move down", false),
        KeyBinding::builtin(KeyCode::Char('j'), Command::Down, "j", "Move down", false),
        KeyBinding::builtin(KeyCode::Enter, Command::Attach, "Enter/Space", "Attach", true),
        KeyBinding::builtin(KeyCode::Char(' '), Command::Attach, "Space", "Attach", false),
        KeyBinding::builtin(KeyCode::Char('i'), Command::Info, "i", "Info", true),
        KeyBinding::builtin(KeyCode::Char('x'), Command::ToggleRun, "x", "Stop/Start", true),
        KeyBinding::builtin(KeyCode::Char('r'), Command::Restart, "r", "Restart", true),
        KeyBinding::builtin(KeyCode::Char('h'), Command::Help, "h", "Help", true),
        KeyBinding::builtin(KeyCode::Char('?'), Command::Help, "?", "Help", false),
        KeyBinding::builtin(
            KeyCode::Char('s'),
            Command::ToggleStopped,
            "s",
            "Show/Hide Stopped",
            true,
        ),
        KeyBinding::builtin(KeyCode::Char('q'), Command::Quit, "q", "Quit", true),
        KeyBinding::builtin(KeyCode::Esc, Command::Quit, "Esc", "Quit", false),
    ]
}

/// Key to command table, built once at startup from the built-ins plus any
/// bindings declared in the config file. Built-in keys cannot be rebound.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: Vec<KeyBinding>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            bindings: default_bindings(),
        }
    }
}

impl Keymap {
    pub fn with_extra(extra: &[BindingSpec]) -> Self {
        let mut keymap = Self::default();
        for spec in extra {
            let Some(command) = Command::parse(&spec.action) else {
                tracing::warn!(
                    "Ignoring binding for '{}': unknown action '{}'",
                    spec.key,
                    spec.action
                );
                continue;
            };
            let key = KeyCode::Char(spec.key);
            if keymap.lookup(key).is_some() {
                tracing::warn!("Ignoring binding for '{}': key already bound", spec.key);
                continue;
            }
            keymap.bindings.push(KeyBinding {
                key,
                command,
                label: spec.key.to_string(),
                description: spec
                    .description
                    .clone()
                    .unwrap_or_else(|| command.description().to_string()),
                listed: true,
            });
        }
        keymap
    }

    pub fn lookup(&self, key: KeyCode) -> Option<Command> {
        self.bindings.iter().find(|b| b.key == key).map(|b| b.command)
    }

    pub fn listed(&self) -> impl Iterator<Item = &KeyBinding> {
        self.bindings.iter().filter(|b| b.listed)
    }

    /// Navigation bar entries; the filter label follows the current state.
    pub fn nav_hints(&self, include_stopped: bool) -> Vec<(String, String)> {
        self.listed()
            .map(|b| {
                let description = if b.command == Command::ToggleStopped {
                    let label = if include_stopped { "Hide Stopped" } else { "Show Stopped" };
                    label.to_string()
                } else {
                    b.description.clone()
                };
                (b.label.clone(), description)
            })
            .collect()
    }

    pub fn help_lines(&self, include_stopped: bool) -> Vec<String> {
        let mut lines = vec![String::new(), "Available Commands:".to_string()];
        for (label, description) in self.nav_hints(include_stopped) {
            lines.push(format!("  - {}: {}", label, description));
        }
        lines.push(String::new());
        lines.push("Press any key to return...".to_string());
        lines
    }
}
