use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerState {
    Running,
    Stopped,
    Other(String), // FROZEN, STARTING, ABORTING... passed through as reported
}

impl ContainerState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "RUNNING" => ContainerState::Running,
            "STOPPED" => ContainerState::Stopped,
            other => ContainerState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ContainerState::Running => "RUNNING",
            ContainerState::Stopped => "STOPPED",
            ContainerState::Other(s) => s.as_str(),
        }
    }

    pub fn is_running(&self) -> bool {
        *self == ContainerState::Running
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One container as seen in a single snapshot. Never patched in place; a refresh
/// produces a new list of records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: String,
    pub hostname: String,
    pub state: ContainerState,
    pub ip_addresses: Vec<String>,
    pub unprivileged: String,
}

impl ContainerRecord {
    pub fn new(
        id: impl Into<String>,
        hostname: impl Into<String>,
        state: ContainerState,
        ip_addresses: Vec<String>,
        unprivileged: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            hostname: hostname.into(),
            state,
            ip_addresses,
            unprivileged: unprivileged.into(),
        }
    }

    pub fn ip_list(&self) -> String {
        self.ip_addresses.join(", ")
    }
}

/// A single external lifecycle step, or restart (stop then start).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    Start,
    Stop,
    Restart,
}

impl LifecycleAction {
    pub fn verb(&self) -> &'static str {
        match self {
            LifecycleAction::Start => "start",
            LifecycleAction::Stop => "stop",
            LifecycleAction::Restart => "restart",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            LifecycleAction::Start => "Started",
            LifecycleAction::Stop => "Stopped",
            LifecycleAction::Restart => "Restarted",
        }
    }

    pub fn progressive(&self) -> &'static str {
        match self {
            LifecycleAction::Start => "Starting",
            LifecycleAction::Stop => "Stopping",
            LifecycleAction::Restart => "Restarting",
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Transient per-keypress request. `attach_after` is set when the operator asked to
/// attach to a stopped container: the start runs first, then the session opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    pub container_id: String,
    pub action: LifecycleAction,
    pub confirmed: bool,
    pub attach_after: bool,
}

impl OperationRequest {
    pub fn new(container_id: impl Into<String>, action: LifecycleAction) -> Self {
        Self {
            container_id: container_id.into(),
            action,
            confirmed: false,
            attach_after: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationOutcome {
    Succeeded,
    Failed,
    TimedOut,
}

impl OperationOutcome {
    pub fn success(&self) -> bool {
        *self == OperationOutcome::Succeeded
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSpec {
    pub key: char,
    pub action: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub poll_interval_secs: u64,
    pub operation_timeout_secs: u64,
    pub spinner_interval_ms: u64,
    pub input_poll_ms: u64,
    pub message_timeout_secs: u64,
    pub show_stopped: bool,
    pub pve_config_dir: String,
    pub bindings: Vec<BindingSpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            operation_timeout_secs: 15,
            spinner_interval_ms: 50,
            input_poll_ms: 50,
            message_timeout_secs: 2,
            show_stopped: false,
            pve_config_dir: "/etc/pve/lxc".to_string(),
            bindings: Vec::new(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Fetch error: {0}")]
    Fetch(String),
    #[error("Operation timed out after {0}s")]
    OperationTimeout(u64),
    #[error("Operation failed: {0}")]
    Operation(String),
    #[error("Display error: {0}")]
    Display(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
