//! Scripted stand-ins for the host and the terminal used across unit tests.

use async_trait::async_trait;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::TestBackend, Terminal};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::events::input::InputSource;
use crate::lxc::ContainerRuntime;
use crate::screen::{Screen, ScreenGuard};
use crate::types::{AppError, ContainerRecord, ContainerState, LifecycleAction, Result};

pub fn record(id: &str, hostname: &str, state: &str) -> ContainerRecord {
    ContainerRecord::new(
        id,
        hostname,
        ContainerState::parse(state),
        vec![format!("10.0.0.{}", id.len())],
        "true",
    )
}

pub fn test_screen(width: u16, height: u16) -> ScreenGuard<TestBackend> {
    let terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    ScreenGuard::new(Screen::new(terminal, false))
}

pub fn buffer_text(backend: &TestBackend) -> String {
    let buffer = backend.buffer();
    let mut output = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            output.push_str(buffer[(x, y)].symbol());
        }
        output.push('\n');
    }
    output
}

pub fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

pub fn char_key(c: char) -> Event {
    key(KeyCode::Char(c))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    Hang,
    Panic,
}

/// In-memory host. Successful start/stop steps flip the record's state.
#[derive(Default)]
pub struct FakeRuntime {
    records: Mutex<Vec<ContainerRecord>>,
    behaviors: Mutex<HashMap<LifecycleAction, Behavior>>,
    step_delay: Mutex<Duration>,
    list_delay: Mutex<Duration>,
    fail_fetch: AtomicBool,
    pub lifecycle_calls: Mutex<Vec<(LifecycleAction, String)>>,
    pub list_calls: AtomicUsize,
    pub attached: Mutex<Vec<String>>,
    pub details: Mutex<BTreeMap<String, String>>,
}

impl FakeRuntime {
    pub fn new(records: Vec<ContainerRecord>) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(records),
            ..Default::default()
        })
    }

    pub fn set_behavior(&self, action: LifecycleAction, behavior: Behavior) {
        self.behaviors.lock().unwrap().insert(action, behavior);
    }

    pub fn set_step_delay(&self, delay: Duration) {
        *self.step_delay.lock().unwrap() = delay;
    }

    pub fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = delay;
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_records(&self, records: Vec<ContainerRecord>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn calls(&self) -> Vec<(LifecycleAction, String)> {
        self.lifecycle_calls.lock().unwrap().clone()
    }

    pub fn records_for(&self, include_stopped: bool) -> Vec<ContainerRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|c| include_stopped || c.state != ContainerState::Stopped)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_containers(&self, include_stopped: bool) -> Result<Vec<ContainerRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        // Snapshot taken at call time, like a real listing.
        let records = self.records_for(include_stopped);
        let delay = *self.list_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(AppError::Fetch("host unavailable".into()));
        }
        Ok(records)
    }

    async fn container_details(&self, _id: &str) -> BTreeMap<String, String> {
        self.details.lock().unwrap().clone()
    }

    async fn run_lifecycle(&self, action: LifecycleAction, id: &str) -> bool {
        self.lifecycle_calls
            .lock()
            .unwrap()
            .push((action, id.to_string()));
        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(&action)
            .copied()
            .unwrap_or(Behavior::Succeed);
        let delay = *self.step_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match behavior {
            Behavior::Hang => {
                futures::future::pending::<()>().await;
                false
            }
            Behavior::Fail => false,
            Behavior::Panic => panic!("{} {} blew up", action, id),
            Behavior::Succeed => {
                let next = match action {
                    LifecycleAction::Stop => ContainerState::Stopped,
                    _ => ContainerState::Running,
                };
                for c in self.records.lock().unwrap().iter_mut() {
                    if c.id == id {
                        c.state = next.clone();
                    }
                }
                true
            }
        }
    }

    fn attach(&self, id: &str) -> Result<()> {
        self.attached.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

type ReadHook = Arc<dyn Fn() + Send + Sync>;

/// Input that replays queued events; an empty queue behaves like an idle
/// keyboard.
#[derive(Clone, Default)]
pub struct ScriptedInput {
    queue: Arc<Mutex<VecDeque<Event>>>,
    on_read: Arc<Mutex<Option<ReadHook>>>,
}

impl ScriptedInput {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(events.into())),
            on_read: Arc::default(),
        }
    }

    pub fn push(&self, event: Event) {
        self.queue.lock().unwrap().push_back(event);
    }

    /// Runs `hook` at the start of every blocking read, i.e. while a prompt
    /// or panel is waiting for a key.
    pub fn on_read(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_read.lock().unwrap() = Some(Arc::new(hook));
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }
}

impl InputSource for ScriptedInput {
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if let Some(event) = self.queue.lock().unwrap().pop_front() {
            return Ok(Some(event));
        }
        std::thread::sleep(timeout);
        Ok(None)
    }

    fn read_event(&mut self) -> Result<Event> {
        let hook = self.on_read.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook();
        }
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Other("scripted input exhausted".into()))
    }
}
