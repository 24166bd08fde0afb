pub mod client;
pub mod containers;
pub mod exec;
pub mod pve;

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::types::{ContainerRecord, LifecycleAction, Result};

pub use client::LxcClient;

/// Everything the dashboard needs from the container host.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Current containers. Fails with `AppError::Fetch` when the host tooling is
    /// unavailable or its output cannot be read.
    async fn list_containers(&self, include_stopped: bool) -> Result<Vec<ContainerRecord>>;

    /// Best-effort key/value details; empty when nothing is known.
    async fn container_details(&self, id: &str) -> BTreeMap<String, String>;

    /// Runs one start or stop step. `Restart` is composed by the executor and is
    /// never passed here. Dropping the future must terminate the external process.
    async fn run_lifecycle(&self, action: LifecycleAction, id: &str) -> bool;

    /// Interactive session bound to the caller's terminal. Blocks until it ends.
    fn attach(&self, id: &str) -> Result<()>;
}
