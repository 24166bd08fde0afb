use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::lxc::containers::list_containers;
use crate::lxc::exec::{attach_container, run_lxc_command};
use crate::lxc::pve::read_container_config;
use crate::lxc::ContainerRuntime;
use crate::types::{ContainerRecord, LifecycleAction, Result};

/// Talks to the host through the `lxc-*` command line tools and the Proxmox
/// per-container config files.
#[derive(Clone, Debug)]
pub struct LxcClient {
    pub(crate) pve_config_dir: PathBuf,
    pub(crate) column_timeout: Duration,
}

impl LxcClient {
    pub fn new(pve_config_dir: impl Into<PathBuf>) -> Self {
        Self {
            pve_config_dir: pve_config_dir.into(),
            column_timeout: Duration::from_secs(5),
        }
    }
}

#[async_trait]
impl ContainerRuntime for LxcClient {
    async fn list_containers(&self, include_stopped: bool) -> Result<Vec<ContainerRecord>> {
        list_containers(self, include_stopped).await
    }

    async fn container_details(&self, id: &str) -> BTreeMap<String, String> {
        read_container_config(&self.pve_config_dir, id).await
    }

    async fn run_lifecycle(&self, action: LifecycleAction, id: &str) -> bool {
        let program = match action {
            LifecycleAction::Start => "lxc-start",
            LifecycleAction::Stop => "lxc-stop",
            LifecycleAction::Restart => {
                tracing::error!("restart must be composed from stop and start");
                return false;
            }
        };
        run_lxc_command(program, id).await
    }

    fn attach(&self, id: &str) -> Result<()> {
        attach_container(id)
    }
}
