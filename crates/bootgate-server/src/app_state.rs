// ABOUTME: Shared application state for the bootgate HTTP server.
// ABOUTME: Holds the live config snapshot, setup gate, committer, and pluggable auth and restart hooks.

use std::sync::Arc;
use std::time::Duration;

use bootgate_core::ConfigSnapshot;
use bootgate_store::{SetupCommitter, StateLayout};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::config::DEFAULT_RESTART_DELAY_MS;
use crate::connect_auth::{ConnectionAuthorizer, GatewayAuthorizer};
use crate::gate::SetupGate;
use crate::restart::{ProcessExit, RestartHandoff, schedule_restart};

/// Shared application state accessible by all Axum handlers and the setup gate.
pub struct AppState {
    pub layout: StateLayout,
    /// Last snapshot read from disk or published by a commit.
    config: RwLock<ConfigSnapshot>,
    pub gate: SetupGate,
    pub committer: SetupCommitter,
    pub authorizer: Arc<dyn ConnectionAuthorizer>,
    pub restart: Arc<dyn RestartHandoff>,
    pub restart_delay: Duration,
    pending_restart: Mutex<Option<JoinHandle<()>>>,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// State with the default gateway authorizer and a process-exit restart.
    pub fn new(layout: StateLayout, config: ConfigSnapshot, gate: SetupGate) -> Self {
        let committer = SetupCommitter::new(&layout);
        Self {
            layout,
            config: RwLock::new(config),
            gate,
            committer,
            authorizer: Arc::new(GatewayAuthorizer),
            restart: Arc::new(ProcessExit),
            restart_delay: Duration::from_millis(DEFAULT_RESTART_DELAY_MS),
            pending_restart: Mutex::new(None),
        }
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn ConnectionAuthorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    pub fn with_restart(mut self, restart: Arc<dyn RestartHandoff>) -> Self {
        self.restart = restart;
        self
    }

    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    /// The configuration as it is on disk right now.
    ///
    /// Falls back to the last good snapshot when the file cannot be read, so a
    /// half-edited config never flips the gate back to unconfigured.
    pub async fn current_config(&self) -> ConfigSnapshot {
        match self.layout.config_file().load() {
            Ok(config) => {
                *self.config.write().await = config.clone();
                config
            }
            Err(e) => {
                tracing::warn!("using cached config, reload failed: {}", e);
                self.config.read().await.clone()
            }
        }
    }

    /// Replace the live snapshot after a successful commit.
    pub async fn publish_config(&self, config: ConfigSnapshot) {
        *self.config.write().await = config;
    }

    /// Arm the restart handoff. A restart that is already pending is replaced.
    pub async fn schedule_restart(&self) {
        let handle = schedule_restart(self.restart.clone(), self.restart_delay);
        if let Some(previous) = self.pending_restart.lock().await.replace(handle) {
            previous.abort();
        }
    }

    /// Abort a pending restart. Returns whether one was pending.
    pub async fn cancel_pending_restart(&self) -> bool {
        match self.pending_restart.lock().await.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}
