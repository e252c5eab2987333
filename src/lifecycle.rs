//! Store lifecycle management.
//!
//! Runs once per deployed generation, before any requests are served:
//! install pre-populates the shell store from the manifest (all or
//! nothing), activation purges stale stores and claims open pages.

use std::collections::HashMap;
use std::sync::Mutex;

use futures::future::join_all;
use tracing::{info, warn};

use crate::cache::CacheStorage;
use crate::config::DeploymentConfig;
use crate::error::{ProxyError, Result};
use crate::fetch::Fetcher;
use crate::models::{Request, Response};

/// Worker lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, no lifecycle event handled yet.
    Parsed,
    /// Install event in progress.
    Installing,
    /// Install succeeded, waiting to activate.
    Installed,
    /// Activate event in progress.
    Activating,
    /// Active and controlling pages.
    Activated,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
        }
    }
}

/// Open pages known to the hosting platform, keyed by client id, with
/// the generation currently controlling each (None until claimed or
/// until the page next navigates).
#[derive(Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<String, Option<u32>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, client_id: &str) {
        self.clients
            .lock()
            .expect("client registry lock poisoned")
            .entry(client_id.to_string())
            .or_insert(None);
    }

    pub fn controller(&self, client_id: &str) -> Option<u32> {
        self.clients
            .lock()
            .expect("client registry lock poisoned")
            .get(client_id)
            .copied()
            .flatten()
    }

    /// Take control of every open page for the given generation.
    /// Returns the number of pages claimed.
    pub fn claim(&self, generation: u32) -> usize {
        let mut clients = self.clients.lock().expect("client registry lock poisoned");
        for controller in clients.values_mut() {
            *controller = Some(generation);
        }
        clients.len()
    }
}

/// Drives install and activation for one worker generation.
pub struct LifecycleManager {
    state: WorkerState,
    skip_waiting: bool,
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self {
            state: WorkerState::Parsed,
            skip_waiting: false,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn is_activated(&self) -> bool {
        self.state == WorkerState::Activated
    }

    /// Install: fetch every manifest entry, then commit them to the shell
    /// store in one pass. Any fetch failure aborts before anything is
    /// written, so the store never holds a partial shell. On success the
    /// worker skips the waiting hold-back.
    pub async fn install(
        &mut self,
        config: &DeploymentConfig,
        storage: &CacheStorage,
        fetcher: &dyn Fetcher,
    ) -> Result<()> {
        self.state = WorkerState::Installing;
        info!(generation = config.generation, "installing worker");

        let entries = match self.fetch_shell(config, fetcher).await {
            Ok(entries) => entries,
            Err(e) => {
                // Version not promoted; a previous generation keeps serving.
                self.state = WorkerState::Parsed;
                return Err(e);
            }
        };

        info!(count = entries.len(), "caching app shell");
        let store = storage.open(&config.shell_store_name())?;
        for (request, response) in &entries {
            if let Err(e) = store.put(request, response) {
                // Half a shell is worse than none: roll the store back.
                if let Err(rollback) = storage.delete(&config.shell_store_name()) {
                    warn!(error = %rollback, "shell store rollback failed");
                }
                self.state = WorkerState::Parsed;
                return Err(e);
            }
        }

        self.state = WorkerState::Installed;
        self.skip_waiting = true;
        info!(generation = config.generation, "install complete, skipping waiting");
        Ok(())
    }

    /// Fetch the whole manifest concurrently; fail if any entry is
    /// unreachable or answers non-200.
    async fn fetch_shell(
        &self,
        config: &DeploymentConfig,
        fetcher: &dyn Fetcher,
    ) -> Result<Vec<(Request, Response)>> {
        let requests = config
            .manifest
            .iter()
            .map(|path| Request::get(&config.resolve(path)))
            .collect::<Result<Vec<_>>>()?;

        let results = join_all(requests.iter().map(|request| fetcher.fetch(request))).await;

        let mut entries = Vec::with_capacity(requests.len());
        for (request, result) in requests.into_iter().zip(results) {
            let url = request.url().to_string();
            match result {
                Ok(response) if response.is_ok() => entries.push((request, response)),
                Ok(response) => {
                    return Err(ProxyError::ManifestFetch {
                        url,
                        reason: format!("status {}", response.status()),
                    })
                }
                Err(e) => {
                    return Err(ProxyError::ManifestFetch {
                        url,
                        reason: e.to_string(),
                    })
                }
            }
        }
        Ok(entries)
    }

    /// Activate: purge every store not belonging to the current
    /// generation, then claim open pages. Deletion failures are logged
    /// and skipped; claiming happens regardless.
    pub async fn activate(
        &mut self,
        config: &DeploymentConfig,
        storage: &CacheStorage,
        clients: &ClientRegistry,
    ) -> Result<()> {
        if self.state != WorkerState::Installed {
            return Err(ProxyError::InvalidLifecycleState {
                state: self.state.as_str(),
                expected: WorkerState::Installed.as_str(),
            });
        }
        self.state = WorkerState::Activating;
        info!(generation = config.generation, "activating worker");

        for name in storage.store_names()? {
            if !config.is_current_store(&name) {
                info!(store = %name, "deleting old cache");
                if let Err(e) = storage.delete(&name) {
                    warn!(store = %name, error = %e, "failed to delete stale store");
                }
            }
        }

        let claimed = clients.claim(config.generation);
        self.state = WorkerState::Activated;
        info!(generation = config.generation, claimed, "worker activated");
        Ok(())
    }

    pub fn skip_waiting(&self) -> bool {
        self.skip_waiting
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}
