//! Worker wiring and event dispatch.
//!
//! `OfflineWorker` owns the deployment configuration, the storage root,
//! and the network fetcher, and exposes one handler per platform event
//! (`install`, `activate`, `fetch`). The dispatcher awaits each handler
//! to completion, which stands in for the platform's extend-lifetime
//! primitive: an event is not considered handled until its async work
//! is done.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::cache::CacheStorage;
use crate::config::DeploymentConfig;
use crate::error::Result;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::lifecycle::{ClientRegistry, LifecycleManager, WorkerState};
use crate::models::{Request, Response};
use crate::proxy::{cache_first_network_fallback, cache_only, PolicyRouter, RouteDecision};

/// Lifecycle events dispatched by the hosting platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Install,
    Activate,
}

/// Result of intercepting one request: either a response to serve, or an
/// explicit decline that lets the platform handle the request natively.
#[derive(Debug)]
pub enum FetchOutcome {
    Respond(Response),
    Passthrough,
}

/// The offline caching proxy, assembled for one deployed generation.
pub struct OfflineWorker {
    config: DeploymentConfig,
    storage: CacheStorage,
    fetcher: Arc<dyn Fetcher>,
    router: PolicyRouter,
    lifecycle: LifecycleManager,
    clients: ClientRegistry,
}

impl OfflineWorker {
    /// Build a worker with the production HTTP fetcher. The storage root
    /// defaults to the platform cache directory when not supplied.
    pub fn new(config: DeploymentConfig, storage_root: Option<PathBuf>) -> anyhow::Result<Self> {
        let root = match storage_root {
            Some(root) => root,
            None => config.default_storage_root()?,
        };
        let fetcher = Arc::new(HttpFetcher::new()?);
        Ok(Self::with_fetcher(config, CacheStorage::new(root)?, fetcher))
    }

    /// Build a worker around an explicit fetcher and storage. This is the
    /// seam embedders (and tests) use to control the network.
    pub fn with_fetcher(
        config: DeploymentConfig,
        storage: CacheStorage,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let router = PolicyRouter::new(config.clone());
        Self {
            config,
            storage,
            fetcher,
            router,
            lifecycle: LifecycleManager::new(),
            clients: ClientRegistry::new(),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.lifecycle.state()
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Dispatch a lifecycle event, holding the worker in the event until
    /// all of the handler's async work has completed.
    pub async fn dispatch(&mut self, event: LifecycleEvent) -> Result<()> {
        match event {
            LifecycleEvent::Install => self.handle_install().await,
            LifecycleEvent::Activate => self.handle_activate().await,
        }
    }

    /// Install handler: pre-populate the shell store. Failure leaves the
    /// previous generation in control.
    pub async fn handle_install(&mut self) -> Result<()> {
        self.lifecycle
            .install(&self.config, &self.storage, self.fetcher.as_ref())
            .await
    }

    /// Activate handler: purge stale stores and claim open pages.
    pub async fn handle_activate(&mut self) -> Result<()> {
        self.lifecycle
            .activate(&self.config, &self.storage, &self.clients)
            .await
    }

    /// Fetch handler: classify the request once and serve it per policy.
    /// Until the worker is activated, and for anything the router does
    /// not claim, the request passes through to the platform untouched.
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        if !self.lifecycle.is_activated() {
            return FetchOutcome::Passthrough;
        }

        match self.router.classify(request) {
            RouteDecision::Ignore | RouteDecision::Passthrough => {
                debug!(url = %request.url(), "passing request through");
                FetchOutcome::Passthrough
            }
            RouteDecision::CacheOnly => FetchOutcome::Respond(
                cache_only(&self.storage, self.fetcher.as_ref(), &self.config, request).await,
            ),
            RouteDecision::CacheFirst => FetchOutcome::Respond(
                cache_first_network_fallback(
                    &self.storage,
                    self.fetcher.as_ref(),
                    &self.config,
                    request,
                )
                .await,
            ),
        }
    }
}
