//! shellcache - an offline caching proxy.
//!
//! A transparent request interceptor sitting between a page and the
//! network. Every intercepted request is classified once into one of
//! three handling paths:
//!
//! - application-shell resources are served cache-only from a store
//!   pre-populated at install time
//! - dynamic/third-party resources are served cache-first with a
//!   network fallback
//! - everything else passes through to the network unmediated
//!
//! Stores are versioned per deployed generation; bumping the generation
//! number and re-running install/activate is the only upgrade and
//! invalidation mechanism.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod lifecycle;
pub mod models;
pub mod proxy;
pub mod worker;

pub use cache::{CacheStorage, Store};
pub use config::{DeploymentConfig, DynamicRecognizer, ShellMatch, ShellMissPolicy};
pub use error::{ProxyError, Result};
pub use fetch::{Fetcher, HttpFetcher};
pub use lifecycle::{ClientRegistry, LifecycleManager, WorkerState};
pub use models::{Request, Response};
pub use proxy::{PolicyRouter, RouteDecision};
pub use worker::{FetchOutcome, LifecycleEvent, OfflineWorker};
