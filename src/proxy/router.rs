//! Cache-policy router.

use crate::config::{DeploymentConfig, DynamicRecognizer, ShellMatch};
use crate::models::Request;

/// The handling path chosen for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Not network-addressable; decline interception entirely and let the
    /// platform handle it natively.
    Ignore,
    /// Application-shell resource: serve from the shell store only.
    CacheOnly,
    /// Dynamic/third-party resource: cache first, network fallback.
    CacheFirst,
    /// Everything else goes straight to the network, unmediated.
    Passthrough,
}

/// Classifies requests in fixed priority order. Pure: reads the request
/// and the deployment configuration, touches no store, delegates nothing.
pub struct PolicyRouter {
    config: DeploymentConfig,
}

impl PolicyRouter {
    pub fn new(config: DeploymentConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, request: &Request) -> RouteDecision {
        if !request.is_network_addressable() {
            return RouteDecision::Ignore;
        }
        if self.is_shell(request.path()) {
            return RouteDecision::CacheOnly;
        }
        if self.is_dynamic(request) {
            return RouteDecision::CacheFirst;
        }
        RouteDecision::Passthrough
    }

    fn is_shell(&self, path: &str) -> bool {
        match self.config.shell_match {
            ShellMatch::Exact => self.config.manifest.iter().any(|entry| entry == path),
            ShellMatch::Suffix => {
                let path = normalize_index(path);
                self.config
                    .manifest
                    .iter()
                    .any(|entry| path.ends_with(&normalize_index(entry)))
            }
        }
    }

    fn is_dynamic(&self, request: &Request) -> bool {
        match &self.config.dynamic {
            DynamicRecognizer::Paths(paths) => {
                paths.iter().any(|path| path == request.path())
            }
            DynamicRecognizer::Origins(hosts) => {
                let url = request.url().as_str();
                hosts.iter().any(|host| url.contains(host.as_str()))
            }
        }
    }
}

/// A path ending in `/` addresses the directory index.
fn normalize_index(path: &str) -> String {
    if path.ends_with('/') {
        format!("{path}index.html")
    } else {
        path.to_string()
    }
}
