//! Deployment configuration management.
//!
//! This module defines the immutable configuration handed to the worker at
//! construction: the app-shell manifest, the dynamic-resource recognizer,
//! the per-request policies, and the store naming for the current
//! generation.
//!
//! Configuration can be loaded from a JSON file at deployment time; the
//! defaults mirror the callselect deployment.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for the default storage root path
const APP_NAME: &str = "shellcache";

/// How a request path is matched against the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShellMatch {
    /// Pathname must exactly equal a manifest entry.
    #[default]
    Exact,
    /// Pathname matches by suffix, with `/` equivalent to `/index.html`.
    Suffix,
}

/// How requests are recognized as dynamic (second policy tier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicRecognizer {
    /// Exact local pathname list.
    Paths(Vec<String>),
    /// Trusted external host substrings (content-delivery domains),
    /// matched against the full request URL.
    Origins(Vec<String>),
}

/// What the cache-only strategy does when a shell resource is missing
/// from the pre-populated store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShellMissPolicy {
    /// Fall through to a live network fetch, never written back.
    #[default]
    NetworkFetch,
    /// Return a synthetic 404.
    NotFound,
}

/// Immutable deployment configuration for one worker generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Short application name, used as the store-name prefix.
    pub app_name: String,
    /// Generation number; bumping it is the only upgrade mechanism.
    pub generation: u32,
    /// Origin the manifest paths are resolved against at install time.
    pub origin: String,
    /// Ordered application-shell path list, fixed at deployment time.
    pub manifest: Vec<String>,
    pub dynamic: DynamicRecognizer,
    #[serde(default)]
    pub shell_match: ShellMatch,
    #[serde(default)]
    pub shell_miss: ShellMissPolicy,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            app_name: "callselect".to_string(),
            generation: 1,
            origin: "https://example.com".to_string(),
            manifest: vec![
                "/callselect/".to_string(),
                "/callselect/index.html".to_string(),
                "/callselect/calendar.html".to_string(),
                "/callselect/form.html".to_string(),
                "/callselect/main.js".to_string(),
                "/callselect/styles.css".to_string(),
                "/callselect/manifest.json".to_string(),
            ],
            dynamic: DynamicRecognizer::Paths(vec![
                "/callselect/calendar.js".to_string(),
                "/callselect/form.js".to_string(),
            ]),
            shell_match: ShellMatch::default(),
            shell_miss: ShellMissPolicy::default(),
        }
    }
}

impl DeploymentConfig {
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Name of the shell store for the current generation.
    pub fn shell_store_name(&self) -> String {
        format!("{}-shell-v{}", self.app_name, self.generation)
    }

    /// Name of the dynamic store for the current generation.
    pub fn dynamic_store_name(&self) -> String {
        format!("{}-dynamic-v{}", self.app_name, self.generation)
    }

    /// Whether a store name belongs to the current generation. Anything
    /// else found at activation is stale and gets purged.
    pub fn is_current_store(&self, name: &str) -> bool {
        name == self.shell_store_name() || name == self.dynamic_store_name()
    }

    /// Resolve a manifest path against the deployment origin.
    pub fn resolve(&self, path: &str) -> String {
        format!("{}{}", self.origin.trim_end_matches('/'), path)
    }

    /// Default storage root when the embedder does not supply one.
    pub fn default_storage_root(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join(&self.app_name))
    }
}
