//! Named response stores on disk.
//!
//! Each store is a directory under the storage root; each entry is a
//! JSON file named by the SHA-256 of the request identity, holding the
//! response status, headers, body, and a `cached_at` timestamp. The
//! timestamp is informational only - entries never expire.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{ProxyError, Result};
use crate::models::{Request, Response};

/// One persisted response snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    identity: String,
    status: u16,
    headers: Vec<(String, String)>,
    #[serde(with = "body_encoding")]
    body: Vec<u8>,
    cached_at: DateTime<Utc>,
}

impl StoredEntry {
    fn capture(request: &Request, response: &Response) -> Self {
        Self {
            identity: request.identity(),
            status: response.status(),
            headers: response.headers().to_vec(),
            body: response.body().to_vec(),
            cached_at: Utc::now(),
        }
    }

    fn into_response(self) -> Response {
        Response::new(self.status, self.headers, self.body.into())
    }
}

/// Body bytes are base64 inside the JSON entry file.
mod body_encoding {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Registry of named stores. Stores are created lazily on first open and
/// deleted explicitly during activation cleanup.
#[derive(Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    pub fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn store_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Open a store by name, creating it if absent.
    pub fn open(&self, name: &str) -> Result<Store> {
        let dir = self.store_dir(name);
        fs::create_dir_all(&dir).map_err(|source| ProxyError::StoreOpen {
            name: name.to_string(),
            source,
        })?;
        Ok(Store {
            name: name.to_string(),
            dir,
        })
    }

    /// Names of all stores currently on disk.
    pub fn store_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.store_dir(name).is_dir()
    }

    /// Delete a store and all of its entries.
    pub fn delete(&self, name: &str) -> Result<()> {
        let dir = self.store_dir(name);
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|source| ProxyError::StaleStoreDeletion {
                name: name.to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

/// A single named store: request identity -> stored response.
pub struct Store {
    name: String,
    dir: PathBuf,
}

impl Store {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn entry_path(&self, identity: &str) -> PathBuf {
        let digest = Sha256::digest(identity.as_bytes());
        self.dir.join(format!("{:x}.json", digest))
    }

    /// Look up a stored response by request identity.
    pub fn lookup(&self, request: &Request) -> Result<Option<Response>> {
        let path = self.entry_path(&request.identity());
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        let entry: StoredEntry = serde_json::from_str(&contents)?;
        debug!(store = %self.name, url = %request.url(), age = %Utc::now().signed_duration_since(entry.cached_at).num_minutes(), "cache hit");
        Ok(Some(entry.into_response()))
    }

    /// Persist a response under the request's identity. Writes go through
    /// a temp file and rename so a cancelled task never leaves a
    /// half-written entry behind.
    pub fn put(&self, request: &Request, response: &Response) -> Result<()> {
        let entry = StoredEntry::capture(request, response);
        let json = serde_json::to_string(&entry).map_err(|e| ProxyError::StoreWrite {
            name: self.name.clone(),
            reason: e.to_string(),
        })?;

        let path = self.entry_path(&entry.identity);
        let temp_path = path.with_extension("tmp");
        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp_path, &path)
        };
        write().map_err(|e| ProxyError::StoreWrite {
            name: self.name.clone(),
            reason: e.to_string(),
        })
    }

    /// Number of entries in the store.
    pub fn len(&self) -> Result<usize> {
        let mut count = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
