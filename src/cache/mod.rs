//! Local blob-cache storage for offline serving.
//!
//! This module provides `CacheStorage`, the registry of named stores,
//! and `Store`, a single key-value mapping from request identity to a
//! stored response snapshot. Entries are cached in JSON format and are
//! never expired; removal happens only via whole-store deletion on
//! version rollover.

pub mod storage;

pub use storage::{CacheStorage, Store};
