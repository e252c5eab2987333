//! Caching strategies.
//!
//! Both strategies uphold the same guarantee: every call resolves to a
//! [`Response`] the page can render, even if only an error placeholder.
//! Raw store or network errors never escape to the caller.

use tracing::{debug, error, warn};

use crate::cache::{CacheStorage, Store};
use crate::config::{DeploymentConfig, ShellMissPolicy};
use crate::fetch::Fetcher;
use crate::models::{Request, Response};

/// Serve an application-shell resource from the pre-populated shell
/// store. When present, the response has no network dependency at all.
/// The shell store is never written here.
pub async fn cache_only(
    storage: &CacheStorage,
    fetcher: &dyn Fetcher,
    config: &DeploymentConfig,
    request: &Request,
) -> Response {
    let store = match storage.open(&config.shell_store_name()) {
        Ok(store) => store,
        Err(e) => {
            error!(url = %request.url(), error = %e, "shell store unavailable");
            return Response::store_unavailable();
        }
    };

    if let Some(response) = lookup_logged(&store, request) {
        return response;
    }

    // Pre-population gap. Policy is a deployment choice: a silent live
    // fetch (never written back) or a strict 404.
    match config.shell_miss {
        ShellMissPolicy::NetworkFetch => {
            warn!(url = %request.url(), "shell resource missing from store, fetching live");
            match fetcher.fetch(request).await {
                Ok(response) => response,
                Err(e) => {
                    error!(url = %request.url(), error = %e, "shell fallback fetch failed");
                    Response::offline_placeholder()
                }
            }
        }
        ShellMissPolicy::NotFound => {
            warn!(url = %request.url(), "shell resource missing from store, answering 404");
            Response::shell_not_found()
        }
    }
}

/// Serve a dynamic/third-party resource: cache hit wins, otherwise fetch,
/// store a copy on verified success, and tolerate network failure by
/// retrying the cache.
pub async fn cache_first_network_fallback(
    storage: &CacheStorage,
    fetcher: &dyn Fetcher,
    config: &DeploymentConfig,
    request: &Request,
) -> Response {
    let store = match storage.open(&config.dynamic_store_name()) {
        Ok(store) => store,
        Err(e) => {
            error!(url = %request.url(), error = %e, "dynamic store unavailable");
            return Response::store_unavailable();
        }
    };

    if let Some(response) = lookup_logged(&store, request) {
        return response;
    }

    match fetcher.fetch(request).await {
        Ok(response) => {
            if response.is_ok() {
                // The body stream is split so the store gets its own copy
                // and the caller's remains fully readable.
                let (stored, returned) = response.split();
                if let Err(e) = store.put(request, &stored) {
                    // Quota or I/O trouble must not fail the request.
                    warn!(url = %request.url(), error = %e, "dynamic store write failed, serving uncached");
                }
                returned
            } else {
                debug!(url = %request.url(), status = response.status(), "not caching non-200 response");
                response
            }
        }
        Err(e) => {
            // A concurrent request may have populated the store between
            // our lookup and the fetch. Check once more before giving up.
            if let Some(response) = lookup_logged(&store, request) {
                return response;
            }
            error!(url = %request.url(), error = %e, "network fallback failed");
            Response::offline_placeholder()
        }
    }
}

/// Store lookup that downgrades read errors to a miss. A corrupt entry
/// should cost a refetch, not the request.
fn lookup_logged(store: &Store, request: &Request) -> Option<Response> {
    match store.lookup(request) {
        Ok(hit) => hit,
        Err(e) => {
            warn!(store = store.name(), url = %request.url(), error = %e, "store lookup failed, treating as miss");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;
    use tempfile::TempDir;

    use crate::error::{ProxyError, Result};

    enum FakeOutcome {
        Respond(u16, &'static str),
        NetworkDown,
        /// Simulates a concurrent request winning the race: populates the
        /// dynamic store during the fetch, then fails.
        PopulateStoreThenFail(CacheStorage, String),
    }

    struct FakeFetcher {
        outcome: FakeOutcome,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn new(outcome: FakeOutcome) -> Self {
            Self {
                outcome,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for FakeFetcher {
        async fn fetch(&self, request: &Request) -> Result<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                FakeOutcome::Respond(status, body) => Ok(Response::new(
                    *status,
                    vec![("content-type".to_string(), "text/plain".to_string())],
                    Bytes::from_static(body.as_bytes()),
                )),
                FakeOutcome::NetworkDown => Err(ProxyError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ))),
                FakeOutcome::PopulateStoreThenFail(storage, store_name) => {
                    let store = storage.open(store_name).unwrap();
                    store
                        .put(
                            request,
                            &Response::new(200, vec![], Bytes::from_static(b"raced")),
                        )
                        .unwrap();
                    Err(ProxyError::Io(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "connection reset",
                    )))
                }
            }
        }
    }

    fn setup() -> (TempDir, CacheStorage, DeploymentConfig) {
        let dir = TempDir::new().unwrap();
        let storage = CacheStorage::new(dir.path().to_path_buf()).unwrap();
        (dir, storage, DeploymentConfig::default())
    }

    fn shell_request() -> Request {
        Request::get("https://example.com/callselect/index.html").unwrap()
    }

    fn dynamic_request() -> Request {
        Request::get("https://example.com/callselect/form.js").unwrap()
    }

    #[tokio::test]
    async fn test_shell_hit_never_touches_network() {
        let (_dir, storage, config) = setup();
        let request = shell_request();
        let store = storage.open(&config.shell_store_name()).unwrap();
        store
            .put(&request, &Response::new(200, vec![], Bytes::from_static(b"<html>")))
            .unwrap();

        let fetcher = FakeFetcher::new(FakeOutcome::Respond(200, "network copy"));
        let response = cache_only(&storage, &fetcher, &config, &request).await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body().as_ref(), b"<html>");
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_shell_miss_network_fetch_policy_never_writes_store() {
        let (_dir, storage, config) = setup();
        let request = shell_request();

        let fetcher = FakeFetcher::new(FakeOutcome::Respond(200, "live"));
        let response = cache_only(&storage, &fetcher, &config, &request).await;

        assert_eq!(response.body().as_ref(), b"live");
        assert_eq!(fetcher.calls(), 1);
        let store = storage.open(&config.shell_store_name()).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_shell_miss_strict_policy_answers_404_without_fetching() {
        let (_dir, storage, mut config) = setup();
        config.shell_miss = ShellMissPolicy::NotFound;

        let fetcher = FakeFetcher::new(FakeOutcome::Respond(200, "live"));
        let response = cache_only(&storage, &fetcher, &config, &shell_request()).await;

        assert_eq!(response.status(), 404);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_shell_miss_offline_yields_placeholder() {
        let (_dir, storage, config) = setup();
        let fetcher = FakeFetcher::new(FakeOutcome::NetworkDown);
        let response = cache_only(&storage, &fetcher, &config, &shell_request()).await;
        assert_eq!(response.status(), 503);
    }

    #[tokio::test]
    async fn test_dynamic_fetch_populates_exactly_one_entry() {
        let (_dir, storage, config) = setup();
        let request = dynamic_request();

        let fetcher = FakeFetcher::new(FakeOutcome::Respond(200, "select2 code"));
        let response = cache_first_network_fallback(&storage, &fetcher, &config, &request).await;

        // Caller-visible body is still fully readable after the store copy
        assert_eq!(response.into_body().as_ref(), b"select2 code");
        let store = storage.open(&config.dynamic_store_name()).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(
            store.lookup(&request).unwrap().unwrap().body().as_ref(),
            b"select2 code"
        );
    }

    #[tokio::test]
    async fn test_dynamic_second_request_is_a_cache_hit() {
        let (_dir, storage, config) = setup();
        let request = dynamic_request();
        let fetcher = FakeFetcher::new(FakeOutcome::Respond(200, "form code"));

        let first = cache_first_network_fallback(&storage, &fetcher, &config, &request).await;
        let second = cache_first_network_fallback(&storage, &fetcher, &config, &request).await;

        assert_eq!(first.body(), second.body());
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_dynamic_non_200_returned_but_not_cached() {
        let (_dir, storage, config) = setup();
        let request = dynamic_request();

        let fetcher = FakeFetcher::new(FakeOutcome::Respond(500, "server broke"));
        let response = cache_first_network_fallback(&storage, &fetcher, &config, &request).await;

        assert_eq!(response.status(), 500);
        let store = storage.open(&config.dynamic_store_name()).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_dynamic_offline_with_empty_cache_yields_503() {
        let (_dir, storage, config) = setup();
        let fetcher = FakeFetcher::new(FakeOutcome::NetworkDown);
        let response =
            cache_first_network_fallback(&storage, &fetcher, &config, &dynamic_request()).await;
        assert_eq!(response.status(), 503);
        assert!(!response.body().is_empty());
    }

    #[tokio::test]
    async fn test_dynamic_fetch_failure_rechecks_cache_for_raced_entry() {
        let (_dir, storage, config) = setup();
        let fetcher = FakeFetcher::new(FakeOutcome::PopulateStoreThenFail(
            storage.clone(),
            config.dynamic_store_name(),
        ));

        let response =
            cache_first_network_fallback(&storage, &fetcher, &config, &dynamic_request()).await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body().as_ref(), b"raced");
    }
}
