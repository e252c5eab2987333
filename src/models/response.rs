//! Response snapshot model.

use bytes::Bytes;

/// A fully captured response: status, headers, and body bytes.
///
/// Unlike a live network response, whose body is a single-read stream,
/// a `Response` is only constructed after the body has been captured in
/// full. That makes [`Response::split`] cheap and lets the fallback
/// strategy hand one copy to the store and one to the caller.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Response {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Duplicate this response into two independently consumable handles.
    /// The body bytes are shared, not copied.
    pub fn split(self) -> (Response, Response) {
        let copy = Response {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        };
        (copy, self)
    }

    /// Synthetic 503 served when the network is unreachable and no cached
    /// copy exists.
    pub fn offline_placeholder() -> Self {
        Self::synthetic(503, "offline: resource unavailable and not cached")
    }

    /// Synthetic 404 for a shell resource missing from the pre-populated
    /// store, under the strict miss policy.
    pub fn shell_not_found() -> Self {
        Self::synthetic(404, "not found in application shell")
    }

    /// Synthetic 500 for a request whose store could not be opened.
    pub fn store_unavailable() -> Self {
        Self::synthetic(500, "local cache storage unavailable")
    }

    fn synthetic(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }
}
