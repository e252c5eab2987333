//! Intercepted request model.

use reqwest::Method;
use url::Url;

use crate::error::Result;

/// An intercepted page request. Immutable once constructed: the router
/// classifies it exactly once and strategies only read from it.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
        }
    }

    /// Convenience constructor for a GET request, the common case for
    /// shell and dynamic resources.
    pub fn get(url: &str) -> Result<Self> {
        Ok(Self::new(Method::GET, Url::parse(url)?))
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Pathname component of the URL, as matched against the manifest
    /// and the dynamic path list.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Whether the underlying platform can route this request over the
    /// network. Extension-internal and other exotic schemes are handled
    /// natively and never intercepted.
    pub fn is_network_addressable(&self) -> bool {
        matches!(self.url.scheme(), "http" | "https")
    }

    /// Normalized store key for this request. The fragment is a purely
    /// client-side artifact and is excluded from identity.
    pub fn identity(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        format!("{} {}", self.method, url)
    }
}
