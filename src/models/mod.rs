//! Data models for intercepted traffic.
//!
//! This module contains the types flowing through the proxy:
//!
//! - `Request`: read-only view of an intercepted page request
//! - `Response`: a servable response snapshot, whether it came from a
//!   store, the network, or was synthesized locally

pub mod request;
pub mod response;

pub use request::Request;
pub use response::Response;
