//! Request interception: policy routing and the two caching strategies.
//!
//! The router classifies each intercepted request exactly once; the
//! strategies are the only code that touches the stores on the serving
//! path. Strategy errors always surface as a response, never as an
//! error past the router.

pub mod router;
pub mod strategy;

pub use router::{PolicyRouter, RouteDecision};
pub use strategy::{cache_first_network_fallback, cache_only};
