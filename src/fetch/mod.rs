//! Network boundary.
//!
//! The strategies and the lifecycle manager reach the network only
//! through the [`Fetcher`] trait; [`HttpFetcher`] is the production
//! implementation over reqwest.

pub mod client;

pub use client::{Fetcher, HttpFetcher};
