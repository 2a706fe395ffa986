//! HTTP networking module
//!
//! Provides the shared HTTP client used by engine adapters and the assist model.

mod client;

pub use client::HttpClient;
