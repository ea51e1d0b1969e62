//! Client for the NOAA CO-OPS tide prediction API.
//!
//! Two layers: a retrying HTTP fetcher ([`HttpClient`]) that returns raw
//! bodies or typed upstream errors, and the typed operations ([`NoaaApi`])
//! that decode the wire format into domain records. Decoding stays out of
//! the fetcher so malformed 2xx bodies surface as decode errors,
//! distinguishable from upstream faults.

pub mod api;
pub mod client;
pub mod types;

pub use api::NoaaApi;
pub use client::{HttpClient, HttpClientOptions};
