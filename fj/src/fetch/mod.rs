//! Data fetchers for the demo endpoints
//!
//! Each fetcher is an HTTP GET against a JSON list endpoint, decoded into a
//! typed `Vec`. The join layer only sees them as [`Producer`](crate::join::Producer)s.

mod client;
mod error;
mod producer;
mod types;

pub use client::ApiClient;
pub use error::FetchError;
pub use producer::{ListFetcher, PostsFetcher, UsersFetcher};
pub use types::{Post, User};
