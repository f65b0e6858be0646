//! fanjoin - fan-out/fan-in over pairs of async producers
//!
//! Fetching two independent resources and acting on both is a join: start
//! both, wait for both, pair the results. fanjoin packages that coordination
//! as a reusable utility and demonstrates it against two JSON list endpoints.
//!
//! # Core Concepts
//!
//! - **Producer**: anything that asynchronously yields one `Result`
//! - **Join**: both producers start at once; the outcome pairs both values or carries the first error
//! - **Fail-fast**: the first failure settles the join without waiting for the other branch
//!
//! # Modules
//!
//! - [`join`] - Producer trait, join coordinator, zip and sequential chain
//! - [`fetch`] - HTTP list fetchers for users and posts
//! - [`strategy`] - Strategy selection and timed runs
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod fetch;
pub mod join;
pub mod strategy;

// Re-export commonly used types
pub use config::{ApiConfig, Config};
pub use fetch::{ApiClient, FetchError, ListFetcher, Post, PostsFetcher, User, UsersFetcher};
pub use join::{FnProducer, JoinOutcome, Producer, chain_two, from_fn, join_two, zip};
pub use strategy::{RunReport, Strategy, run};
