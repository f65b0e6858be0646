//! List fetchers exposed as producers

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::client::ApiClient;
use super::error::FetchError;
use super::types::{Post, User};
use crate::join::Producer;

/// Fetches one JSON list endpoint per [`Producer::produce`] call
pub struct ListFetcher<T> {
    client: ApiClient,
    path: String,
    _record: PhantomData<fn() -> T>,
}

/// Fetcher for the users endpoint
pub type UsersFetcher = ListFetcher<User>;

/// Fetcher for the posts endpoint
pub type PostsFetcher = ListFetcher<Post>;

impl<T> ListFetcher<T> {
    pub fn new(client: ApiClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            _record: PhantomData,
        }
    }

    /// Full URL this fetcher requests
    pub fn url(&self) -> String {
        self.client.url(&self.path)
    }
}

impl<T> Clone for ListFetcher<T> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone(), self.path.clone())
    }
}

impl<T> fmt::Debug for ListFetcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListFetcher").field("url", &self.url()).finish()
    }
}

#[async_trait]
impl<T> Producer for ListFetcher<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = Vec<T>;
    type Error = FetchError;

    async fn produce(&self) -> Result<Vec<T>, FetchError> {
        debug!(path = %self.path, "ListFetcher::produce: called");
        self.client.get_list(&self.path).await
    }
}
