//! Producer trait definition

use std::future::Future;

use async_trait::async_trait;
use tracing::debug;

/// An async source that yields exactly one result per invocation
#[async_trait]
pub trait Producer: Send + Sync {
    /// Value yielded on success
    type Output: Send;

    /// Error yielded on failure
    type Error: Send;

    /// Produce one result
    async fn produce(&self) -> Result<Self::Output, Self::Error>;
}

/// Producer backed by a closure returning a future
///
/// The closure is called once per [`Producer::produce`].
pub struct FnProducer<F> {
    f: F,
}

/// Wrap a closure as a [`Producer`]
pub fn from_fn<F>(f: F) -> FnProducer<F> {
    FnProducer { f }
}

#[async_trait]
impl<F, Fut, T, E> Producer for FnProducer<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    async fn produce(&self) -> Result<T, E> {
        debug!("FnProducer::produce: called");
        (self.f)().await
    }
}
