//! Zip combinator - both producers polled inside the caller's task

use futures::future::try_join;
use tracing::debug;

use super::outcome::JoinOutcome;
use super::producer::Producer;

/// Poll two producers concurrently in the current task and pair their results
///
/// Same pairing and fail-fast policy as [`join_two`](super::join_two), but
/// nothing is spawned: both futures start on the first poll and live inside
/// the returned future. When one producer fails the other is dropped, which
/// cancels it.
pub async fn zip<PA, PB, E>(producer_a: &PA, producer_b: &PB) -> JoinOutcome<PA::Output, PB::Output, E>
where
    PA: Producer<Error = E>,
    PB: Producer<Error = E>,
{
    debug!("zip: called");
    let outcome: JoinOutcome<_, _, _> = try_join(producer_a.produce(), producer_b.produce()).await.into();
    debug!(success = outcome.is_success(), "zip: settled");
    outcome
}
