//! Sequential chain - the latency baseline for the join strategies

use tracing::debug;

use super::outcome::JoinOutcome;
use super::producer::Producer;

/// Run the first producer to completion, then the second
///
/// The second producer is only invoked after the first one succeeded, so the
/// total latency is the sum of both.
pub async fn chain_two<PA, PB, E>(producer_a: &PA, producer_b: &PB) -> JoinOutcome<PA::Output, PB::Output, E>
where
    PA: Producer<Error = E>,
    PB: Producer<Error = E>,
{
    debug!("chain_two: called");
    let a = match producer_a.produce().await {
        Ok(a) => a,
        Err(e) => {
            debug!("chain_two: first producer failed, skipping second");
            return JoinOutcome::Failure(e);
        }
    };

    match producer_b.produce().await {
        Ok(b) => JoinOutcome::Success(a, b),
        Err(e) => {
            debug!("chain_two: second producer failed");
            JoinOutcome::Failure(e)
        }
    }
}
