//! Strategy selection and timed runs
//!
//! Runs a pair of producers through one of the three combination strategies
//! and reports how long the combined outcome took.

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::join::{JoinOutcome, Producer, chain_two, join_two, zip};

/// How two producers are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One after the other
    Sequential,

    /// Spawned join coordinator
    #[default]
    Concurrent,

    /// In-task zip combinator
    Zip,
}

impl Strategy {
    /// Every strategy, in comparison order
    pub const ALL: [Strategy; 3] = [Strategy::Sequential, Strategy::Concurrent, Strategy::Zip];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Concurrent => write!(f, "concurrent"),
            Self::Zip => write!(f, "zip"),
        }
    }
}

/// Outcome of one strategy run
#[derive(Debug)]
pub struct RunReport<A, B, E> {
    pub strategy: Strategy,
    pub outcome: JoinOutcome<A, B, E>,
    pub elapsed: Duration,
}

/// Combine two producers with `strategy` and time the result
pub async fn run<PA, PB, E>(strategy: Strategy, producer_a: PA, producer_b: PB) -> RunReport<PA::Output, PB::Output, E>
where
    PA: Producer<Error = E> + 'static,
    PB: Producer<Error = E> + 'static,
    PA::Output: 'static,
    PB::Output: 'static,
    E: Send + 'static,
{
    debug!(%strategy, "run: called");
    let start = Instant::now();

    let outcome = match strategy {
        Strategy::Sequential => chain_two(&producer_a, &producer_b).await,
        Strategy::Concurrent => join_two(producer_a, producer_b).await,
        Strategy::Zip => zip(&producer_a, &producer_b).await,
    };

    let elapsed = start.elapsed();
    info!(
        %strategy,
        success = outcome.is_success(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Strategy run settled"
    );

    RunReport {
        strategy,
        outcome,
        elapsed,
    }
}
