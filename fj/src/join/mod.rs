//! Fan-out/fan-in over two independent producers
//!
//! Three ways to combine a pair of producers into a single [`JoinOutcome`]:
//! - **join_two:** spawn both as tasks, settle on the first failure or on both successes
//! - **zip:** poll both inside the caller's task, dropping the other branch on failure
//! - **chain_two:** run the second only after the first succeeds

mod coordinator;
mod outcome;
mod producer;
mod sequential;
mod zip;

pub use coordinator::join_two;
pub use outcome::JoinOutcome;
pub use producer::{FnProducer, Producer, from_fn};
pub use sequential::chain_two;
pub use zip::zip;
