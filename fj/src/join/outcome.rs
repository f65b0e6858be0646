//! Combined outcome of two producers

use tracing::debug;

/// Result of coordinating two producers
///
/// Either both values, paired by call position, or the single error that
/// settled the join. There is no partial pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome<A, B, E> {
    /// Both producers succeeded
    Success(A, B),

    /// A producer failed first
    Failure(E),
}

impl<A, B, E> JoinOutcome<A, B, E> {
    /// Check if both producers succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, JoinOutcome::Success(..))
    }

    /// Check if the join settled with an error
    pub fn is_failure(&self) -> bool {
        matches!(self, JoinOutcome::Failure(_))
    }

    /// Convert into a standard `Result` of the pair
    pub fn into_result(self) -> Result<(A, B), E> {
        debug!(success = self.is_success(), "JoinOutcome::into_result: called");
        match self {
            JoinOutcome::Success(a, b) => Ok((a, b)),
            JoinOutcome::Failure(e) => Err(e),
        }
    }
}

impl<A, B, E> From<Result<(A, B), E>> for JoinOutcome<A, B, E> {
    fn from(result: Result<(A, B), E>) -> Self {
        match result {
            Ok((a, b)) => JoinOutcome::Success(a, b),
            Err(e) => JoinOutcome::Failure(e),
        }
    }
}
