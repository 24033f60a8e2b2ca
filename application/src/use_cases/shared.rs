//! Shared utilities for use cases.

use crate::use_cases::run_committee::CommitteeError;
use tokio_util::sync::CancellationToken;

/// Whether cancellation has been requested.
pub(crate) fn is_cancelled(token: &Option<CancellationToken>) -> bool {
    token.as_ref().is_some_and(CancellationToken::is_cancelled)
}

/// Check if cancellation has been requested.
///
/// Returns `Err(CommitteeError::Cancelled)` if the token exists and is cancelled.
pub(crate) fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), CommitteeError> {
    if is_cancelled(token) {
        return Err(CommitteeError::Cancelled);
    }
    Ok(())
}
