//! Errors from backend calls made by the tracker.

use std::future::Future;
use std::time::Duration;

use att_api::ApiError;
use thiserror::Error;

/// A backend call that did not succeed.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("no response within {0:?}")]
    TimedOut(Duration),
}

/// The automatic punch-out call failed.
#[derive(Debug, Error)]
#[error("auto punch-out failed: {0}")]
pub struct PunchOutFailure(#[from] pub CallError);

/// Runs a backend call with an upper bound on its duration.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, CallError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| CallError::TimedOut(limit))?
        .map_err(CallError::from)
}
