//! Timeout enforcement.
//!
//! # Responsibilities
//! - Put a deadline on every call that may wait on an external collaborator
//! - Cancel the wrapped future when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; dropping the future is the cancellation
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {after:?} elapsed")]
pub struct DeadlineElapsed {
    pub after: Duration,
}

/// Run `future` to completion or give up after `deadline`.
pub async fn with_deadline<F>(deadline: Duration, future: F) -> Result<F::Output, DeadlineElapsed>
where
    F: Future,
{
    tokio::time::timeout(deadline, future)
        .await
        .map_err(|_| DeadlineElapsed { after: deadline })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fast_future_completes() {
        let out = with_deadline(Duration::from_secs(1), async { 7 }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_future_is_cut_off() {
        let out = with_deadline(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
        })
        .await;
        assert_eq!(
            out,
            Err(DeadlineElapsed {
                after: Duration::from_millis(50)
            })
        );
    }
}
