use core::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Sleeps for `duration` unless `cancel` fires first.
pub async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        () = cancel.cancelled() => Err(Error::Cancelled),
        () = sleep(duration) => Ok(()),
    }
}

/// A child of `parent` that also cancels itself once `limit` has elapsed.
pub fn with_deadline(parent: &CancellationToken, limit: Option<Duration>) -> CancellationToken {
    let child = parent.child_token();
    if let Some(limit) = limit {
        let token = child.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = sleep(limit) => {
                    tracing::warn!(target: "cancel", "deadline of {limit:?} reached, giving up");
                    token.cancel();
                }
            }
        });
    }
    child
}

/// Cancels `token` on the first Ctrl-C.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(target: "cancel", "interrupted, stopping after the current step");
            token.cancel();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deadline_cancels_child_only() {
        let parent = CancellationToken::new();
        let child = with_deadline(&parent, Some(Duration::from_millis(10)));
        assert!(matches!(
            pause(Duration::from_secs(5), &child).await,
            Err(Error::Cancelled)
        ));
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn parent_cancellation_reaches_child() {
        let parent = CancellationToken::new();
        let child = with_deadline(&parent, None);
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn pause_elapses() {
        let token = CancellationToken::new();
        assert!(pause(Duration::from_millis(1), &token).await.is_ok());
    }
}
