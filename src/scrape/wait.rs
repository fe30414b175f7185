use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::{
    cancel::pause,
    dom::{Dom, Target},
};
use crate::{Error, Result, config::Timing};

/// Waits for `target` to render, polling every `poll_period` for up to `load_timeout`.
///
/// The first timeout only logs a warning and starts over once;
/// the second one is a [`Error::LoadTimeout`].
pub async fn wait_for<D: Dom>(
    dom: &D,
    target: Target,
    timing: &Timing,
    cancel: &CancellationToken,
) -> Result<()> {
    if poll(dom, target, timing, cancel).await? {
        return Ok(());
    }

    tracing::warn!(target: "wait", "There wasn't enough time to load the {target}, trying again.");

    if poll(dom, target, timing, cancel).await? {
        return Ok(());
    }

    Err(Error::LoadTimeout {
        target,
        timeout: timing.load_timeout,
    })
}

async fn poll<D: Dom>(
    dom: &D,
    target: Target,
    timing: &Timing,
    cancel: &CancellationToken,
) -> Result<bool> {
    let deadline = Instant::now() + timing.load_timeout;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if dom.present(target).await? {
            return Ok(true);
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        pause(timing.poll_period.min(deadline - now), cancel).await?;
    }
}
