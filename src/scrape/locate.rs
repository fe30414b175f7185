use compact_str::CompactString;
use tokio_util::sync::CancellationToken;

use super::{
    cancel::pause,
    dom::{Dom, Target},
    wait::wait_for,
};
use crate::{Error, Result, config::Timing};

/// Proof that a conversation was opened in the page; the collector reads from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    name: CompactString,
}

impl Conversation {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Searches the sidebar for `name` and opens the first result titled exactly `name`.
///
/// Attempts repeat, `poll_period` apart, until one succeeds: failures are
/// logged and retried, a missing contact keeps searching. Only `cancel` ends
/// the loop early.
pub async fn search_contact<D: Dom>(
    dom: &D,
    name: &str,
    timing: &Timing,
    cancel: &CancellationToken,
) -> Result<Conversation> {
    tracing::info!(target: "locator", "Searching in [{name}] to extract messages.");

    let mut attempt = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        attempt += 1;

        match try_open(dom, name, timing, cancel).await {
            Ok(true) => {
                return Ok(Conversation {
                    name: name.into(),
                });
            }
            Ok(false) => {
                tracing::debug!(target: "locator", "[{name}] no exact match (attempt #{attempt}), searching again");
            }
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                tracing::error!(target: "locator", "[{name}] attempt #{attempt} went wrong: {e}");
            }
        }
        pause(timing.poll_period, cancel).await?;
    }
}

async fn try_open<D: Dom>(
    dom: &D,
    name: &str,
    timing: &Timing,
    cancel: &CancellationToken,
) -> Result<bool> {
    wait_for(dom, Target::SidePanel, timing, cancel).await?;
    dom.type_search(name).await?;
    wait_for(dom, Target::SearchResults, timing, cancel).await?;

    let results = dom.search_results().await?;
    let Some(span) = results
        .iter()
        .find(|span| span.title == name && span.text == name)
    else {
        return Ok(false);
    };

    dom.open_result(span).await?;
    Ok(true)
}
