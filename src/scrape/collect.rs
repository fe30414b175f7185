use core::num::NonZeroUsize;

use hashbrown::HashSet;
use tokio_util::sync::CancellationToken;

use super::{
    cancel::pause,
    dom::{Dom, RawMessage, RenderedNode, Target},
    locate::Conversation,
    wait::wait_for,
};
use crate::{Error, Result, config::Timing, record::MessageRecord};

#[derive(Debug, Clone, Default)]
pub struct CollectOptions {
    /// Keep only the newest `limit` records.
    pub limit: Option<NonZeroUsize>,
    /// Resume cursor: return only what came after this message.
    pub last_message: Option<String>,
    pub include_my_user: bool,
}

/// Result of a collection that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Oldest first; never empty.
    Records(Vec<MessageRecord>),
    NoNewMessages,
}

impl Outcome {
    #[must_use]
    pub fn records(&self) -> &[MessageRecord] {
        match self {
            Self::Records(records) => records,
            Self::NoNewMessages => &[],
        }
    }

    #[must_use]
    pub fn newest(&self) -> Option<&MessageRecord> {
        self.records().last()
    }
}

impl From<Vec<MessageRecord>> for Outcome {
    fn from(records: Vec<MessageRecord>) -> Self {
        if records.is_empty() { Self::NoNewMessages } else { Self::Records(records) }
    }
}

/// Scrapes the open conversation into records sorted by (date, hour).
///
/// Without a resume cursor only the bubbles rendered right now are read, the
/// pane is never scrolled. With one, the pane scrolls up a page at a time
/// until a bubble with exactly that text shows up, which may take forever
/// if it never does; `cancel` is the way out.
///
/// Message text is the deduplication key for the whole run.
pub async fn collect<D: Dom>(
    dom: &D,
    conversation: &Conversation,
    options: &CollectOptions,
    timing: &Timing,
    cancel: &CancellationToken,
) -> Result<Outcome> {
    tracing::info!(target: "collector", "Extracting messages for <{}>", conversation.name());

    let records = accumulate(dom, options, timing, cancel)
        .await
        .map_err(Error::into_extraction_failure)?;

    let outcome = partition(records, options.last_message.as_deref(), options.limit);
    match &outcome {
        Outcome::Records(records) => {
            tracing::info!(target: "collector", "<{}>: {} messages extracted.", conversation.name(), records.len());
        }
        Outcome::NoNewMessages => {
            tracing::info!(target: "collector", "<{}>: no new messages to extract were found.", conversation.name());
        }
    }
    Ok(outcome)
}

async fn accumulate<D: Dom>(
    dom: &D,
    options: &CollectOptions,
    timing: &Timing,
    cancel: &CancellationToken,
) -> Result<Vec<MessageRecord>> {
    wait_for(dom, Target::MessagePane, timing, cancel).await?;

    let cursor = options.last_message.as_deref();
    let mut seen = HashSet::<String>::new();
    let mut records = Vec::new();
    let mut found = cursor.is_none();
    let mut focused = false;
    let mut pass = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        pass += 1;

        let nodes = dom.rendered_messages(options.include_my_user).await?;
        let before = records.len();

        for node in nodes {
            let Some(message) = extract(node) else {
                continue;
            };
            if cursor == Some(message.body.as_str()) {
                found = true;
            }
            if seen.contains(&message.body) {
                continue;
            }
            records.push(MessageRecord::new(
                &message.meta,
                message.body.clone(),
                message.emojis,
                message.quoted,
            )?);
            seen.insert(message.body);
        }

        tracing::debug!(target: "collector", "pass #{pass}: {} new, {} total", records.len() - before, records.len());

        if found {
            break;
        }
        if !focused {
            dom.focus().await?;
            focused = true;
        }
        dom.scroll_up().await?;
        pause(timing.scroll_pause, cancel).await?;
    }

    records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    Ok(records)
}

struct Extracted {
    meta: String,
    body: String,
    emojis: Option<String>,
    quoted: Option<String>,
}

/// Text bubbles first, then emoji-only ones; anything else yields nothing.
fn extract(node: RenderedNode) -> Option<Extracted> {
    let RawMessage {
        meta,
        text,
        emojis,
        quoted,
    } = match node {
        RenderedNode::Message(raw) => raw,
        RenderedNode::Media { image_src } => {
            let inline = image_src
                .as_deref()
                .is_some_and(|src| src.starts_with("data:") || src.starts_with("blob:"));
            tracing::trace!(target: "collector", "skipping media bubble (inline source: {inline})");
            return None;
        }
    };

    let plain = emojis.concat();
    let body = text.unwrap_or_else(|| plain.clone());
    Some(Extracted {
        meta,
        body,
        emojis: (!plain.is_empty()).then_some(plain),
        quoted,
    })
}

/// Applies the resume cursor and the limit to records already sorted by (date, hour).
///
/// With a cursor, everything up to and including its first occurrence is
/// dropped; a cursor on the newest record means nothing is new. A cursor that
/// is not in `records` keeps them all. The limit then keeps the newest ones.
#[must_use]
pub fn partition(
    mut records: Vec<MessageRecord>,
    last_message: Option<&str>,
    limit: Option<NonZeroUsize>,
) -> Outcome {
    if let Some(cursor) = last_message {
        if records.last().is_some_and(|r| r.message == cursor) {
            return Outcome::NoNewMessages;
        }
        if let Some(i) = records.iter().position(|r| r.message == cursor) {
            records.drain(..=i);
        }
    }

    if let Some(limit) = limit {
        let excess = records.len().saturating_sub(limit.get());
        records.drain(..excess);
    }

    records.into()
}
