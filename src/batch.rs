use core::{num::NonZeroUsize, time::Duration};
use std::path::{Path, PathBuf};

use chrono::Local;
use compact_str::CompactString;
use tokio_util::sync::CancellationToken;

use crate::{
    Error, Result,
    config::Timing,
    contacts::{ContactEntry, Contacts},
    export::export,
    scrape::{CollectOptions, Dom, Outcome, collect, pause, search_contact, with_deadline},
};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub limit: Option<NonZeroUsize>,
    pub include_my_user: bool,
    /// Upper bound for searching plus collecting one contact.
    pub contact_timeout: Option<Duration>,
    pub data_dir: PathBuf,
    /// Where to write advanced cursors back; `None` keeps them in memory.
    pub contacts_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ContactReport {
    Exported { path: PathBuf, rows: usize },
    NoNewMessages,
    Failed(Error),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub exported: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Locates and collects one contact, bounded by `contact_timeout`.
pub async fn scrape_contact<D: Dom>(
    dom: &D,
    name: &str,
    entry: &ContactEntry,
    options: &RunOptions,
    timing: &Timing,
    cancel: &CancellationToken,
) -> Result<Outcome> {
    let token = with_deadline(cancel, options.contact_timeout);
    let collect_options = CollectOptions {
        limit: options.limit,
        last_message: entry.last_message.clone(),
        include_my_user: options.include_my_user,
    };

    let result = locate_and_collect(dom, name, &collect_options, timing, &token).await;

    // stops the deadline timer
    token.cancel();
    result
}

async fn locate_and_collect<D: Dom>(
    dom: &D,
    name: &str,
    options: &CollectOptions,
    timing: &Timing,
    cancel: &CancellationToken,
) -> Result<Outcome> {
    let conversation = search_contact(dom, name, timing, cancel).await?;
    collect(dom, &conversation, options, timing, cancel).await
}

/// Exports an outcome and advances the contact's cursor to its newest message.
///
/// The cursor only moves once the file is on disk.
pub fn settle(
    name: &str,
    entry: &mut ContactEntry,
    outcome: Outcome,
    data_dir: &Path,
) -> Result<ContactReport> {
    let Outcome::Records(records) = outcome else {
        return Ok(ContactReport::NoNewMessages);
    };

    let Some(path) = export(&records, data_dir, name, &Local::now())? else {
        return Ok(ContactReport::NoNewMessages);
    };
    if let Some(newest) = records.last() {
        entry.last_message = Some(newest.message.clone());
    }

    Ok(ContactReport::Exported {
        path,
        rows: records.len(),
    })
}

/// Runs every contact in list order, or only those in `only` when it is not empty.
///
/// A failing contact is logged and skipped; cancelling `cancel` stops the batch.
pub async fn run<D: Dom>(
    dom: &D,
    contacts: &mut Contacts,
    only: &[String],
    options: &RunOptions,
    timing: &Timing,
    cancel: &CancellationToken,
) -> Summary {
    let names = contacts
        .names()
        .filter(|name| only.is_empty() || only.iter().any(|o| o == name.as_str()))
        .cloned()
        .collect::<Vec<CompactString>>();

    for wanted in only {
        if contacts.get(wanted).is_none() {
            tracing::warn!(target: "main", "[{wanted}] is not in the contact list, skipping");
        }
    }

    let mut summary = Summary::default();
    for (i, name) in names.iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }
        if i > 0 && pause(timing.contact_pause, cancel).await.is_err() {
            break;
        }

        match process(dom, contacts, name, options, timing, cancel).await {
            ContactReport::Exported { path, rows } => {
                summary.exported += 1;
                tracing::info!(target: "main", "[{name}] {rows} new messages -> {}", path.display());
            }
            ContactReport::NoNewMessages => {
                summary.unchanged += 1;
                tracing::info!(target: "main", "[{name}] no new messages.");
            }
            ContactReport::Failed(e) => {
                summary.failed += 1;
                tracing::error!(target: "main", "An error occurred while extracting messages from group/user <{name}>: {e}");
                tracing::debug!(target: "main", "[{name}] {e:?}");
            }
        }
    }

    tracing::info!(
        target: "main",
        "done: {} exported, {} without news, {} failed, {} not reached",
        summary.exported,
        summary.unchanged,
        summary.failed,
        names.len() - summary.exported - summary.unchanged - summary.failed,
    );
    summary
}

async fn process<D: Dom>(
    dom: &D,
    contacts: &mut Contacts,
    name: &str,
    options: &RunOptions,
    timing: &Timing,
    cancel: &CancellationToken,
) -> ContactReport {
    let mut entry = contacts.get(name).cloned().unwrap_or_default();

    let outcome = match scrape_contact(dom, name, &entry, options, timing, cancel).await {
        Ok(outcome) => outcome,
        Err(e) => return ContactReport::Failed(e),
    };

    let report = match settle(name, &mut entry, outcome, &options.data_dir) {
        Ok(report) => report,
        Err(e) => return ContactReport::Failed(e),
    };

    if matches!(report, ContactReport::Exported { .. }) {
        contacts.insert(name, entry);
        if let Some(path) = &options.contacts_path {
            if let Err(e) = contacts.save(path) {
                tracing::error!(target: "main", "[{name}] cannot update {}: {e}", path.display());
            }
        }
    }
    report
}
