use std::{fs, path::Path};

use anyhow::Context;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

pub const LOG_FILE_PREFIX: &str = "wa_scraper.log";

/// Plain text lines as they land in the log file. Colour stays on the console layer.
pub fn file_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    fmt::layer().with_writer(writer).with_ansi(false)
}

/// Daily append log under `dir`, optionally mirrored to stderr.
///
/// Keep the returned guard alive for the whole run, dropping it flushes the file writer.
pub fn init(dir: &Path, console: bool) -> anyhow::Result<WorkerGuard> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file = file_layer(writer);
    let console = console.then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(file)
        .with(console)
        .try_init()?;

    tracing::info!(target: "main", "{}", "=".repeat(100));
    tracing::info!(target: "main", "Initialized log.");
    Ok(guard)
}
