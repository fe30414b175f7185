use core::{num::NonZeroUsize, time::Duration};
use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use wasc::{
    batch::{self, RunOptions},
    config::Settings,
    contacts::Contacts,
    scrape::{ChromeDom, Session, cancel::cancel_on_ctrl_c, pause},
};

/// Exports WhatsApp Web conversations to CSV, resuming after the last exported message.
#[derive(clap::Parser)]
#[command(version)]
struct Args {
    /// Browser and timing settings.
    #[arg(short, long, value_name = "file", default_value = "settings.toml")]
    settings: PathBuf,

    /// Contacts to scrape and their resume cursors.
    #[arg(short, long, value_name = "file", default_value = "contacts.json")]
    contacts: PathBuf,

    #[arg(long, value_name = "dir", default_value = "data")]
    data_dir: PathBuf,

    #[arg(long, value_name = "dir", default_value = "logs")]
    logs_dir: PathBuf,

    /// Keep only the newest N messages per contact.
    #[arg(short, long, value_name = "N")]
    limit: Option<NonZeroUsize>,

    /// Also export messages sent from this account.
    #[arg(long)]
    include_my_user: bool,

    /// Give up on a contact after this many seconds.
    #[arg(long, value_name = "secs")]
    contact_timeout: Option<u64>,

    /// Run the browser headless (needs an already linked profile).
    #[arg(long)]
    headless: bool,

    /// Mirror the log to the console.
    #[arg(long)]
    console: bool,

    /// Do not write advanced cursors back to the contact list.
    #[arg(long)]
    no_save: bool,

    /// Only these contacts (default: all of them).
    #[arg(value_name = "contact")]
    only: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;

    let args = Args::parse();
    let _guard = wasc::logging::init(&args.logs_dir, args.console)?;

    let mut settings = Settings::load(&args.settings)?;
    settings.browser.headless |= args.headless;
    let mut contacts = Contacts::load(&args.contacts)?;
    tracing::info!(target: "main", "{} contacts loaded from {}", contacts.len(), args.contacts.display());

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let session = Session::launch(&settings.browser).await?;
    if pause(settings.timing.startup_pause, &cancel).await.is_err() {
        return Ok(());
    }

    let dom = ChromeDom::new(session.tab(), settings.selectors.clone())?;
    let options = RunOptions {
        limit: args.limit,
        include_my_user: args.include_my_user,
        contact_timeout: args.contact_timeout.map(Duration::from_secs),
        data_dir: args.data_dir,
        contacts_path: (!args.no_save).then_some(args.contacts),
    };

    let summary = batch::run(&dom, &mut contacts, &args.only, &options, &settings.timing, &cancel).await;
    if summary.failed > 0 {
        tracing::warn!(target: "main", "{} contacts failed, check the log for details", summary.failed);
    }

    Ok(())
}
