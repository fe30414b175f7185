use core::time::Duration;
use std::{ffi::OsStr, sync::Arc};

use headless_chrome::{Browser, LaunchOptions, Tab};
use tokio::task::spawn_blocking;

use crate::config::{BrowserFamily, BrowserSettings};

/// Long waits for a human-paced UI must not look like a dead browser.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(60 * 60);

pub fn puppeteer(settings: &BrowserSettings) -> anyhow::Result<Browser> {
    if settings.browser == BrowserFamily::Unsupported {
        tracing::warn!(target: "session", "only Chrome/Chromium can be driven, using Chrome");
    }

    Browser::new(LaunchOptions {
        args: vec![OsStr::new("--disable-blink-features=AutomationControlled")],
        headless: settings.headless,
        path: settings.binary.clone(),
        user_data_dir: settings.profile_path.clone(),
        idle_browser_timeout: IDLE_BROWSER_TIMEOUT,
        ..LaunchOptions::default()
    })
}

#[allow(clippy::significant_drop_tightening)]
pub fn first_tab(browser: &Browser) -> anyhow::Result<Arc<Tab>> {
    let tab = browser.new_tab()?;

    {
        let tabs_guard = browser
            .get_tabs()
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        for remain in &*tabs_guard {
            if !Arc::ptr_eq(&tab, remain) {
                remain.close(true)?;
            }
        }
    }

    Ok(tab)
}

pub async fn navigate_to(tab: Arc<Tab>, url: &'static str) -> anyhow::Result<()> {
    spawn_blocking(move || {
        tab.navigate_to(url)?.wait_until_navigated()?;
        Ok::<_, anyhow::Error>(())
    })
    .await?
}

/// The browser process and the one tab WhatsApp Web runs in.
pub struct Session {
    // dropping the browser kills the process
    _browser: Browser,
    tab: Arc<Tab>,
}

impl Session {
    pub async fn launch(settings: &BrowserSettings) -> anyhow::Result<Self> {
        tracing::info!(target: "session", "Starting WhatsApp Web..");

        let browser = puppeteer(settings)?;
        let tab = first_tab(&browser)?;
        navigate_to(Arc::clone(&tab), super::BASE_URL).await?;

        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    #[must_use]
    pub fn tab(&self) -> Arc<Tab> {
        Arc::clone(&self.tab)
    }
}
