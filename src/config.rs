use core::time::Duration;
use std::{fs, path::Path, path::PathBuf};

use anyhow::Context;
use serde::{Deserialize, Deserializer};

use crate::scrape::selectors::Selectors;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub browser: BrowserSettings,
    pub timing: Timing,
    pub selectors: Selectors,
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings at {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid settings TOML at {}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserFamily {
    #[default]
    Chrome,
    Chromium,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub browser: BrowserFamily,
    /// Browser executable; `None` lets headless_chrome look one up.
    pub binary: Option<PathBuf>,
    /// Profile directory holding an already linked WhatsApp Web session.
    pub profile_path: Option<PathBuf>,
    pub headless: bool,
}

/// Every fixed delay the scraper uses, in milliseconds in the settings file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Timing {
    #[serde(deserialize_with = "millis")]
    pub load_timeout: Duration,
    #[serde(deserialize_with = "millis")]
    pub poll_period: Duration,
    #[serde(deserialize_with = "millis")]
    pub scroll_pause: Duration,
    #[serde(deserialize_with = "millis")]
    pub contact_pause: Duration,
    #[serde(deserialize_with = "millis")]
    pub startup_pause: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_secs(10),
            poll_period: Duration::from_millis(1832 / 4),
            scroll_pause: Duration::from_secs(2),
            contact_pause: Duration::from_secs(5),
            startup_pause: Duration::from_secs(3),
        }
    }
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}
