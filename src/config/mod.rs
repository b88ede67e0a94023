use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};

use crate::utils::prelude::*;

pub mod storage;

/// Global bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Classic command prefix.
    #[serde(default)]
    pub prefix: Prefix,

    /// Path to the static templates file.
    #[serde(default = "GlobalSettings::default_templates")]
    pub templates: PathBuf,

    /// Path to the saved builds file.
    #[serde(default = "GlobalSettings::default_builds")]
    pub builds: PathBuf,

    /// Language used when a guild has not chosen one.
    #[serde(default = "GlobalSettings::default_language")]
    pub language: String,

    /// How long a confirmation dialog waits for an answer.
    #[serde(default = "GlobalSettings::default_confirm_timeout")]
    pub confirm_timeout_secs: u64,
}

impl GlobalSettings {
    fn default_templates() -> PathBuf {
        PathBuf::from("./templates.json")
    }

    fn default_builds() -> PathBuf {
        PathBuf::from("./data/global/builds.json")
    }

    fn default_language() -> String {
        String::from("en")
    }

    const fn default_confirm_timeout() -> u64 {
        30
    }
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            prefix: Prefix::default(),
            templates: Self::default_templates(),
            builds: Self::default_builds(),
            language: Self::default_language(),
            confirm_timeout_secs: Self::default_confirm_timeout(),
        }
    }
}

#[derive(Debug)]
pub struct BotConfig {
    settings: GlobalSettings,
}

impl BotConfig {
    const PATH: &'static str = "./data/global/bot.json";

    /// Load the configuration file, creating a default one if needed.
    pub fn new() -> AnyResult<Self> {
        Self::load_from(Self::PATH)
    }

    /// Load the configuration from a specific file.
    pub fn load_from(path: impl AsRef<Path>) -> AnyResult<Self> {
        let settings = storage::read_or_create::<GlobalSettings>(path)
            .context("Failed to load bot settings")?;

        debug!("Loaded bot settings: {settings:?}");

        Ok(Self { settings })
    }

    /// Return a reference to the loaded settings.
    pub const fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    /// Classic command prefix.
    pub const fn classic_prefix(&self) -> &Prefix {
        &self.settings.prefix
    }

    /// Confirmation dialog timeout.
    pub const fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.confirm_timeout_secs)
    }
}

/// Bot classic command prefix.
#[derive(Debug, Clone, Deref, Display, Serialize, Deserialize)]
pub struct Prefix(String);

impl Default for Prefix {
    fn default() -> Self {
        Self(String::from("!"))
    }
}

impl AsRef<str> for Prefix {
    fn as_ref(&self) -> &str {
        self
    }
}
