use crate::statics;
use anyhow::Context;
use serde::Deserialize;
use std::{fs, path::Path, time::Duration};
use tracing::debug;

/// Browser settings. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrowserConfig {
    pub dataset_path: String,
    pub audio_prefix: String,
    pub search_debounce_ms: u64,
    pub filter_debounce_ms: u64,
    pub escape_window_ms: u64,
    /// Category shown on startup and after a reset; first category when unset.
    pub default_category: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            dataset_path: statics::DEFAULT_DATASET_PATH.to_string(),
            audio_prefix: statics::DEFAULT_AUDIO_PREFIX.to_string(),
            search_debounce_ms: statics::DEBOUNCE_MS,
            filter_debounce_ms: statics::DEBOUNCE_MS,
            escape_window_ms: statics::ESCAPE_WINDOW_MS,
            default_category: None,
        }
    }
}

impl BrowserConfig {
    pub fn from_json5(text: &str) -> anyhow::Result<Self> {
        Ok(json5::from_str::<Self>(text)?)
    }

    pub fn load_path(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
        let config = Self::from_json5(&text).with_context(|| format!("parsing {path:?}"))?;
        debug!(?config, "loaded config");
        Ok(config)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }

    pub fn escape_window(&self) -> Duration {
        Duration::from_millis(self.escape_window_ms)
    }
}

/// Initial selection requested through a query string
/// (`?odf=avtank&cat=Weapon`). Both parameters are case-insensitive; `odf`
/// may omit the `.odf` suffix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeepLink {
    pub odf: Option<String>,
    pub cat: Option<String>,
}

impl DeepLink {
    /// Parse a query string, with or without a leading `?`. A full URL is
    /// accepted too; only its query part is read.
    pub fn parse(input: &str) -> Self {
        let query = match input.split_once('?') {
            Some((_, q)) => q,
            None => input,
        };
        let mut link = DeepLink::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match &*key {
                statics::QUERY_ODF => link.odf = Some(value.to_string()),
                statics::QUERY_CAT => link.cat = Some(value.to_string()),
                _ => {}
            }
        }
        link
    }

    pub fn is_empty(&self) -> bool {
        self.odf.is_none()
    }
}
