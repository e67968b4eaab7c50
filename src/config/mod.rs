//! File-based configuration of the include tag.
//!
//! Embedders normally configure an [`Includer`](crate::Includer) in code.
//! The CLI (and anyone else who prefers a file) can describe the same
//! settings in TOML:
//!
//! ```toml
//! tag = "inc"
//! base_dir = "~/conf"
//! autoload = true
//!
//! [readers]
//! enabled = true
//!
//! [[readers.rules]]
//! pattern = '.+\.conf'
//! reader = "ini"
//!
//! [http]
//! timeout_secs = 10
//! headers = { Authorization = "Bearer token" }
//! ```
//!
//! Every key is optional; unknown keys are rejected so typos surface early.

mod parser;

pub use parser::parse_config;

use crate::constants::default_http_timeout;
use crate::core::Result;
use crate::fs::{DefaultFileSystem, HttpConfig};
use crate::includer::IncluderBuilder;
use crate::path::BaseDir;
use crate::readers::{Reader, ReaderTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Settings read from a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncludeConfig {
    /// Include tag name, without the leading `!`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Base directory for relative targets; `~` and `$VARS` are expanded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<String>,

    /// Resolve includes while parsing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoload: Option<bool>,

    /// Per-format readers
    #[serde(default)]
    pub readers: ReadersConfig,

    /// HTTP backend settings
    #[serde(default)]
    pub http: HttpSettings,
}

/// The `[readers]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadersConfig {
    /// Parse included files by extension instead of always as YAML
    #[serde(default)]
    pub enabled: bool,

    /// Extra rows, applied after the defaults; any rule enables readers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<ReaderRule>,
}

impl ReadersConfig {
    /// Whether readers should be installed at all.
    pub fn is_active(&self) -> bool {
        self.enabled || !self.rules.is_empty()
    }

    /// The reader table described by this section.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::ConfigError`](crate::core::IncludeError) for
    /// an unknown reader name or an invalid pattern.
    pub fn to_table(&self) -> Result<ReaderTable> {
        let mut table = ReaderTable::with_defaults();
        for rule in &self.rules {
            table.push(&rule.pattern, rule.reader.parse::<Reader>()?)?;
        }
        Ok(table)
    }
}

/// One `[[readers.rules]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReaderRule {
    /// Regex matched against the start of the included path
    pub pattern: String,
    /// One of `yaml`, `json`, `toml`, `ini`, `text`
    pub reader: String,
}

/// The `[http]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSettings {
    /// Request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Headers sent with every request
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl From<HttpSettings> for HttpConfig {
    fn from(settings: HttpSettings) -> Self {
        Self {
            timeout: settings.timeout_secs.map_or_else(default_http_timeout, Duration::from_secs),
            headers: settings.headers,
        }
    }
}

impl IncludeConfig {
    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// See [`parse_config`].
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        parse_config(path)
    }

    /// Overlay `other` on top of `self`; values set in `other` win.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.tag = other.tag.or(self.tag);
        self.base_dir = other.base_dir.or(self.base_dir);
        self.autoload = other.autoload.or(self.autoload);
        self.readers.enabled |= other.readers.enabled;
        self.readers.rules.extend(other.readers.rules);
        self.http.timeout_secs = other.http.timeout_secs.or(self.http.timeout_secs);
        self.http.headers.extend(other.http.headers);
        self
    }

    /// A builder carrying these settings.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::ConfigError`](crate::core::IncludeError) for
    /// a base directory naming an unset variable or invalid reader rules.
    pub fn into_builder(self) -> Result<IncluderBuilder> {
        let mut builder = IncluderBuilder::default()
            .fs(DefaultFileSystem::with_http_config(self.http.into()));

        if let Some(tag) = self.tag {
            builder = builder.tag(tag);
        }
        if let Some(base_dir) = &self.base_dir {
            builder = builder.base_dir(BaseDir::literal(base_dir)?);
        }
        if let Some(autoload) = self.autoload {
            builder = builder.autoload(autoload);
        }
        if self.readers.is_active() {
            builder = builder.shared_format_loader(self.readers.to_table()?.into_loader());
        }
        Ok(builder)
    }
}
