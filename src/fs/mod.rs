//! File-system backends used to list and open included documents.
//!
//! Every include ends in one of three backend calls:
//!
//! - [`FileSystem::glob`] - list the paths matching a wildcard pattern
//! - [`FileSystem::open`] - open one path or URL
//! - [`FileSystem::open_files`] - open every resource matching a remote pattern
//!
//! Backends receive the include's leftover parameters as [`CallArgs`] and
//! reject options they do not understand.
//!
//! # Backends
//!
//! - [`LocalFileSystem`] - local paths and `file://` URLs
//! - [`HttpFileSystem`] - `http://` and `https://` URLs
//! - [`DefaultFileSystem`] - routes each call by URL scheme to one of the above
//!
//! Opened files are returned as [`OpenFile`] handles, which close the
//! underlying file or connection when dropped.

mod dispatch;
mod http;
mod local;

pub use dispatch::DefaultFileSystem;
pub use http::{HttpConfig, HttpFileSystem};
pub use local::{LocalFileSystem, PatternMatcher};

use crate::constants::MAXDEPTH_KEY;
use crate::core::{IncludeError, Result};
use crate::params::CallArgs;
use flate2::read::GzDecoder;
use serde_yaml::Value;
use std::fmt;
use std::io::Read;

/// A storage backend able to list and open documents.
pub trait FileSystem: Send + Sync + fmt::Debug {
    /// List the paths matching `pattern`.
    ///
    /// A pattern whose literal root does not exist yields an empty list.
    fn glob(&self, pattern: &str, args: &CallArgs) -> Result<Vec<String>>;

    /// Open a single path or URL for reading.
    fn open(&self, path: &str, args: &CallArgs) -> Result<OpenFile>;

    /// Open every resource matching `pattern`.
    ///
    /// `maxdepth` is forwarded to the listing, every other argument to each
    /// open. Either every file is opened or an error is returned.
    fn open_files(&self, pattern: &str, args: &CallArgs) -> Result<Vec<OpenFile>> {
        let (glob_args, open_args) = args.partition_named(&[MAXDEPTH_KEY]);
        self.glob(pattern, &glob_args)?.iter().map(|path| self.open(path, &open_args)).collect()
    }
}

/// A readable handle on an included document.
pub struct OpenFile {
    path: String,
    reader: Box<dyn Read + Send>,
}

impl OpenFile {
    /// Wrap a reader opened from `path`.
    pub fn new(path: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        Self {
            path: path.into(),
            reader: Box::new(reader),
        }
    }

    /// The path or URL this handle was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Wrap the reader in a decompressor.
    fn decompress(self, compression: Compression) -> Self {
        match compression.for_path(&self.path) {
            Compression::Gzip => Self {
                reader: Box::new(GzDecoder::new(self.reader)),
                path: self.path,
            },
            _ => self,
        }
    }
}

impl Read for OpenFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for OpenFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenFile").field("path", &self.path).finish_non_exhaustive()
    }
}

/// Stream compression applied on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Plain bytes
    #[default]
    None,
    /// gzip stream
    Gzip,
    /// gzip when the path ends in `.gz`, plain otherwise
    Infer,
}

impl Compression {
    fn parse(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::None),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "none" => Ok(Self::None),
                "gzip" | "gz" => Ok(Self::Gzip),
                "infer" => Ok(Self::Infer),
                other => Err(IncludeError::config(format!("unsupported compression '{other}'"))),
            },
            other => Err(IncludeError::config(format!("invalid compression {other:?}"))),
        }
    }

    fn for_path(self, path: &str) -> Self {
        match self {
            Self::Infer if path.to_ascii_lowercase().ends_with(".gz") => Self::Gzip,
            Self::Infer => Self::None,
            other => other,
        }
    }
}

/// Options shared by every backend's `open`.
///
/// Positional order is `mode`, `compression`, `encoding`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct OpenOptions {
    pub compression: Compression,
}

impl OpenOptions {
    pub const KEYS: [&'static str; 3] = ["mode", "compression", "encoding"];

    /// Parse the common options; `extra` lists backend-specific keys that
    /// the caller handles itself.
    pub fn parse(path: &str, args: &CallArgs, extra: &[&str]) -> Result<Self> {
        let allowed: Vec<&str> = Self::KEYS.iter().chain(extra).copied().collect();
        let unknown = args.unknown_keys(&allowed);
        if !unknown.is_empty() {
            return Err(IncludeError::config(format!(
                "unsupported open option(s) for '{path}': {}",
                unknown.join(", ")
            )));
        }
        if args.positional.len() > Self::KEYS.len() {
            return Err(IncludeError::config(format!(
                "too many positional open options for '{path}'"
            )));
        }

        if let Some(mode) = args.get("mode", 0) {
            match mode.as_str() {
                Some("r" | "rt" | "rb") => {}
                _ => {
                    return Err(IncludeError::config(format!(
                        "included files are read-only, invalid mode {mode:?}"
                    )));
                }
            }
        }

        if let Some(encoding) = args.get("encoding", 2) {
            let supported = encoding
                .as_str()
                .map(|e| matches!(e.to_ascii_lowercase().as_str(), "utf-8" | "utf8"))
                .unwrap_or(false);
            if !supported {
                return Err(IncludeError::config(format!(
                    "unsupported encoding {encoding:?}, only utf-8 is read"
                )));
            }
        }

        let compression = match args.get("compression", 1) {
            Some(value) => Compression::parse(value)?,
            None => Compression::None,
        };

        Ok(Self {
            compression,
        })
    }
}

/// Limit on how many path segments below the glob root a match may have.
///
/// Without `**` the depth is fixed by the pattern. With `**`, `maxdepth`
/// bounds how many directory levels the double star may span.
pub(crate) fn glob_depth(segments: &[&str], maxdepth: Option<u64>) -> Option<usize> {
    let fixed = segments.iter().filter(|s| **s != "**").count();
    if segments.contains(&"**") {
        maxdepth.map(|d| fixed.saturating_add(usize::try_from(d).unwrap_or(usize::MAX)))
    } else {
        Some(fixed)
    }
}

/// Read `maxdepth` from glob call arguments, rejecting anything else.
pub(crate) fn glob_maxdepth(pattern: &str, args: &CallArgs) -> Result<Option<u64>> {
    let unknown = args.unknown_keys(&[MAXDEPTH_KEY]);
    if !unknown.is_empty() || args.positional.len() > 1 {
        return Err(IncludeError::config(format!(
            "unsupported glob option(s) for '{pattern}': {}",
            if unknown.is_empty() { "extra positional values".to_string() } else { unknown.join(", ") }
        )));
    }
    match args.get(MAXDEPTH_KEY, 0) {
        Some(value) => crate::params::coerce_maxdepth(value),
        None => Ok(None),
    }
}

/// Split a pattern into its literal root and the wildcard segments after it.
pub(crate) fn split_glob_root(pattern: &str) -> (Vec<&str>, Vec<&str>) {
    let segments: Vec<&str> = pattern.split('/').collect();
    let first_wild =
        segments.iter().position(|s| crate::path::has_wildcard(s)).unwrap_or(segments.len());
    (segments[..first_wild].to_vec(), segments[first_wild..].to_vec())
}
