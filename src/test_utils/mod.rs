//! Test utilities for yaml-include
//!
//! Helpers shared by the unit tests and the integration suite:
//!
//! - [`init_test_logging`] wires `tracing` output into the test harness
//! - [`RecordingFileSystem`] is an in-memory backend that records every call
//!   it receives, so tests can assert which resolution route ran
//! - [`write_fixture`] lays out include trees on disk
//!
//! # Example
//!
//! ```rust,no_run
//! use yaml_include::Includer;
//! use yaml_include::test_utils::{Call, RecordingFileSystem};
//!
//! let fs = RecordingFileSystem::new().with_file("include.d/1.yaml", "name: '1'");
//! let includer = Includer::builder().fs(fs.clone()).build().unwrap();
//! includer.load_str("a: !inc include.d/*.yaml").unwrap();
//! assert!(matches!(fs.calls().as_slice(), [Call::Glob { .. }, Call::Open { .. }]));
//! ```

use crate::core::{IncludeError, Result};
use crate::fs::{FileSystem, OpenFile};
use crate::params::CallArgs;
use glob::{MatchOptions, Pattern};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, Once, PoisonError};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` set, that level is used;
/// otherwise `RUST_LOG` is honoured, and without either nothing is logged.
///
/// ```bash
/// RUST_LOG=yaml_include=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// One backend call seen by a [`RecordingFileSystem`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// A directory listing
    Glob {
        /// Pattern listed
        pattern: String,
        /// Arguments passed
        args: CallArgs,
    },
    /// A single open
    Open {
        /// Path opened
        path: String,
        /// Arguments passed
        args: CallArgs,
    },
    /// A multi-file open
    OpenFiles {
        /// Pattern opened
        pattern: String,
        /// Arguments passed
        args: CallArgs,
    },
}

#[derive(Debug, Default)]
struct Recorded {
    files: BTreeMap<String, String>,
    calls: Vec<Call>,
}

/// In-memory backend recording every call.
///
/// Clones share the same files and call log. Paths are matched literally,
/// so `mem://host/a.yaml` works as well as `conf/a.yaml`.
#[derive(Debug, Clone, Default)]
pub struct RecordingFileSystem {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingFileSystem {
    /// An empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file.
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.lock().files.insert(path.into(), contents.into());
        self
    }

    /// Every call so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Every call so far, clearing the log.
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.lock().calls)
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }

    fn matching(&self, pattern: &str) -> Result<Vec<String>> {
        let compiled = Pattern::new(pattern)
            .map_err(|e| IncludeError::config(format!("Invalid glob pattern '{pattern}': {e}")))?;
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };
        Ok(self.lock().files.keys().filter(|k| compiled.matches_with(k, options)).cloned().collect())
    }

    fn read(&self, path: &str) -> Result<OpenFile> {
        let contents = self.lock().files.get(path).cloned().ok_or_else(|| IncludeError::NotFound {
            path: path.to_string(),
        })?;
        Ok(OpenFile::new(path, Cursor::new(contents.into_bytes())))
    }
}

impl FileSystem for RecordingFileSystem {
    fn glob(&self, pattern: &str, args: &CallArgs) -> Result<Vec<String>> {
        self.record(Call::Glob {
            pattern: pattern.to_string(),
            args: args.clone(),
        });
        self.matching(pattern)
    }

    fn open(&self, path: &str, args: &CallArgs) -> Result<OpenFile> {
        self.record(Call::Open {
            path: path.to_string(),
            args: args.clone(),
        });
        self.read(path)
    }

    fn open_files(&self, pattern: &str, args: &CallArgs) -> Result<Vec<OpenFile>> {
        self.record(Call::OpenFiles {
            pattern: pattern.to_string(),
            args: args.clone(),
        });
        self.matching(pattern)?.iter().map(|path| self.read(path)).collect()
    }
}

/// Write `contents` to `relative` under `root`, creating parent directories.
///
/// # Panics
///
/// Panics when the file cannot be written.
pub fn write_fixture(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("cannot create {}: {e}", parent.display()));
    }
    std::fs::write(&path, contents).unwrap_or_else(|e| panic!("cannot write {}: {e}", path.display()));
}
