//! Local file system backend.
//!
//! Wildcard listing walks the pattern's literal root with `walkdir` and
//! matches each file's relative path against the wildcard part of the
//! pattern:
//!
//! - `*` matches any sequence of characters within a single path component
//! - `**` matches any number of path components, bounded by `maxdepth`
//! - `?` matches any single character
//! - `[abc]` / `[a-z]` match one character from the set or range
//!
//! Leading `^`/`!` negation is not supported. Symlinks are not followed
//! while walking, and results are returned sorted.

use super::{
    FileSystem, OpenFile, OpenOptions, glob_depth, glob_maxdepth, split_glob_root,
};
use crate::core::{IncludeError, Result};
use crate::params::CallArgs;
use glob::{MatchOptions, Pattern};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled wildcard pattern for paths relative to a glob root.
///
/// # Examples
///
/// ```rust,no_run
/// use yaml_include::fs::PatternMatcher;
/// use std::path::Path;
///
/// # fn example() -> yaml_include::core::Result<()> {
/// let matcher = PatternMatcher::new("*.yaml")?;
/// assert!(matcher.matches("1.yaml"));
/// assert!(!matcher.matches("nested/1.yaml"));
///
/// let matches = matcher.find_matches(Path::new("include.d"), Some(1))?;
/// println!("Found {} matching files", matches.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: Pattern,
    original_pattern: String,
}

impl PatternMatcher {
    /// Compile a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::ConfigError`] for invalid glob syntax.
    pub fn new(pattern_str: &str) -> Result<Self> {
        let pattern = Pattern::new(pattern_str).map_err(|e| {
            IncludeError::config(format!("Invalid glob pattern '{pattern_str}': {e}"))
        })?;

        Ok(Self {
            pattern,
            original_pattern: pattern_str.to_string(),
        })
    }

    /// Find all files under `base_path` whose relative path matches.
    ///
    /// `max_depth` bounds how many components below `base_path` a match may
    /// have. Returned paths are relative to `base_path`, in walk order.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory walk fails for a reason other
    /// than a missing root.
    pub fn find_matches(&self, base_path: &Path, max_depth: Option<usize>) -> Result<Vec<PathBuf>> {
        debug!("Searching for pattern '{}' in {:?}", self.original_pattern, base_path);

        let mut walker = WalkDir::new(base_path).min_depth(1).follow_links(false);
        if let Some(depth) = max_depth {
            walker = walker.max_depth(depth);
        }

        let mut matches = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    let path = base_path.display().to_string();
                    return match e.into_io_error() {
                        Some(io) if io.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
                        Some(io) => Err(IncludeError::from_io("listing", &path, io)),
                        None => Ok(Vec::new()),
                    };
                }
                Err(e) => {
                    trace!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            if let Ok(relative_path) = entry.path().strip_prefix(base_path) {
                let relative_str = crate::path::to_posix(relative_path);
                trace!("Checking path: {}", relative_str);

                if self.matches(&relative_str) {
                    debug!("Found match: {}", relative_str);
                    matches.push(relative_path.to_path_buf());
                }
            }
        }

        debug!("Found {} matches for pattern '{}'", matches.len(), self.original_pattern);
        Ok(matches)
    }

    /// Whether a `/`-separated relative path matches the pattern.
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches_with(path, MATCH_OPTIONS)
    }

    /// The pattern string this matcher was compiled from.
    pub fn pattern(&self) -> &str {
        &self.original_pattern
    }
}

/// Backend for local paths and `file://` URLs.
///
/// Relative paths are resolved against the process working directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Create the local backend.
    pub const fn new() -> Self {
        Self
    }
}

/// Strip a `file://` prefix, keeping the path.
fn local_path(path: &str) -> &str {
    path.strip_prefix("file://").unwrap_or(path)
}

impl FileSystem for LocalFileSystem {
    fn glob(&self, pattern: &str, args: &CallArgs) -> Result<Vec<String>> {
        let maxdepth = glob_maxdepth(pattern, args)?;
        let pattern = local_path(pattern);
        let (root, rest) = split_glob_root(pattern);
        if rest.is_empty() {
            // No wildcard: the pattern names at most one file.
            let exists = Path::new(pattern).is_file();
            return Ok(if exists { vec![pattern.to_string()] } else { Vec::new() });
        }

        let root_str = root.join("/");
        let base = match (root.is_empty(), root_str.is_empty()) {
            (true, _) => PathBuf::from("."),
            // Pattern like "/*.yaml": the root is the filesystem root.
            (false, true) => PathBuf::from("/"),
            (false, false) => PathBuf::from(&root_str),
        };

        let matcher = PatternMatcher::new(&rest.join("/"))?;
        let mut matches: Vec<String> = matcher
            .find_matches(&base, glob_depth(&rest, maxdepth))?
            .into_iter()
            .map(|relative| {
                let relative = crate::path::to_posix(&relative);
                if root.is_empty() {
                    relative
                } else {
                    format!("{root_str}/{relative}")
                }
            })
            .collect();
        matches.sort();
        Ok(matches)
    }

    fn open(&self, path: &str, args: &CallArgs) -> Result<OpenFile> {
        let options = OpenOptions::parse(path, args, &[])?;
        let local = local_path(path);
        trace!("Opening local file {}", local);
        let file = File::open(local).map_err(|e| IncludeError::from_io("opening", path, e))?;
        Ok(OpenFile::new(path, file).decompress(options.compression))
    }
}
