//! Base-directory joining and scheme detection for include targets.
//!
//! An include target is either a plain filesystem path (`include.d/1.yaml`,
//! `/etc/app/*.yml`) or a URL with a protocol prefix
//! (`http://host/conf.yaml`, `file:///srv/app.yaml`). Before anything is
//! opened the target is combined with the configured [`BaseDir`]:
//!
//! - without a scheme, base and target are joined as filesystem paths and
//!   normalised to forward slashes so wildcard matching behaves the same on
//!   every platform;
//! - with a scheme, the base is joined onto the URL's path component only and
//!   the URL is reassembled around it.
//!
//! Wildcard detection ([`has_wildcard`]) runs on the joined path.

use crate::core::{IncludeError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Base location used for relative include targets.
#[derive(Clone)]
pub enum BaseDir {
    /// A fixed directory.
    Literal(PathBuf),
    /// Called once per resolution to obtain the directory.
    Provider(Arc<dyn Fn() -> PathBuf + Send + Sync>),
}

impl BaseDir {
    /// Build a literal base directory, expanding `~` and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::ConfigError`] when a referenced environment
    /// variable is not set.
    pub fn literal(path: &str) -> Result<Self> {
        let expanded = shellexpand::full(path)
            .map_err(|e| IncludeError::config(format!("Cannot expand base dir '{path}': {e}")))?;
        Ok(Self::Literal(PathBuf::from(expanded.as_ref())))
    }

    /// Build a base directory computed on every resolution.
    pub fn provider(f: impl Fn() -> PathBuf + Send + Sync + 'static) -> Self {
        Self::Provider(Arc::new(f))
    }

    /// The directory to use for the current resolution.
    pub fn resolve(&self) -> PathBuf {
        match self {
            Self::Literal(path) => path.clone(),
            Self::Provider(f) => f(),
        }
    }
}

impl fmt::Debug for BaseDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(path) => f.debug_tuple("Literal").field(path).finish(),
            Self::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

impl From<PathBuf> for BaseDir {
    fn from(path: PathBuf) -> Self {
        Self::Literal(path)
    }
}

impl From<&Path> for BaseDir {
    fn from(path: &Path) -> Self {
        Self::Literal(path.to_path_buf())
    }
}

impl From<&str> for BaseDir {
    fn from(path: &str) -> Self {
        Self::Literal(PathBuf::from(path))
    }
}

/// A target after base-directory joining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBase {
    /// Protocol prefix of the original target, if any.
    pub scheme: Option<String>,
    /// The path or URL to list or open.
    pub effective_path: String,
}

impl ResolvedBase {
    /// Whether the target named an explicit protocol.
    pub const fn has_scheme(&self) -> bool {
        self.scheme.is_some()
    }
}

/// The five components of a URL, split without normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlParts<'a> {
    /// Protocol prefix, empty when absent
    pub scheme: &'a str,
    /// Authority after `//`, empty when absent
    pub netloc: &'a str,
    /// Path component
    pub path: &'a str,
    /// Query without the leading `?`
    pub query: Option<&'a str>,
    /// Fragment without the leading `#`
    pub fragment: Option<&'a str>,
}

impl UrlParts<'_> {
    /// Reassemble the URL with a different path component.
    pub fn with_path(&self, path: &str) -> String {
        let mut url = String::new();
        if !self.scheme.is_empty() {
            url.push_str(self.scheme);
            url.push(':');
        }
        if !self.netloc.is_empty() || self.scheme == "file" {
            url.push_str("//");
            url.push_str(self.netloc);
        }
        if !self.netloc.is_empty() && !path.is_empty() && !path.starts_with('/') {
            url.push('/');
        }
        url.push_str(path);
        if let Some(query) = self.query {
            url.push('?');
            url.push_str(query);
        }
        if let Some(fragment) = self.fragment {
            url.push('#');
            url.push_str(fragment);
        }
        url
    }
}

/// Split a target into URL components.
///
/// A scheme is only recognised when it is at least two characters long, so
/// Windows drive letters (`C:/data/*.yml`) stay plain paths.
pub fn split_url(target: &str) -> UrlParts<'_> {
    let (scheme, rest) = match target.split_once(':') {
        Some((scheme, rest)) if is_scheme(scheme) => (scheme, rest),
        _ => ("", target),
    };

    let (rest, fragment) = match rest.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (rest, None),
    };

    // `?` doubles as a wildcard in plain paths, so only URLs carry a query.
    let (rest, query) = match rest.split_once('?') {
        Some((rest, query)) if !scheme.is_empty() => (rest, Some(query)),
        _ => (rest, None),
    };

    let (netloc, path) = match rest.strip_prefix("//") {
        Some(after) => match after.find('/') {
            Some(idx) => (&after[..idx], &after[idx..]),
            None => (after, ""),
        },
        None => ("", rest),
    };

    UrlParts {
        scheme,
        netloc,
        path,
        query,
        fragment,
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    candidate.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// The protocol prefix of `target`, lowercased, if it has one.
pub fn scheme_of(target: &str) -> Option<String> {
    let parts = split_url(target);
    (!parts.scheme.is_empty()).then(|| parts.scheme.to_ascii_lowercase())
}

/// Combine `target` with the optional base directory.
///
/// The scheme is taken from the original target. When no base is configured
/// the target is returned unchanged and the backend decides what it is
/// relative to.
pub fn resolve_path(target: &str, base: Option<&BaseDir>) -> ResolvedBase {
    let parts = split_url(target);
    let scheme = (!parts.scheme.is_empty()).then(|| parts.scheme.to_ascii_lowercase());

    let Some(base) = base else {
        return ResolvedBase {
            scheme,
            effective_path: target.to_string(),
        };
    };

    let base = base.resolve();
    let effective_path = if scheme.is_some() {
        parts.with_path(&to_posix(&base.join(parts.path)))
    } else {
        to_posix(&base.join(target))
    };

    ResolvedBase {
        scheme,
        effective_path,
    }
}

/// Render a path with forward slashes.
pub fn to_posix(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Whether `path` contains a glob wildcard (`*`, `?`, `[` or `]`).
pub fn has_wildcard(path: &str) -> bool {
    path.contains(['*', '?', '[', ']'])
}
