//! Resolution of a single include directive.
//!
//! The target is first joined with the base directory, then classified by
//! two questions: does it name a protocol, and does it contain a wildcard?
//!
//! | scheme | wildcard | [`Route`]        | backend calls                       |
//! |--------|----------|------------------|-------------------------------------|
//! | yes    | yes      | `RemoteGlob`     | `open_files` with all parameters    |
//! | yes    | no       | `RemoteSingle`   | `open` with all parameters          |
//! | no     | yes      | `LocalGlob`      | `glob` then `open`, parameters split by [`params::route`] |
//! | no     | no       | `LocalSingle`    | `open` with all parameters          |
//!
//! Wildcard routes produce a sequence with one entry per matched file (an
//! empty sequence when nothing matches), or one concatenated sequence when
//! the directive asks for `flatten`. Single routes produce the parsed value
//! itself.

use crate::core::{IncludeError, Result};
use crate::directive::Directive;
use crate::fs::OpenFile;
use crate::includer::Includer;
use crate::params;
use crate::path::{ResolvedBase, has_wildcard, resolve_path};
use serde_yaml::Value;
use std::fmt;
use std::io::Cursor;
use tracing::{debug, warn};

/// The four ways a directive can be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Protocol prefix and wildcard: one multi-open call
    RemoteGlob,
    /// Protocol prefix, single resource
    RemoteSingle,
    /// Plain path with wildcard: listing, then one open per match
    LocalGlob,
    /// Plain path, single file
    LocalSingle,
}

impl Route {
    /// Classify a resolved target.
    ///
    /// The scheme comes from the original target, the wildcard test runs on
    /// the joined path.
    pub fn classify(resolved: &ResolvedBase) -> Self {
        match (resolved.has_scheme(), has_wildcard(&resolved.effective_path)) {
            (true, true) => Self::RemoteGlob,
            (true, false) => Self::RemoteSingle,
            (false, true) => Self::LocalGlob,
            (false, false) => Self::LocalSingle,
        }
    }

    /// Whether this route yields a sequence of per-file results.
    pub const fn is_multi(self) -> bool {
        matches!(self, Self::RemoteGlob | Self::LocalGlob)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RemoteGlob => "remote glob",
            Self::RemoteSingle => "remote single",
            Self::LocalGlob => "local glob",
            Self::LocalSingle => "local single",
        };
        f.write_str(name)
    }
}

/// Resolve `directive` with the settings of `includer`.
///
/// A missing target is replaced by the directive's `default` when one is
/// given. Files that exist but fail while being parsed, including through a
/// missing nested include, are never replaced. A textual default is parsed through the active format loader as
/// if it were the content of the missing file.
///
/// # Errors
///
/// - [`IncludeError::NotFound`] when the target does not exist and there is
///   no default
/// - [`IncludeError::FlattenNotSequence`] when `flatten` meets a file whose
///   top level is not a sequence
/// - [`IncludeError::ConfigError`] for parameters no backend call accepts
/// - any backend or parse error, unchanged; multi-file includes fail as a
///   whole
pub fn resolve(includer: &Includer, directive: &Directive) -> Result<Value> {
    let resolved = resolve_path(directive.target(), includer.base_dir());
    let route = Route::classify(&resolved);
    debug!("Including '{}' via {} ({})", directive.target(), resolved.effective_path, route);

    match resolve_route(includer, directive, route, &resolved.effective_path) {
        Ok(value) => Ok(value),
        Err(Failure::Missing(e)) => match directive.default() {
            Some(default) => {
                debug!("'{}' not found, using its default", resolved.effective_path);
                parse_default(includer, &resolved.effective_path, default)
            }
            None => Err(e),
        },
        Err(Failure::Other(e)) => Err(e),
    }
}

/// Why a route failed.
///
/// Only the directive's own backend calls can report a missing target;
/// everything raised while parsing what was found, including a missing
/// file named by a nested include, is [`Failure::Other`].
enum Failure {
    Missing(IncludeError),
    Other(IncludeError),
}

impl Failure {
    fn backend(error: IncludeError) -> Self {
        if error.is_not_found() { Self::Missing(error) } else { Self::Other(error) }
    }
}

impl From<IncludeError> for Failure {
    fn from(error: IncludeError) -> Self {
        Self::Other(error)
    }
}

fn resolve_route(
    includer: &Includer,
    directive: &Directive,
    route: Route,
    path: &str,
) -> std::result::Result<Value, Failure> {
    let fs = includer.fs();
    match route {
        Route::RemoteGlob => {
            let files = fs.open_files(path, &directive.call_args()).map_err(Failure::backend)?;
            debug!("'{}' matched {} file(s)", path, files.len());
            collect(includer, directive.flatten(), files.into_iter().map(Ok))
        }
        Route::RemoteSingle | Route::LocalSingle => {
            let file = fs.open(path, &directive.call_args()).map_err(Failure::backend)?;
            Ok(parse_file(includer, file)?)
        }
        Route::LocalGlob => {
            let plan = params::route(directive.positional(), directive.named())?;
            let open_args = plan.open.to_call_args();
            let matches = fs.glob(path, &plan.glob.to_call_args()).map_err(Failure::backend)?;
            debug!("'{}' matched {} file(s)", path, matches.len());
            collect(
                includer,
                directive.flatten(),
                matches.iter().map(|m| fs.open(m, &open_args).map_err(Failure::backend)),
            )
        }
    }
}

/// Parse each opened file in order; the first failure aborts the whole
/// include.
fn collect(
    includer: &Includer,
    flatten: bool,
    files: impl Iterator<Item = std::result::Result<OpenFile, Failure>>,
) -> std::result::Result<Value, Failure> {
    let mut items = Vec::new();
    for file in files {
        let file = file?;
        let path = file.path().to_string();
        let value = parse_file(includer, file)?;
        if !flatten {
            items.push(value);
            continue;
        }
        match value {
            Value::Sequence(seq) => items.extend(seq),
            other => {
                return Err(Failure::Other(IncludeError::FlattenNotSequence {
                    path,
                    found: kind_of(&other).to_string(),
                }));
            }
        }
    }
    Ok(Value::Sequence(items))
}

/// Parse one file; the handle is closed when this returns.
fn parse_file(includer: &Includer, mut file: OpenFile) -> Result<Value> {
    let path = file.path().to_string();
    includer.parse_stream(&path, &mut file)
}

fn parse_default(includer: &Includer, path: &str, default: &Value) -> Result<Value> {
    match default {
        Value::String(text) => {
            let mut reader = Cursor::new(text.as_bytes());
            includer.parse_stream(path, &mut reader).or_else(|e| {
                warn!("Default for '{}' is not parseable ({}), using it as text", path, e);
                Ok(default.clone())
            })
        }
        other => Ok(other.clone()),
    }
}

/// Human-readable node kind used in error messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
