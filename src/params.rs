//! Routing of leftover include parameters to listing and opening calls.
//!
//! Include tags can carry extra parameters in several historical shapes:
//!
//! ```yaml
//! a: !inc [conf/**/*.yml, 2]                                   # bare maxdepth
//! b: !inc [conf/**/*.yml, {maxdepth: 2}, {encoding: utf-8}]    # glob + open
//! c: !inc {urlpath: conf/**/*.yml, glob: {maxdepth: 2}, open: rb}
//! ```
//!
//! [`route`] reduces all of them to a [`GlobOpenPlan`]: one [`GlobParams`] for
//! the directory listing and one [`OpenParams`] for each file opened from it.
//! Each side is interpreted by shape (mapping, list or bare scalar) and turned
//! into the [`CallArgs`] a [`FileSystem`](crate::fs::FileSystem) receives.

use crate::constants::{GLOB_KEY, MAXDEPTH_KEY, OPEN_KEY};
use crate::core::{IncludeError, Result};
use serde_yaml::{Mapping, Value};

/// Arguments of a backend call, in positional and keyword form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    /// Positional arguments, in order
    pub positional: Vec<Value>,
    /// Keyword arguments
    pub named: Mapping,
}

impl CallArgs {
    /// Arguments with only keyword entries.
    pub fn named(named: Mapping) -> Self {
        Self {
            positional: Vec::new(),
            named,
        }
    }

    /// Arguments with only positional entries.
    pub fn positional(positional: Vec<Value>) -> Self {
        Self {
            positional,
            named: Mapping::new(),
        }
    }

    /// Whether no argument at all was supplied.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Look an option up by keyword first, then by positional index.
    pub fn get(&self, key: &str, index: usize) -> Option<&Value> {
        self.named.get(key).or_else(|| self.positional.get(index))
    }

    /// Split off the keyword entries named in `keys`.
    ///
    /// Returns `(selected, rest)`; positional arguments stay with `rest`.
    pub fn partition_named(&self, keys: &[&str]) -> (Self, Self) {
        let (selected, rest): (Vec<_>, Vec<_>) = self
            .named
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .partition(|(k, _)| k.as_str().is_some_and(|k| keys.contains(&k)));
        (
            Self::named(selected.into_iter().collect()),
            Self {
                positional: self.positional.clone(),
                named: rest.into_iter().collect(),
            },
        )
    }

    /// Keyword names that are not in `allowed`.
    pub fn unknown_keys(&self, allowed: &[&str]) -> Vec<String> {
        self.named
            .keys()
            .filter_map(|k| match k {
                Value::String(s) if allowed.contains(&s.as_str()) => None,
                Value::String(s) => Some(s.clone()),
                other => Some(format!("{other:?}")),
            })
            .collect()
    }
}

/// How the directory listing is called.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobParams {
    /// No extra options
    Default,
    /// Keyword options; `maxdepth` already coerced to an integer
    Keyword(Mapping),
    /// Positional options; the first one (maxdepth) already coerced
    Positional(Vec<Value>),
    /// A bare maxdepth; `None` when the value was not numeric
    MaxDepth(Option<u64>),
}

impl GlobParams {
    /// Interpret a glob parameter by its shape.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::ConfigError`] for a `maxdepth` that is not an
    /// integer inside a mapping or list, or for a tagged value.
    pub fn from_value(value: Option<&Value>) -> Result<Self> {
        match value {
            None | Some(Value::Null) => Ok(Self::Default),
            Some(Value::Mapping(map)) => {
                let mut map = map.clone();
                if let Some(depth) = map.get_mut(MAXDEPTH_KEY) {
                    *depth = maxdepth_value(coerce_maxdepth(depth)?);
                }
                Ok(Self::Keyword(map))
            }
            Some(Value::Sequence(seq)) => {
                let mut seq = seq.clone();
                if let Some(first) = seq.first_mut() {
                    *first = maxdepth_value(coerce_maxdepth(first)?);
                }
                Ok(Self::Positional(seq))
            }
            Some(Value::Tagged(_)) => {
                Err(IncludeError::config("glob parameters cannot be a tagged value"))
            }
            // Non-numeric scalars fall back to unlimited depth.
            Some(scalar) => Ok(Self::MaxDepth(coerce_maxdepth(scalar).ok().flatten())),
        }
    }

    /// The backend call arguments for this shape.
    pub fn to_call_args(&self) -> CallArgs {
        match self {
            Self::Default => CallArgs::default(),
            Self::Keyword(map) => CallArgs::named(map.clone()),
            Self::Positional(seq) => CallArgs::positional(seq.clone()),
            Self::MaxDepth(depth) => {
                let mut named = Mapping::new();
                named.insert(Value::from(MAXDEPTH_KEY), maxdepth_value(*depth));
                CallArgs::named(named)
            }
        }
    }
}

/// How each matched file is opened.
#[derive(Debug, Clone, PartialEq)]
pub enum OpenParams {
    /// No extra options
    Default,
    /// Keyword options
    Keyword(Mapping),
    /// Positional options
    Positional(Vec<Value>),
    /// A literal open mode such as `"rb"`
    Mode(String),
}

impl OpenParams {
    /// Interpret an open parameter by its shape.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::ConfigError`] for numbers, booleans and tagged
    /// values, which name no open option.
    pub fn from_value(value: Option<&Value>) -> Result<Self> {
        match value {
            None | Some(Value::Null) => Ok(Self::Default),
            Some(Value::Mapping(map)) => Ok(Self::Keyword(map.clone())),
            Some(Value::Sequence(seq)) => Ok(Self::Positional(seq.clone())),
            Some(Value::String(mode)) => Ok(Self::Mode(mode.clone())),
            Some(other) => {
                Err(IncludeError::config(format!("invalid open parameter: {other:?}")))
            }
        }
    }

    /// The backend call arguments for this shape.
    pub fn to_call_args(&self) -> CallArgs {
        match self {
            Self::Default => CallArgs::default(),
            Self::Keyword(map) => CallArgs::named(map.clone()),
            Self::Positional(seq) => CallArgs::positional(seq.clone()),
            Self::Mode(mode) => {
                let mut named = Mapping::new();
                named.insert(Value::from("mode"), Value::from(mode.as_str()));
                CallArgs::named(named)
            }
        }
    }
}

/// Options for the two calls of a local wildcard include.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobOpenPlan {
    /// Directory listing options
    pub glob: GlobParams,
    /// Per-file open options
    pub open: OpenParams,
}

impl Default for GlobOpenPlan {
    fn default() -> Self {
        Self {
            glob: GlobParams::Default,
            open: OpenParams::Default,
        }
    }
}

/// Split positional and named include parameters into a [`GlobOpenPlan`].
///
/// 1. One positional parameter is a glob option (usually maxdepth); two or
///    more are glob options then open options, the rest is ignored.
/// 2. Otherwise the `glob` and `open` named parameters are used.
/// 3. Otherwise both calls use their defaults.
///
/// # Errors
///
/// Returns [`IncludeError::ConfigError`] when either side has an
/// unrecognised shape.
pub fn route(positional: &[Value], named: &Mapping) -> Result<GlobOpenPlan> {
    let (glob, open) = match positional {
        [] if !named.is_empty() => (named.get(GLOB_KEY), named.get(OPEN_KEY)),
        [] => return Ok(GlobOpenPlan::default()),
        [glob] => (Some(glob), None),
        [glob, open, rest @ ..] => {
            if !rest.is_empty() {
                tracing::debug!("Ignoring {} extra positional include parameter(s)", rest.len());
            }
            (Some(glob), Some(open))
        }
    };

    Ok(GlobOpenPlan {
        glob: GlobParams::from_value(glob)?,
        open: OpenParams::from_value(open)?,
    })
}

/// Coerce a maxdepth given as integer or numeric string.
///
/// `null` means unlimited and yields `Ok(None)`.
///
/// # Errors
///
/// Returns [`IncludeError::ConfigError`] for anything else.
pub fn coerce_maxdepth(value: &Value) -> Result<Option<u64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| IncludeError::config(format!("maxdepth must be a non-negative integer, got {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| IncludeError::config(format!("maxdepth must be an integer, got '{s}'"))),
        other => Err(IncludeError::config(format!("maxdepth must be an integer, got {other:?}"))),
    }
}

fn maxdepth_value(depth: Option<u64>) -> Value {
    depth.map_or(Value::Null, Value::from)
}
