//! The include directive: one occurrence of the include tag.
//!
//! A directive is built from the payload of the tag in one of three forms:
//!
//! ```yaml
//! scalar:   !inc include.d/1.yaml
//! sequence: !inc [include.d/**/*.yaml, 2]
//! mapping:  !inc {urlpath: include.d/*.yaml, glob: {maxdepth: 1}, flatten: true}
//! ```
//!
//! [`Directive::to_node`] performs the reverse conversion so a document whose
//! includes were left unresolved can be written back out and parsed again
//! to the same directives.

use crate::constants::{DEFAULT_KEY, FLATTEN_KEY, TARGET_KEY, URLPATH_KEY};
use crate::core::{IncludeError, Result};
use crate::params::CallArgs;
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};

/// An include statement, as written in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    target: String,
    positional: Vec<Value>,
    named: Mapping,
    flatten: bool,
    default: Option<Value>,
}

impl Directive {
    /// A directive for `target` with no parameters.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::InvalidDirective`] when `target` is empty.
    pub fn new(target: impl Into<String>) -> Result<Self> {
        let target = target.into();
        if target.trim().is_empty() {
            return Err(IncludeError::invalid_directive("include target must not be empty"));
        }
        Ok(Self {
            target,
            positional: Vec::new(),
            named: Mapping::new(),
            flatten: false,
            default: None,
        })
    }

    /// Set the positional parameters.
    #[must_use]
    pub fn with_positional(mut self, positional: Vec<Value>) -> Self {
        self.positional = positional;
        self
    }

    /// Set the named parameters.
    #[must_use]
    pub fn with_named(mut self, named: Mapping) -> Self {
        self.named = named;
        self
    }

    /// Concatenate the sequences of multiple matched files.
    #[must_use]
    pub const fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    /// Value used instead of failing when the target does not exist.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// The path, URL or pattern to include.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Positional parameters following the target in sequence form.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Named parameters of the mapping form, reserved keys removed.
    pub const fn named(&self) -> &Mapping {
        &self.named
    }

    /// Whether multi-file results are flattened.
    pub const fn flatten(&self) -> bool {
        self.flatten
    }

    /// The not-found fallback, if one was given.
    pub const fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// All parameters as a single backend call.
    pub fn call_args(&self) -> CallArgs {
        CallArgs {
            positional: self.positional.clone(),
            named: self.named.clone(),
        }
    }

    /// Build a directive from the payload of an include tag.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::InvalidDirective`] for null or nested-tag
    /// payloads, empty targets, non-identifier mapping keys or a mapping with
    /// no `urlpath`, and [`IncludeError::ConfigError`] for a `flatten` that is
    /// not a boolean.
    pub fn from_node(node: &Value) -> Result<Self> {
        match node {
            Value::Sequence(seq) => {
                let Some((first, rest)) = seq.split_first() else {
                    return Err(IncludeError::invalid_directive(
                        "sequence form needs the target as its first element",
                    ));
                };
                Ok(Self::new(scalar_target(first)?)?.with_positional(rest.to_vec()))
            }
            Value::Mapping(map) => Self::from_mapping(map),
            scalar => Self::new(scalar_target(scalar)?),
        }
    }

    fn from_mapping(map: &Mapping) -> Result<Self> {
        if let Some(bad) = map.keys().find(|k| !is_identifier_key(k)) {
            return Err(IncludeError::invalid_directive(format!(
                "mapping keys must be identifier strings, found {bad:?}"
            )));
        }

        let target = match (map.get(URLPATH_KEY), map.get(TARGET_KEY)) {
            (Some(_), Some(_)) => {
                return Err(IncludeError::invalid_directive(
                    "give either `urlpath` or `target`, not both",
                ));
            }
            (Some(value), None) | (None, Some(value)) => scalar_target(value)?,
            (None, None) => {
                return Err(IncludeError::invalid_directive("mapping form requires a `urlpath` key"));
            }
        };

        let mut directive = Self::new(target)?;
        if let Some(flatten) = map.get(FLATTEN_KEY) {
            directive.flatten = parse_flatten(flatten)?;
        }
        directive.default = map.get(DEFAULT_KEY).cloned();
        directive.named = map
            .iter()
            .filter(|(k, _)| {
                !matches!(k.as_str(), Some(URLPATH_KEY | TARGET_KEY | FLATTEN_KEY | DEFAULT_KEY))
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(directive)
    }

    /// Represent the directive as a tagged node.
    ///
    /// Scalar form when there are no parameters, sequence form for positional
    /// parameters, mapping form (with `urlpath` first) when named parameters,
    /// `flatten` or a default are present. Positional parameters cannot be
    /// expressed in mapping form and are dropped there.
    pub fn to_node(&self, tag: &Tag) -> Value {
        let value = if !self.named.is_empty() || self.flatten || self.default.is_some() {
            if !self.positional.is_empty() {
                tracing::warn!(
                    "Dropping positional parameters of '{}' in mapping form",
                    self.target
                );
            }
            let mut map = Mapping::new();
            map.insert(Value::from(URLPATH_KEY), Value::from(self.target.as_str()));
            map.extend(self.named.iter().map(|(k, v)| (k.clone(), v.clone())));
            if self.flatten {
                map.insert(Value::from(FLATTEN_KEY), Value::Bool(true));
            }
            if let Some(default) = &self.default {
                map.insert(Value::from(DEFAULT_KEY), default.clone());
            }
            Value::Mapping(map)
        } else if !self.positional.is_empty() {
            let mut seq = Vec::with_capacity(self.positional.len() + 1);
            seq.push(Value::from(self.target.as_str()));
            seq.extend(self.positional.iter().cloned());
            Value::Sequence(seq)
        } else {
            Value::from(self.target.as_str())
        };

        Value::Tagged(Box::new(TaggedValue {
            tag: tag.clone(),
            value,
        }))
    }
}

fn scalar_target(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(IncludeError::invalid_directive("include tag needs a target")),
        Value::Sequence(_) | Value::Mapping(_) => {
            Err(IncludeError::invalid_directive("include target must be a scalar"))
        }
        Value::Tagged(tagged) => Err(IncludeError::invalid_directive(format!(
            "unsupported node: nested tag {} inside an include",
            tagged.tag
        ))),
    }
}

/// `flatten` may be written as a string (`"true"`), which is parsed as YAML.
fn parse_flatten(value: &Value) -> Result<bool> {
    let parsed = match value {
        Value::String(s) => serde_yaml::from_str::<Value>(s)
            .map_err(|e| IncludeError::config(format!("`flatten` must be a boolean: {e}")))?,
        other => other.clone(),
    };
    parsed
        .as_bool()
        .ok_or_else(|| IncludeError::config(format!("`flatten` must be a boolean, got {value:?}")))
}

fn is_identifier_key(key: &Value) -> bool {
    let Some(s) = key.as_str() else {
        return false;
    };
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}
