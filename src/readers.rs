//! Per-format readers selected by file name.
//!
//! A [`ReaderTable`] maps file-name patterns to [`Reader`]s. Installed as
//! the includer's format loader (see [`ReaderTable::into_loader`]), it lets
//! one document include YAML, JSON, TOML, INI and plain-text files side by
//! side:
//!
//! ```yaml
//! settings: !inc conf/settings.toml
//! schema:   !inc conf/schema.json
//! motd:     !inc conf/motd.txt
//! ```
//!
//! Rows are checked in order and the last matching row wins, so rows pushed
//! after the defaults override them.

use crate::core::{IncludeError, Result};
use crate::includer::{FormatLoader, Includer};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;
use tracing::trace;

/// How an included file's content is turned into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reader {
    /// YAML, parsed by the active includer so nested includes work
    Yaml,
    /// JSON document
    Json,
    /// TOML document; datetimes become strings
    Toml,
    /// INI file: a mapping of sections to mappings of string values
    Ini,
    /// The whole file as one string
    PlainText,
}

impl Reader {
    /// Parse `text` read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::Parse`] naming `path` when the content is not
    /// valid for this format.
    pub fn parse(self, path: &str, text: &str, includer: &Includer) -> Result<Value> {
        let parse_error = |reason: String| IncludeError::Parse {
            path: path.to_string(),
            reason,
        };
        match self {
            Self::Yaml => includer.parse_yaml(path, text),
            Self::Json => serde_json::from_str(text).map_err(|e| parse_error(e.to_string())),
            Self::Toml => toml::from_str::<toml::Table>(text)
                .map(|table| toml_to_yaml(toml::Value::Table(table)))
                .map_err(|e| parse_error(e.to_string())),
            Self::Ini => parse_ini(text).map_err(parse_error),
            Self::PlainText => Ok(Value::String(text.to_string())),
        }
    }
}

impl FromStr for Reader {
    type Err = IncludeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            "ini" => Ok(Self::Ini),
            "text" | "txt" | "plain" => Ok(Self::PlainText),
            other => Err(IncludeError::config(format!(
                "unknown reader '{other}', expected one of: yaml, json, toml, ini, text"
            ))),
        }
    }
}

impl fmt::Display for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
            Self::Ini => "ini",
            Self::PlainText => "text",
        };
        f.write_str(name)
    }
}

/// File-name patterns mapped to readers.
#[derive(Debug, Clone)]
pub struct ReaderTable {
    rows: Vec<(Regex, Reader)>,
}

impl Default for ReaderTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ReaderTable {
    /// A table with no rows.
    pub const fn empty() -> Self {
        Self {
            rows: Vec::new(),
        }
    }

    /// A table recognising the usual extensions, case-insensitively:
    /// `.yaml`/`.yml`, `.json`, `.ini`, `.toml` and `.txt`.
    pub fn with_defaults() -> Self {
        let mut table = Self::empty();
        for (pattern, reader) in [
            (r"(?i)^.+\.ya?ml$", Reader::Yaml),
            (r"(?i)^.+\.json$", Reader::Json),
            (r"(?i)^.+\.ini$", Reader::Ini),
            (r"(?i)^.+\.toml$", Reader::Toml),
            (r"(?i)^.+\.txt$", Reader::PlainText),
        ] {
            if let Ok(re) = Regex::new(pattern) {
                table.rows.push((re, reader));
            }
        }
        table
    }

    /// Append a row; it takes precedence over every earlier row.
    ///
    /// The pattern is matched from the start of the path.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::ConfigError`] for an invalid regex.
    pub fn push(&mut self, pattern: &str, reader: Reader) -> Result<&mut Self> {
        let anchored = format!("^(?:{pattern})");
        let re = Regex::new(&anchored)
            .map_err(|e| IncludeError::config(format!("invalid reader pattern '{pattern}': {e}")))?;
        self.rows.push((re, reader));
        Ok(self)
    }

    /// The reader for `path`: the last row whose pattern matches.
    pub fn reader_for(&self, path: &str) -> Option<Reader> {
        self.rows.iter().rev().find(|(re, _)| re.is_match(path)).map(|(_, reader)| *reader)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Read and parse one file.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::UnsupportedFormat`] when no row matches
    /// `path`, or the reader's error.
    pub fn read(&self, path: &str, reader: &mut dyn Read, includer: &Includer) -> Result<Value> {
        let format = self.reader_for(path).ok_or_else(|| IncludeError::UnsupportedFormat {
            path: path.to_string(),
        })?;
        trace!("Reading {} as {}", path, format);
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(|e| IncludeError::from_io("reading", path, e))?;
        format.parse(path, &text, includer)
    }

    /// Turn the table into a format loader for [`Includer`].
    pub fn into_loader(self) -> FormatLoader {
        Arc::new(move |path, reader, includer| self.read(path, reader, includer))
    }
}

fn toml_to_yaml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Sequence(items.into_iter().map(toml_to_yaml).collect()),
        toml::Value::Table(table) => Value::Mapping(
            table.into_iter().map(|(k, v)| (Value::String(k), toml_to_yaml(v))).collect(),
        ),
    }
}

/// Parse an INI file.
///
/// Keys are lowercased, `=` and `:` both separate key and value, lines
/// starting with `#` or `;` are comments and indented lines continue the
/// previous value. Entries of a `[DEFAULT]` section are copied into every
/// other section that does not set them.
fn parse_ini(text: &str) -> std::result::Result<Value, String> {
    let mut defaults: Vec<(String, String)> = Vec::new();
    let mut sections: Vec<(String, Vec<(String, String)>)> = Vec::new();
    let mut in_default = false;

    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let mut current = if in_default { Some(&mut defaults) } else { sections.last_mut().map(|(_, e)| e) };

        if raw.starts_with([' ', '\t']) {
            if let Some((_, value)) = current.as_mut().and_then(|entries| entries.last_mut()) {
                value.push('\n');
                value.push_str(line);
                continue;
            }
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            in_default = name == "DEFAULT";
            if !in_default {
                sections.push((name, Vec::new()));
            }
            continue;
        }

        let Some(split) = line.find(['=', ':']) else {
            return Err(format!("line {}: expected `key = value`, found '{line}'", number + 1));
        };
        let key = line[..split].trim().to_lowercase();
        let value = line[split + 1..].trim().to_string();
        let Some(entries) = current else {
            return Err(format!("line {}: entry before any section header", number + 1));
        };
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }

    let mut result = Mapping::new();
    for (name, entries) in sections {
        let mut section = Mapping::new();
        for (key, value) in &entries {
            section.insert(Value::from(key.as_str()), Value::from(value.as_str()));
        }
        for (key, value) in &defaults {
            if !entries.iter().any(|(k, _)| k == key) {
                section.insert(Value::from(key.as_str()), Value::from(value.as_str()));
            }
        }
        result.insert(Value::String(name), Value::Mapping(section));
    }
    Ok(Value::Mapping(result))
}
