//! The include constructor and its integration with `serde_yaml`.
//!
//! [`Includer`] owns the configuration of the include tag: which backend
//! opens files, what relative targets are joined onto, whether directives
//! are resolved while parsing, how included files are parsed and which tag
//! name is recognised.
//!
//! Parsing happens in two steps. `serde_yaml` first produces a [`Value`]
//! tree in which every custom tag is a [`Value::Tagged`] node. The
//! construction pass then walks that tree bottom-up; each node carrying the
//! include tag becomes a [`Directive`] which is either resolved on the spot
//! (autoload) or written back as a tagged node for a later
//! [walk](crate::walker).
//!
//! # Examples
//!
//! ```rust,no_run
//! use yaml_include::Includer;
//!
//! # fn example() -> yaml_include::core::Result<()> {
//! let includer = Includer::builder().base_dir("tests/fixtures").build()?;
//! let doc = includer.load_str("file1: !inc include.d/1.yaml")?;
//! assert_eq!(doc["file1"]["name"], "1");
//!
//! // Keep the directives and resolve them later
//! let deferred = includer.with_autoload(false).load_str("file1: !inc include.d/1.yaml")?;
//! let resolved = yaml_include::walk(&includer, &deferred, true)?;
//! assert_eq!(resolved, doc);
//! # Ok(())
//! # }
//! ```

use crate::constants::DEFAULT_TAG;
use crate::core::{IncludeError, Result};
use crate::directive::Directive;
use crate::fs::{DefaultFileSystem, FileSystem};
use crate::path::BaseDir;
use crate::resolver;
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// Parses one included file.
///
/// Called with the path or URL the file was opened from, its stream and the
/// includer active for the enclosing document, so nested includes can be
/// parsed with the same settings.
pub type FormatLoader = Arc<dyn Fn(&str, &mut dyn Read, &Includer) -> Result<Value> + Send + Sync>;

/// The include-tag constructor.
///
/// Cheap to clone; the backend and loader are shared.
#[derive(Clone)]
pub struct Includer {
    fs: Arc<dyn FileSystem>,
    base_dir: Option<BaseDir>,
    autoload: bool,
    format_loader: Option<FormatLoader>,
    tag: Tag,
}

impl Default for Includer {
    fn default() -> Self {
        Self {
            fs: Arc::new(DefaultFileSystem::new()),
            base_dir: None,
            autoload: true,
            format_loader: None,
            tag: Tag::new(DEFAULT_TAG),
        }
    }
}

impl fmt::Debug for Includer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Includer")
            .field("fs", &self.fs)
            .field("base_dir", &self.base_dir)
            .field("autoload", &self.autoload)
            .field("format_loader", &self.format_loader.as_ref().map(|_| ".."))
            .field("tag", &self.tag)
            .finish()
    }
}

impl Includer {
    /// An includer with the default backend, no base directory, autoload on
    /// and the `!inc` tag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start configuring an includer.
    pub fn builder() -> IncluderBuilder {
        IncluderBuilder::default()
    }

    /// The backend used to list and open included files.
    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// The base directory relative targets are joined onto.
    pub const fn base_dir(&self) -> Option<&BaseDir> {
        self.base_dir.as_ref()
    }

    /// Whether directives are resolved while parsing.
    pub const fn autoload(&self) -> bool {
        self.autoload
    }

    /// The recognised tag, without its leading `!`.
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// The custom per-file loader, if any.
    pub fn format_loader(&self) -> Option<&FormatLoader> {
        self.format_loader.as_ref()
    }

    /// A copy of this includer with `autoload` overridden.
    ///
    /// The copy shares the backend and loader; the original is untouched,
    /// so concurrent parses never observe each other's setting.
    #[must_use]
    pub fn with_autoload(&self, autoload: bool) -> Self {
        Self {
            autoload,
            ..self.clone()
        }
    }

    /// A copy of this includer with a different base directory.
    #[must_use]
    pub fn with_base_dir(&self, base_dir: impl Into<BaseDir>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
            ..self.clone()
        }
    }

    /// Whether `tag` is the include tag.
    pub fn is_include_tag(&self, tag: &Tag) -> bool {
        *tag == self.tag
    }

    /// Parse a YAML document, handling include tags.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::Yaml`] for malformed YAML and any error raised
    /// while constructing or resolving a directive.
    pub fn load_str(&self, text: &str) -> Result<Value> {
        let value: Value = serde_yaml::from_str(text)?;
        self.construct(value)
    }

    /// Read a whole stream and parse it with [`Self::load_str`].
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::Io`] when the stream cannot be read as UTF-8.
    pub fn load_reader(&self, mut reader: impl Read) -> Result<Value> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| IncludeError::from_io("reading", STREAM_PATH, e))?;
        self.load_str(&text)
    }

    /// Parse a local YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::NotFound`] when the file does not exist and
    /// [`IncludeError::Parse`] when it is not valid YAML.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        debug!("Loading {}", shown);
        let file = File::open(path).map_err(|e| IncludeError::from_io("opening", &shown, e))?;
        self.load_reader(file).map_err(|e| with_path(e, &shown))
    }

    /// Parse one included file with the active format loader.
    ///
    /// Without a custom loader the stream is parsed as YAML by this includer,
    /// so nested includes inherit its settings.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::Parse`] naming `path` when parsing fails.
    pub fn parse_stream(&self, path: &str, reader: &mut dyn Read) -> Result<Value> {
        if let Some(loader) = &self.format_loader {
            trace!("Parsing {} with custom loader", path);
            return loader(path, reader, self);
        }
        self.load_reader(reader).map_err(|e| with_path(e, path))
    }

    /// Parse YAML text read from `path`, handling include tags.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::Parse`] naming `path` for malformed YAML.
    pub fn parse_yaml(&self, path: &str, text: &str) -> Result<Value> {
        self.load_str(text).map_err(|e| with_path(e, path))
    }

    /// Resolve one directive now, regardless of `autoload`.
    ///
    /// # Errors
    ///
    /// See [`resolver::resolve`].
    pub fn resolve(&self, directive: &Directive) -> Result<Value> {
        resolver::resolve(self, directive)
    }

    /// Serialise a document, writing deferred directives back as tags.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::Yaml`] if the value cannot be serialised.
    pub fn dump(&self, value: &Value) -> Result<String> {
        Ok(serde_yaml::to_string(value)?)
    }

    /// Run the construction pass over a freshly parsed tree.
    ///
    /// Children are constructed before their parent, so an include whose
    /// payload holds other tags sees them already handled.
    fn construct(&self, value: Value) -> Result<Value> {
        match value {
            Value::Tagged(tagged) => {
                let TaggedValue {
                    tag,
                    value,
                } = *tagged;
                let value = self.construct(value)?;
                if self.is_include_tag(&tag) {
                    self.construct_include(&value)
                } else {
                    Ok(Value::Tagged(Box::new(TaggedValue {
                        tag,
                        value,
                    })))
                }
            }
            Value::Sequence(seq) => {
                seq.into_iter().map(|v| self.construct(v)).collect::<Result<_>>().map(Value::Sequence)
            }
            Value::Mapping(map) => map
                .into_iter()
                .map(|(k, v)| Ok((self.construct(k)?, self.construct(v)?)))
                .collect::<Result<Mapping>>()
                .map(Value::Mapping),
            scalar => Ok(scalar),
        }
    }

    fn construct_include(&self, payload: &Value) -> Result<Value> {
        let directive = Directive::from_node(payload)?;
        if self.autoload {
            trace!("Resolving include of '{}' while parsing", directive.target());
            resolver::resolve(self, &directive)
        } else {
            trace!("Deferring include of '{}'", directive.target());
            Ok(directive.to_node(&self.tag))
        }
    }
}

/// Path reported for streams read before their origin is known.
const STREAM_PATH: &str = "<stream>";

/// Attach the file name to errors that do not carry one.
///
/// Errors raised by nested includes already name their own file and pass
/// through unchanged.
fn with_path(error: IncludeError, path: &str) -> IncludeError {
    match error {
        IncludeError::Yaml(e) => IncludeError::Parse {
            path: path.to_string(),
            reason: e.to_string(),
        },
        IncludeError::Io {
            operation,
            path: stream,
            source,
        } if stream == STREAM_PATH => IncludeError::Io {
            operation,
            path: path.to_string(),
            source,
        },
        other => other,
    }
}

/// Builder for [`Includer`].
#[derive(Default)]
pub struct IncluderBuilder {
    fs: Option<Arc<dyn FileSystem>>,
    base_dir: Option<BaseDir>,
    autoload: Option<bool>,
    format_loader: Option<FormatLoader>,
    tag: Option<String>,
}

impl IncluderBuilder {
    /// Use a custom backend.
    #[must_use]
    pub fn fs(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Some(Arc::new(fs));
        self
    }

    /// Use an already shared backend.
    #[must_use]
    pub fn shared_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Join relative targets onto `base_dir`.
    #[must_use]
    pub fn base_dir(mut self, base_dir: impl Into<BaseDir>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Compute the base directory on every resolution.
    #[must_use]
    pub fn base_dir_provider(
        mut self,
        provider: impl Fn() -> std::path::PathBuf + Send + Sync + 'static,
    ) -> Self {
        self.base_dir = Some(BaseDir::provider(provider));
        self
    }

    /// Resolve directives while parsing (default `true`).
    #[must_use]
    pub const fn autoload(mut self, autoload: bool) -> Self {
        self.autoload = Some(autoload);
        self
    }

    /// Parse included files with `loader` instead of YAML.
    #[must_use]
    pub fn format_loader(
        mut self,
        loader: impl Fn(&str, &mut dyn Read, &Includer) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.format_loader = Some(Arc::new(loader));
        self
    }

    /// Use an already shared loader.
    #[must_use]
    pub fn shared_format_loader(mut self, loader: FormatLoader) -> Self {
        self.format_loader = Some(loader);
        self
    }

    /// Recognise `!{tag}` instead of `!inc`.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Build the includer.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::ConfigError`] for an empty tag name or one
    /// containing whitespace.
    pub fn build(self) -> Result<Includer> {
        let defaults = Includer::default();
        let tag = match self.tag {
            Some(name) => parse_tag(&name)?,
            None => defaults.tag,
        };
        Ok(Includer {
            fs: self.fs.unwrap_or(defaults.fs),
            base_dir: self.base_dir,
            autoload: self.autoload.unwrap_or(defaults.autoload),
            format_loader: self.format_loader,
            tag,
        })
    }
}

impl From<Includer> for IncluderBuilder {
    fn from(includer: Includer) -> Self {
        Self {
            fs: Some(includer.fs),
            base_dir: includer.base_dir,
            autoload: Some(includer.autoload),
            format_loader: includer.format_loader,
            tag: Some(includer.tag.to_string()),
        }
    }
}

/// Validate a tag name given with or without its leading `!`.
fn parse_tag(name: &str) -> Result<Tag> {
    let bare = name.strip_prefix('!').unwrap_or(name);
    if bare.is_empty() || bare.chars().any(char::is_whitespace) {
        return Err(IncludeError::config(format!("invalid include tag name '{name}'")));
    }
    Ok(Tag::new(bare))
}
