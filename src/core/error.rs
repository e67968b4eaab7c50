//! Error handling for yaml-include
//!
//! This module provides the error type shared by every layer of the crate and
//! the user-facing rendering used by the `yaml-include` binary. The error
//! system follows two principles:
//! 1. **Strongly-typed errors** so embedders can match on failure modes
//!    (most importantly [`IncludeError::NotFound`])
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Not found**: [`IncludeError::NotFound`] - an included path or URL does not exist
//! - **Type mismatch**: [`IncludeError::InvalidDirective`],
//!   [`IncludeError::FlattenNotSequence`] - the include tag or an included
//!   document has the wrong shape
//! - **Configuration**: [`IncludeError::ConfigError`],
//!   [`IncludeError::UnsupportedScheme`], [`IncludeError::UnsupportedFormat`]
//! - **Backend**: [`IncludeError::Io`], [`IncludeError::Http`],
//!   [`IncludeError::HttpStatus`] - passed through without retries
//! - **Parsing**: [`IncludeError::Parse`], [`IncludeError::Yaml`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use yaml_include::core::IncludeError;
//! use yaml_include::Includer;
//!
//! let includer = Includer::builder().base_dir("tests/fixtures").build().unwrap();
//! match includer.load_str("file: !inc missing.yaml") {
//!     Err(IncludeError::NotFound { path }) => eprintln!("no such include: {path}"),
//!     Err(e) => eprintln!("include failed: {e}"),
//!     Ok(value) => println!("{value:?}"),
//! }
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IncludeError>;

/// The main error type for include resolution
///
/// Each variant carries the path, pattern or URL that triggered it so the
/// message is actionable without further context.
#[derive(Error, Debug)]
pub enum IncludeError {
    /// An included path, URL or pattern root does not exist
    ///
    /// This is the only error that a directive's `default` value can
    /// suppress. Every other error propagates unchanged.
    #[error("Included file not found: {path}")]
    NotFound {
        /// The path or URL that was requested
        path: String,
    },

    /// The include tag payload cannot be turned into a directive
    ///
    /// Raised at construction time, before any I/O: unsupported node kinds,
    /// empty targets, non-identifier mapping keys or a missing `urlpath`.
    #[error("Invalid include directive: {reason}")]
    InvalidDirective {
        /// Why the tag payload was rejected
        reason: String,
    },

    /// `flatten: true` met an included document that is not a sequence
    #[error("Cannot flatten '{path}': expected a sequence at the top level, found {found}")]
    FlattenNotSequence {
        /// The file whose top-level value was not a sequence
        path: String,
        /// Kind of value that was found instead
        found: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// A URL carries a protocol no configured backend understands
    #[error("Unsupported protocol '{scheme}' in '{url}'")]
    UnsupportedScheme {
        /// The protocol prefix without `://`
        scheme: String,
        /// The full URL
        url: String,
    },

    /// No reader is registered for the file name
    #[error("Unsupported file name '{path}': no reader matches it")]
    UnsupportedFormat {
        /// The file that could not be matched
        path: String,
    },

    /// An included document could not be parsed
    #[error("Failed to parse '{path}': {reason}")]
    Parse {
        /// The file that failed to parse
        path: String,
        /// Parser message
        reason: String,
    },

    /// An in-place walk reached a value it cannot replace
    #[error("Cannot replace include at {location}: value is not mutable")]
    NotMutable {
        /// Human-readable location of the value
        location: String,
    },

    /// File system operation failed for a reason other than not-found
    #[error("I/O error while {operation} '{path}': {source}")]
    Io {
        /// What was being done (e.g. "opening", "listing")
        operation: String,
        /// The path being accessed
        path: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// HTTP transport failure
    #[error("HTTP request to '{url}' failed: {reason}")]
    Http {
        /// The requested URL
        url: String,
        /// Transport error message
        reason: String,
    },

    /// HTTP request answered with a non-success status other than 404
    #[error("HTTP request to '{url}' returned status {status}")]
    HttpStatus {
        /// The requested URL
        url: String,
        /// The HTTP status code
        status: u16,
    },

    /// YAML parsing errors from [`serde_yaml::Error`]
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl IncludeError {
    /// Shorthand for [`IncludeError::ConfigError`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Shorthand for [`IncludeError::InvalidDirective`].
    pub fn invalid_directive(reason: impl Into<String>) -> Self {
        Self::InvalidDirective {
            reason: reason.into(),
        }
    }

    /// Classify an I/O error, mapping `NotFound` to [`IncludeError::NotFound`].
    pub fn from_io(operation: &str, path: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_string(),
            }
        } else {
            Self::Io {
                operation: operation.to_string(),
                path: path.to_string(),
                source,
            }
        }
    }

    /// Returns `true` for [`IncludeError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Error wrapper with user-facing details and a suggestion
///
/// Produced by [`user_friendly_error`] and printed by the CLI.
#[derive(Debug)]
pub struct ErrorContext {
    /// The rendered error message
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into a user-friendly [`ErrorContext`]
///
/// Known [`IncludeError`] variants get a suggestion tailored to the failure.
/// Other errors keep their full `anyhow` context chain as the message.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let message = format!("{error:#}");

    let Some(include_error) = error.downcast_ref::<IncludeError>() else {
        return ErrorContext::new(message);
    };

    match include_error {
        IncludeError::NotFound {
            ..
        } => ErrorContext::new(message)
            .with_suggestion(
                "Check the include path, or add a `default:` to the include mapping to make it optional",
            )
            .with_details("Relative include paths are resolved against the base directory"),
        IncludeError::InvalidDirective {
            ..
        } => ErrorContext::new(message).with_suggestion(
            "Use `!inc path`, `!inc [path, ...]` or `!inc {urlpath: path, ...}`",
        ),
        IncludeError::FlattenNotSequence {
            ..
        } => ErrorContext::new(message)
            .with_suggestion("Remove `flatten: true` or make every matched file a YAML sequence"),
        IncludeError::UnsupportedScheme {
            ..
        } => ErrorContext::new(message)
            .with_details("Only local paths, file:// and http(s):// URLs are supported"),
        IncludeError::UnsupportedFormat {
            ..
        } => ErrorContext::new(message).with_suggestion(
            "Readers exist for .yaml, .yml, .json, .toml, .ini and .txt files",
        ),
        IncludeError::Http {
            ..
        }
        | IncludeError::HttpStatus {
            ..
        } => ErrorContext::new(message).with_suggestion("Check your network connection and the URL"),
        IncludeError::ConfigError {
            ..
        } => ErrorContext::new(message)
            .with_suggestion("Check the include options and the configuration file"),
        _ => ErrorContext::new(message),
    }
}
