//! Scheme-based routing between the built-in backends.

use super::{FileSystem, HttpConfig, HttpFileSystem, LocalFileSystem, OpenFile};
use crate::core::{IncludeError, Result};
use crate::params::CallArgs;
use crate::path::scheme_of;
use std::sync::OnceLock;

/// The default backend: local paths and `file://` go to the local file
/// system, `http://` and `https://` to HTTP.
///
/// The HTTP client is only built when the first remote include is met.
#[derive(Debug, Default)]
pub struct DefaultFileSystem {
    local: LocalFileSystem,
    http_config: HttpConfig,
    http: OnceLock<HttpFileSystem>,
}

impl DefaultFileSystem {
    /// Create the default backend with default HTTP settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the default backend with custom HTTP settings.
    pub fn with_http_config(http_config: HttpConfig) -> Self {
        Self {
            http_config,
            ..Self::default()
        }
    }

    fn http(&self) -> Result<&HttpFileSystem> {
        if let Some(http) = self.http.get() {
            return Ok(http);
        }
        let built = HttpFileSystem::new(self.http_config.clone())?;
        Ok(self.http.get_or_init(|| built))
    }

    fn backend(&self, path: &str) -> Result<&dyn FileSystem> {
        match scheme_of(path).as_deref() {
            None | Some("file") => Ok(&self.local),
            Some("http" | "https") => Ok(self.http()?),
            Some(scheme) => Err(IncludeError::UnsupportedScheme {
                scheme: scheme.to_string(),
                url: path.to_string(),
            }),
        }
    }
}

impl FileSystem for DefaultFileSystem {
    fn glob(&self, pattern: &str, args: &CallArgs) -> Result<Vec<String>> {
        self.backend(pattern)?.glob(pattern, args)
    }

    fn open(&self, path: &str, args: &CallArgs) -> Result<OpenFile> {
        self.backend(path)?.open(path, args)
    }

    fn open_files(&self, pattern: &str, args: &CallArgs) -> Result<Vec<OpenFile>> {
        self.backend(pattern)?.open_files(pattern, args)
    }
}
