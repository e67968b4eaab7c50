//! TOML parsing with file-path context in errors.

use crate::core::{IncludeError, Result};
use std::path::Path;

/// Parse a TOML configuration file into the specified type.
///
/// # Errors
///
/// Returns [`IncludeError::NotFound`] when the file does not exist,
/// [`IncludeError::Io`] when it cannot be read and
/// [`IncludeError::ConfigError`] naming the file when the TOML is invalid or
/// does not match `T`.
///
/// # Examples
///
/// ```rust,no_run
/// use yaml_include::config::parse_config;
/// use serde::Deserialize;
/// use std::path::Path;
///
/// #[derive(Deserialize)]
/// struct Config {
///     tag: String,
/// }
///
/// # fn example() -> yaml_include::core::Result<()> {
/// let config: Config = parse_config(Path::new("yaml-include.toml"))?;
/// println!("Using tag !{}", config.tag);
/// # Ok(())
/// # }
/// ```
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path)
        .map_err(|e| IncludeError::from_io("reading config file", &display, e))?;

    toml::from_str(&content)
        .map_err(|e| IncludeError::config(format!("Failed to parse config file {display}: {e}")))
}
