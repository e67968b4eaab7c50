//! Global constants used throughout the yaml-include codebase.
//!
//! Tag names, reserved mapping keys and network limits that are used
//! across multiple modules live here so they are easy to discover.

use std::time::Duration;

/// Default include tag name, registered without the leading `!`.
pub const DEFAULT_TAG: &str = "inc";

/// Mapping-form key holding the include target.
pub const URLPATH_KEY: &str = "urlpath";

/// Accepted alias of [`URLPATH_KEY`].
pub const TARGET_KEY: &str = "target";

/// Mapping-form key enabling list flattening for multi-file includes.
pub const FLATTEN_KEY: &str = "flatten";

/// Mapping-form key holding the value used when the target is not found.
pub const DEFAULT_KEY: &str = "default";

/// Named parameter routed to directory listing for local wildcards.
pub const GLOB_KEY: &str = "glob";

/// Named parameter routed to file opening for local wildcards.
pub const OPEN_KEY: &str = "open";

/// Glob option limiting how many directory levels `**` may span.
pub const MAXDEPTH_KEY: &str = "maxdepth";

/// Default timeout for HTTP requests (30 seconds).
pub fn default_http_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Upper bound on directory levels crawled when globbing over HTTP without
/// an explicit `maxdepth`.
pub const MAX_HTTP_CRAWL_DEPTH: usize = 8;

/// Environment variable naming the configuration file used by the CLI.
pub const CONFIG_ENV_VAR: &str = "YAML_INCLUDE_CONFIG";
