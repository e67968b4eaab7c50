//! yaml-include - a YAML include tag
//!
//! Lets one YAML document include others through a custom tag, across local
//! and remote file systems:
//!
//! ```yaml
//! file1: !inc include.d/1.yaml                      # one file
//! files: !inc include.d/*.yaml                      # every match, as a list
//! deep:  !inc [include.d/**/*.yaml, 2]               # bounded recursion
//! flat:  !inc {urlpath: lists/*.yaml, flatten: true} # concatenated lists
//! web:   !inc http://localhost:8080/conf.yaml        # remote
//! opt:   !inc {urlpath: local.yaml, default: {}}     # fallback when missing
//! ```
//!
//! # Architecture Overview
//!
//! Parsing goes through `serde_yaml`, which keeps custom tags as
//! [`Value::Tagged`](serde_yaml::Value::Tagged) nodes. An [`Includer`] then
//! turns every node carrying its tag into a [`Directive`] and, with autoload
//! on, resolves it immediately:
//!
//! 1. [`path`] joins the target with the base directory and detects a URL
//!    scheme
//! 2. [`resolver`] picks one of four routes from (scheme, wildcard)
//! 3. [`params`] splits leftover parameters between listing and opening
//! 4. a [`fs::FileSystem`] backend lists and opens the files
//! 5. each file is parsed as YAML by the same includer, or by a custom
//!    format loader such as a [`readers::ReaderTable`]
//!
//! With autoload off the directives stay in the tree, can be written back
//! out with [`Includer::dump`], and are resolved later by [`walker`].
//!
//! # Core Modules
//!
//! - [`includer`] - tag configuration and the construction pass
//! - [`directive`] - the parsed form of one include tag
//! - [`resolver`] - resolution of one directive
//! - [`walker`] - resolution of directives left in a tree
//! - [`path`] - base-directory joining and scheme detection
//! - [`params`] - routing of legacy parameter shapes
//! - [`fs`] - local, HTTP and dispatching backends
//!
//! ## Supporting Modules
//! - [`readers`] - per-extension parsers for JSON, TOML, INI and text
//! - [`config`] - TOML configuration files
//! - [`cli`] - the `yaml-include` command
//! - [`core`] - error types and user-facing error reporting
//!
//! # Example
//!
//! ```rust,no_run
//! use yaml_include::{Includer, LazyWalk};
//!
//! # fn example() -> yaml_include::core::Result<()> {
//! let includer = Includer::builder().base_dir("tests/fixtures").build()?;
//! let doc = includer.load_str("files: !inc include.d/*.yaml")?;
//! println!("{}", includer.dump(&doc)?);
//!
//! let mut deferred = includer.with_autoload(false).load_str("a: !inc include.d/1.yaml")?;
//! for step in LazyWalk::new(&includer, &mut deferred, true) {
//!     println!("resolved {}", step?.location);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod directive;
pub mod fs;
pub mod includer;
pub mod params;
pub mod path;
pub mod readers;
pub mod resolver;
pub mod walker;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::core::{IncludeError, Result};
pub use directive::Directive;
pub use includer::{FormatLoader, Includer, IncluderBuilder};
pub use path::BaseDir;
pub use resolver::{Route, resolve};
pub use walker::{LazyWalk, Location, ResolvedInclude, walk, walk_in_place};
