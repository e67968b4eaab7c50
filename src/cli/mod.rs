//! Command-line interface for yaml-include.
//!
//! The `yaml-include` binary loads one YAML document, resolves its include
//! tags and prints the result:
//!
//! ```bash
//! yaml-include app.yaml                     # resolve and print as YAML
//! yaml-include app.yaml --format json       # print as JSON
//! yaml-include app.yaml --no-autoload       # keep includes as tags
//! yaml-include app.yaml --readers           # parse .json/.toml/.ini/.txt by extension
//! cat app.yaml | yaml-include - -b conf/    # read stdin, resolve against conf/
//! ```
//!
//! Relative include targets are resolved against the input file's directory
//! unless `--base-dir` or the configuration file says otherwise.
//!
//! # Configuration
//!
//! `--config` (or `YAML_INCLUDE_CONFIG`) names a TOML file read by
//! [`IncludeConfig`]; command-line flags take precedence over it.
//!
//! # Logging
//!
//! Diagnostics go to stderr through `tracing`. `RUST_LOG` takes precedence
//! over `--verbose` and `--quiet`.

use crate::config::{IncludeConfig, ReadersConfig};
use crate::constants::CONFIG_ENV_VAR;
use crate::includer::Includer;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Output encodings for the resolved document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// YAML; deferred includes are written as tags
    #[default]
    Yaml,
    /// Pretty-printed JSON
    Json,
}

/// Load a YAML document and resolve its include tags.
#[derive(Debug, Parser)]
#[command(
    name = "yaml-include",
    about = "Resolve !inc tags in YAML documents",
    version,
    long_about = "Loads a YAML document, replaces every include tag with the content of the \
                  files or URLs it names, and prints the result."
)]
pub struct Cli {
    /// YAML file to load, or `-` for stdin
    pub file: PathBuf,

    /// Directory relative include targets are resolved against
    #[arg(short, long, value_name = "DIR")]
    pub base_dir: Option<String>,

    /// Include tag name, without the leading `!`
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Leave include tags unresolved
    #[arg(long)]
    pub no_autoload: bool,

    /// Pick a parser for each included file by its extension
    #[arg(long)]
    pub readers: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Configuration file
    #[arg(short, long, env = CONFIG_ENV_VAR, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Run the command, printing the resolved document to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration, the input or any include
    /// cannot be loaded.
    pub fn execute(self) -> Result<()> {
        self.init_logging();
        let output = self.render()?;
        print!("{output}");
        Ok(())
    }

    /// Load, resolve and serialise the input document.
    ///
    /// # Errors
    ///
    /// See [`Cli::execute`].
    pub fn render(&self) -> Result<String> {
        let includer = self.build_includer()?;
        debug!("Using {:?}", includer);

        let value = if self.reads_stdin() {
            includer.load_reader(std::io::stdin().lock()).context("Failed to load stdin")?
        } else {
            includer
                .load_path(&self.file)
                .with_context(|| format!("Failed to load {}", self.file.display()))?
        };

        match self.format {
            OutputFormat::Yaml => Ok(includer.dump(&value)?),
            OutputFormat::Json => {
                let mut json = serde_json::to_string_pretty(&value)
                    .context("Document cannot be represented as JSON")?;
                json.push('\n');
                Ok(json)
            }
        }
    }

    /// Merge the configuration file, command-line flags and the default base
    /// directory into an [`Includer`].
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration file cannot be read or holds
    /// invalid settings.
    pub fn build_includer(&self) -> Result<Includer> {
        let file_config = match &self.config {
            Some(path) => IncludeConfig::load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
            None => IncludeConfig::default(),
        };

        let mut config = file_config.merge(self.flag_config());
        if config.base_dir.is_none() {
            config.base_dir = self.default_base_dir();
        }
        Ok(config.into_builder()?.build()?)
    }

    /// The settings given as flags.
    fn flag_config(&self) -> IncludeConfig {
        IncludeConfig {
            tag: self.tag.clone(),
            base_dir: self.base_dir.clone(),
            autoload: self.no_autoload.then_some(false),
            readers: ReadersConfig {
                enabled: self.readers,
                rules: Vec::new(),
            },
            ..IncludeConfig::default()
        }
    }

    /// The input file's directory, when it has a non-empty one.
    fn default_base_dir(&self) -> Option<String> {
        if self.reads_stdin() {
            return None;
        }
        self.file
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_string_lossy)
            .map(|parent| parent.into_owned())
    }

    fn reads_stdin(&self) -> bool {
        self.file.as_os_str() == "-"
    }

    fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if self.verbose {
            EnvFilter::new("yaml_include=debug")
        } else if self.quiet {
            EnvFilter::new("off")
        } else {
            EnvFilter::new("yaml_include=warn")
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}
