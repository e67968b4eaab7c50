//! yaml-include CLI entry point
//!
//! Loads a YAML document, resolves its include tags and prints the result.

use anyhow::Result;
use clap::Parser;
use yaml_include::cli;
use yaml_include::core::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
