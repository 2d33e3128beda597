//! # Completions Command Implementation
//!
//! Prints a shell completion script for `theme-overlay` to stdout.
//!
//! ```bash
//! theme-overlay completions bash > ~/.local/share/bash-completion/completions/theme-overlay
//! theme-overlay completions zsh > ~/.zfunc/_theme-overlay
//! ```

use std::io::{self, Write};

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

/// Arguments for the completions command
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute the completions command
pub fn execute(args: CompletionsArgs) -> Result<()> {
    write_script(args.shell, &mut io::stdout().lock());
    Ok(())
}

fn write_script(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
}
