//! Shell completion generation command.

use crate::cli::Cli;
use clap::CommandFactory;
use clap_complete::Shell;
use std::io;

/// Writes completions for `shell` to stdout.
pub fn execute(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mapx", &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_mentions_subcommands() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell] {
            let mut cmd = Cli::command();
            let mut output = Vec::new();
            clap_complete::generate(shell, &mut cmd, "mapx", &mut output);
            let script = String::from_utf8_lossy(&output);
            assert!(script.contains("export"), "no export command for {shell:?}");
        }
    }
}
