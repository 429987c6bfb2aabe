//! # Shell Completion Module
//!
//! ```bash
//! moodcast completion bash > ~/.local/share/bash-completion/completions/moodcast
//! moodcast completion zsh > ~/.config/zsh/completions/_moodcast
//! ```

use clap::Command;
use clap_complete::{generate, Generator};
use std::io::{self, Write};

/// Generate shell completions for the given shell into `out`.
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(gen, cmd, name, out);
}

/// Generate shell completions for the given shell on stdout.
pub fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate_completions(gen, cmd, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::CommandFactory;
    use clap_complete::Shell;

    #[test]
    fn test_bash_completion_mentions_subcommands() {
        let mut out = Vec::new();
        generate_completions(Shell::Bash, &mut Args::command(), &mut out);
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("moodcast"));
        assert!(script.contains("now-playing"));
        assert!(script.contains("--songs-dir"));
    }
}
