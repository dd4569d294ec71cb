//! Command line interface for generating a command line completion script.

use super::build;
use crate::exit_on_none;
use clap::{value_parser, Arg, ArgMatches, Command};
use clap_complete::Shell;
use std::io;

/// Creates a subcommand for generating a completion script.
pub fn create_completions_subcommand() -> Command {
    Command::new("completions")
        .about("Generate tab-completion script for your shell")
        .hide(true)
        .arg(
            Arg::new("shell")
                .value_name("SHELL")
                .required(true)
                .value_parser(value_parser!(Shell))
                .help("The shell to generate the script for"),
        )
        .after_help(
            r#"DISCUSSION
    Enable tab completion for Bash, Zsh or Fish.
    The script is output on `stdout`, allowing one to re-direct the
    output to the file of their choosing.

    BASH:

        $ mkdir -p ~/.local/share/bash-completion/completions
        $ umkit completions bash > ~/.local/share/bash-completion/completions/umkit

    ZSH:

        $ mkdir ~/.zfunc
        $ umkit completions zsh > ~/.zfunc/_umkit

    Then add `fpath+=~/.zfunc` to your `.zshrc` before `compinit`.

    FISH:

        $ mkdir -p ~/.config/fish/completions
        $ umkit completions fish > ~/.config/fish/completions/umkit.fish

    You may have to log out and log back in to your shell session for
    the changes to take effect."#,
        )
}

pub fn run_completions_subcommand(arguments: &ArgMatches) {
    let shell = *exit_on_none!(
        arguments.get_one::<Shell>("shell"),
        "Error: No value for required argument shell"
    );
    let mut command = build::build();
    clap_complete::generate(shell, &mut command, clap::crate_name!(), &mut io::stdout());
}
