//! Shell completions for `netdeck`.

use std::io::{self, Write};

use clap::CommandFactory as _;
use clap_complete::{Generator, Shell};

use crate::cli::Cli;

pub fn generate_completions(shell: Shell) {
    let mut stdout = io::stdout();
    write_completions(shell, &mut stdout);
    stdout.flush().ok();
}

fn write_completions<G: Generator>(generator: G, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_owned();
    clap_complete::generate(generator, &mut cmd, bin_name, out);
}
