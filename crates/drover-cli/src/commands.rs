use anyhow::Result;
use clap::Parser;

mod serve;

/// The command to run.
#[derive(Parser, Debug)]
pub(crate) enum Command {
    Serve(serve::Args),
}

pub(crate) fn run(command: Command) -> Result<()> {
    match command {
        Command::Serve(config) => serve::serve(config),
    }
}
