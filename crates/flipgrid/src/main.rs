mod cli;
mod images;
mod layout;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing(cli.verbose);

    match &cli.command {
        Some(Command::Layout(args)) => run::layout(&cli, args.json),
        Some(Command::Check) => run::check(&cli),
        None => run::run(&cli),
    }
}
