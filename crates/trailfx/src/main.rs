mod cli;
mod export;
#[cfg(feature = "gpu")]
mod gpu;
mod run;
mod source;
#[cfg(any(feature = "gpu", test))]
mod tee;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Command::Run(args) => run::run(args),
        Command::Check(args) => run::check(args),
    }
}
