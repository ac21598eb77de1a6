use std::path::PathBuf;

use clap::{Parser, Subcommand};
use motiontrail::FRAME_DELAY_LIMIT;

#[derive(Parser, Debug)]
#[command(
    name = "trailfx",
    author,
    version,
    about = "Motion trail effect driver",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Drive the effect for a number of ticks and export the frame history.
    Run(RunArgs),
    /// Parse and validate a trail configuration without running it.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Trail configuration TOML file.
    #[arg(long, short, value_name = "FILE")]
    pub config: PathBuf,

    /// Directory of PNG frames fed to the effect in name order (cycled).
    /// Without it a synthetic moving square is rendered.
    #[arg(long, value_name = "DIR")]
    pub frames: Option<PathBuf>,

    /// Number of ticks to run; overrides `driver.ticks` from the config.
    #[arg(long, value_name = "N")]
    pub ticks: Option<u64>,

    /// Override the configured delay frame count (0 disables the effect).
    #[arg(long, value_name = "N", value_parser = parse_delay)]
    pub delay: Option<usize>,

    /// Write the active history slots and the final configuration here.
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,

    /// Write every shader parameter write as JSON lines, one line per tick.
    #[arg(long, value_name = "FILE")]
    pub dump_parameters: Option<PathBuf>,

    /// Ignore `driver.interval` and tick as fast as possible.
    #[arg(long)]
    pub unpaced: bool,

    /// Route frames through a headless GPU device: captures read back from a
    /// render target and parameters land in wgpu textures and uniforms.
    #[arg(long)]
    pub gpu: bool,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Trail configuration TOML file.
    #[arg(long, short, value_name = "FILE")]
    pub config: PathBuf,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_delay(value: &str) -> Result<usize, String> {
    let trimmed = value.trim();
    let delay: usize = trimmed
        .parse()
        .map_err(|_| format!("invalid delay frame count '{trimmed}'"))?;
    if delay > FRAME_DELAY_LIMIT {
        return Err(format!(
            "delay frame count {delay} exceeds the limit of {FRAME_DELAY_LIMIT}"
        ));
    }
    Ok(delay)
}
