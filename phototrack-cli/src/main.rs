use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{error, info};
use phototrack_cli::Cli;

fn main() -> ExitCode {
    let start = Instant::now();

    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    match phototrack_cli::run(&cli) {
        Ok(_summary) => {
            info!(
                "image processing complete taking: [{}] seconds",
                start.elapsed().as_secs()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("failed to process GPS photos: {e:#}");
            ExitCode::FAILURE
        }
    }
}
