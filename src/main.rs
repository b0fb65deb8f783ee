//! Atelier Portal host.
//!
//! Opens a window, translates window events into scene input and drives the
//! scene director once per display refresh.

mod app;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "atelier-portal", about = "Shattered-mirror workshop portal")]
struct Args {
    /// Experience config (JSON). Built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Workshop gallery content (JSON). Overrides the config's content path.
    #[arg(long)]
    content: Option<PathBuf>,

    /// Seed for the auto-select picker.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let settings =
        match app::Settings::load(args.config.as_deref(), args.content.as_deref(), args.seed) {
            Ok(settings) => settings,
            Err(err) => {
                log::error!("{}", err);
                return ExitCode::FAILURE;
            }
        };

    match app::run(settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
