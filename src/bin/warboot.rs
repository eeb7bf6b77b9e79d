// EN: src/bin/warboot.rs

use anyhow::{Context, Result};
use colored::*;
use std::io;
use warboot::{
    cli::Cli,
    core::{capsule, launch_mode::LaunchArguments, launcher},
    system::{executor, interrupt, jvm::JvmProvider},
    t,
};

/// The entry point of the capsule.
///
/// Every resource of the run (work area, extracted library) is released inside
/// `run_cli`, so exiting right after it returns does not skip any cleanup.
fn main() {
    env_logger::init();

    // Ctrl+C reaches the launched component through the process group; warboot
    // itself keeps running until the component is gone and the work area removed.
    if let Err(e) = interrupt::install() {
        log::warn!("{}", e);
    }

    let exit_code = match run_cli(Cli::parse_process_args()) {
        Ok(code) => code,
        // Interrupted runs end quietly with the shell's exit code for SIGINT.
        Err(e) if executor::is_interrupted(&e) => 130,
        Err(e) => {
            eprintln!("\n{}: {:#}", t!("error.label").red().bold(), e);
            1
        }
    };
    std::process::exit(exit_code);
}

/// Resolves the launch mode before touching the capsule, then hands over to the launcher.
fn run_cli(cli: Cli) -> Result<i32> {
    log::debug!("CLI args parsed: {:?}", cli);

    let args = LaunchArguments::parse(cli.args)?;
    let capsule_path = capsule::locate().context("Could not determine the capsule location")?;
    log::debug!("Capsule: {}", capsule_path.display());

    let provider = JvmProvider::from_env()?;
    let stdout = io::stdout();
    launcher::start(&args, &capsule_path, &provider, &mut stdout.lock())
}
