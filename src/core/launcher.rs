// src/core/launcher.rs

//! Top-level launch sequence.
//!
//! The work area is created first and released through a scope guard, so it is
//! removed exactly once whether the launch succeeds or fails.

use crate::core::capsule::Capsule;
use crate::core::launch_mode::{Executable, LaunchArguments};
use crate::core::payload;
use crate::core::runtime::RuntimeProvider;
use crate::core::webserver_config::WebServerConfig;
use crate::core::work_area::WorkArea;
use crate::core::{script_launcher, server_launcher};
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// Lines printed when a capsule without a web server is started in server mode.
pub fn missing_webserver_hint() -> [&'static str; 2] {
    [
        t!("hint.missing_webserver.executable"),
        t!("hint.missing_webserver.package"),
    ]
}

/// Runs the capsule at `capsule_path` and returns the process exit code.
///
/// User-facing hints are written to `out`.
pub fn start(
    args: &LaunchArguments,
    capsule_path: &Path,
    provider: &dyn RuntimeProvider,
    out: &mut dyn Write,
) -> Result<i32> {
    start_in(&tempfile::env::temp_dir(), args, capsule_path, provider, out)
}

/// [`start`] with the work area created under `scratch_base`.
pub fn start_in(
    scratch_base: &Path,
    args: &LaunchArguments,
    capsule_path: &Path,
    provider: &dyn RuntimeProvider,
    out: &mut dyn Write,
) -> Result<i32> {
    let area = WorkArea::create_in(scratch_base, capsule_path)?;
    let work_area = scopeguard::guard(area, |mut area| {
        if let Err(e) = area.remove() {
            log::warn!("{} {}", t!("cleanup.warn.failed"), e);
        }
    });
    let mut capsule = Capsule::open(capsule_path)?;

    match &args.executable {
        None => run_server(&mut capsule, &work_area, args, provider, out),
        Some(executable) => run_executable(&mut capsule, &work_area, args, executable, provider),
    }
}

fn run_server(
    capsule: &mut Capsule,
    work_area: &WorkArea,
    args: &LaunchArguments,
    provider: &dyn RuntimeProvider,
    out: &mut dyn Write,
) -> Result<i32> {
    let webserver_jar = match payload::extract_webserver(capsule) {
        Ok(jar) => jar,
        Err(e) => {
            if e.is_missing_webserver() {
                print_hint(out);
            }
            return Err(e.into());
        }
    };

    let warfile = capsule.path().to_string_lossy().into_owned();
    let config = WebServerConfig::load_for_launch(capsule, &warfile, &work_area.root_display());

    let loader = provider.component_loader(&[webserver_jar.path().to_path_buf()])?;
    server_launcher::launch_web_server(loader.as_ref(), &config, &args.launcher_args)
}

fn run_executable(
    capsule: &mut Capsule,
    work_area: &WorkArea,
    args: &LaunchArguments,
    executable: &Executable,
    provider: &dyn RuntimeProvider,
) -> Result<i32> {
    let search_path = payload::extract_all(capsule, work_area.root())?;
    let mut runtime = provider.script_runtime(&search_path)?;
    script_launcher::launch_executable(
        runtime.as_mut(),
        work_area.root(),
        &args.launcher_args,
        executable,
    )
}

fn print_hint(out: &mut dyn Write) {
    for line in missing_webserver_hint() {
        if let Err(e) = writeln!(out, "{}", line) {
            log::debug!("Could not print hint: {}", e);
        }
    }
}
