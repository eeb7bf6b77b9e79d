// src/core/script_launcher.rs

//! Runs a named executable (`-S rake db:migrate`) inside the embedded script
//! runtime.
//!
//! The resolved executable is assumed to be a text script: it runs right after the
//! environment prefix, under its own path. A binary executable would be fed to the
//! runtime the same way, with undefined results.

use crate::core::launch_mode::Executable;
use crate::core::runtime::{ScriptRuntime, ScriptValue};
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("failed to locate executable: '{0}'")]
    ExecutableNotFound(String),
    #[error("could not read executable '{path}': {source}")]
    UnreadableExecutable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Ruby string literal for a path, single-quoted.
fn quote(path: &Path) -> String {
    let raw = dunce::simplified(path).to_string_lossy().into_owned();
    format!("'{}'", raw.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Script that confines the package manager to the work area.
pub fn env_prefix(root: &Path) -> String {
    let gems_dir = root.join("gems");
    let gemfile = root.join("Gemfile");
    log::debug!("setting GEM_HOME to {}", gems_dir.display());
    log::debug!("... and BUNDLE_GEMFILE to {}", gemfile.display());
    format!(
        "ENV['GEM_HOME'] = ENV['GEM_PATH'] = {} \n\
         ENV['BUNDLE_GEMFILE'] = {} \n\
         ENV['BUNDLE_WITHOUT'] = 'assets:development:test' \n",
        quote(&gems_dir),
        quote(&gemfile)
    )
}

/// Bootstrap script returning the full path of the gem executable `name`, or nil.
///
/// Bundler is optional: without it the installed gem specifications are searched
/// directly.
pub fn locate_executable_script(root: &Path, name: &str) -> String {
    let exec = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "{prefix}\
         begin\n\
         \x20 require 'META-INF/init.rb' \n\
         \x20 require 'rubygems' \n\
         \x20 begin\n\
         \x20   require 'bundler' \n\
         \x20   Bundler.setup(:default, ENV.values_at('RACK_ENV', 'RAILS_ENV').compact)\n\
         \x20 rescue LoadError\n\
         \x20 end\n\
         \x20 exec = '{exec}' \n\
         \x20 spec = Gem::Specification.find {{ |s| s.executables.include?(exec) }} \n\
         \x20 spec ? spec.bin_file(exec) : nil \n\
         rescue SystemExit => e\n\
         \x20 e.status\n\
         end",
        prefix = env_prefix(root),
    )
}

/// Finds the executable: a file of that name at the top of the work area wins,
/// otherwise the runtime is asked to search the installed gems.
pub fn locate_executable(
    runtime: &mut dyn ScriptRuntime,
    root: &Path,
    name: &str,
) -> Result<Option<PathBuf>> {
    let on_disk = root.join(name);
    if on_disk.exists() {
        return Ok(Some(std::path::absolute(&on_disk)?));
    }

    let located = runtime.run_scriptlet(&locate_executable_script(root, name))?;
    Ok(match located {
        ScriptValue::Text(path) if !path.is_empty() => Some(PathBuf::from(path)),
        ScriptValue::Integer(status) => {
            log::debug!("Executable lookup exited with status {}", status);
            None
        }
        _ => None,
    })
}

/// Maps the runtime's result to a process exit code.
pub fn exit_code(outcome: &ScriptValue) -> i32 {
    match outcome {
        ScriptValue::Integer(code) => *code,
        _ => 0,
    }
}

/// Configures `runtime`, resolves `executable` and runs it.
pub fn launch_executable(
    runtime: &mut dyn ScriptRuntime,
    root: &Path,
    runtime_options: &[String],
    executable: &Executable,
) -> Result<i32> {
    runtime.set_argv(&executable.argv);
    runtime.set_current_directory(root);
    runtime.set_inherit_environment(false);

    let path = locate_executable(runtime, root, &executable.name)?
        .ok_or_else(|| LaunchError::ExecutableNotFound(executable.name.clone()))?;

    runtime.process_arguments(runtime_options)?;

    let script = fs::read(&path).map_err(|e| LaunchError::UnreadableExecutable {
        path: path.display().to_string(),
        source: e,
    })?;

    let script_name = path.to_string_lossy();
    log::debug!("invoking {} with: {:?}", script_name, executable.argv);
    let outcome = runtime.run_from_main(&env_prefix(root), &script, &script_name)?;
    Ok(exit_code(&outcome))
}
