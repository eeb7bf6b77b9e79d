// src/core/runtime.rs

//! Seams between the launcher and the components it starts.
//!
//! The launcher never knows how a component is loaded. It asks a
//! [`RuntimeProvider`] for a loader or a script runtime scoped to a search path
//! and talks to the returned handles through these traits only.

use anyhow::Result;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// A resolved, invokable entry point of the embedded server component.
pub trait EntryPoint: Debug {
    /// Runs the entry point with `argv`. `None` means the component reported no
    /// status. Errors raised by the component are returned as they are.
    fn invoke(&self, argv: &[String]) -> Result<Option<i32>>;
}

/// Resolves entry types by name within a fixed library search path.
pub trait ComponentLoader: Debug {
    fn resolve(&self, type_name: &str) -> Result<Box<dyn EntryPoint>>;
}

/// Value produced by a script runtime evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptValue {
    Nil,
    Integer(i32),
    Text(String),
}

/// An embedded script runtime instance.
pub trait ScriptRuntime: Debug {
    /// Sets the argument vector visible to the script.
    fn set_argv(&mut self, argv: &[String]);
    fn set_current_directory(&mut self, dir: &Path);
    /// Controls whether host environment variables are visible to the runtime.
    fn set_inherit_environment(&mut self, inherit: bool);
    /// Applies runtime options given on the launcher command line.
    fn process_arguments(&mut self, args: &[String]) -> Result<()>;
    /// Evaluates a short script and returns its value.
    fn run_scriptlet(&mut self, script: &str) -> Result<ScriptValue>;
    /// Runs `prelude` followed by `script` as the main program, reporting
    /// `script_name` (the script's resolved path) as its file name.
    fn run_from_main(
        &mut self,
        prelude: &str,
        script: &[u8],
        script_name: &str,
    ) -> Result<ScriptValue>;
}

/// Creates component handles scoped to a library search path.
pub trait RuntimeProvider {
    fn component_loader(&self, search_path: &[PathBuf]) -> Result<Box<dyn ComponentLoader>>;
    fn script_runtime(&self, search_path: &[PathBuf]) -> Result<Box<dyn ScriptRuntime>>;
}
