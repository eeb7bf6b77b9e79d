// EN: src/system/executor.rs

use crate::system::interrupt;
use std::env;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// How long an interrupted child may take to shut down before it is killed.
const INTERRUPT_GRACE: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Command '{0}' exited with a non-zero error code.")]
    NonZeroExitStatus(String),
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("Command '{0}' was interrupted.")]
    Interrupted(String),
}

/// A fully described child process.
#[derive(Debug, Clone, Default)]
pub struct ProcessSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    /// When false the child starts from an empty environment.
    pub inherit_env: bool,
}

impl ProcessSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            inherit_env: true,
            ..Default::default()
        }
    }

    pub fn arg(&mut self, arg: impl Into<OsString>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Human readable rendering used in logs and errors.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command(&self) -> StdCommand {
        let mut command = StdCommand::new(&self.program);
        command.args(&self.args);
        if let Some(cwd) = &self.cwd {
            command.current_dir(dunce::simplified(cwd));
        }
        if !self.inherit_env {
            command.env_clear();
        }
        command
    }
}

/// Runs a process to completion with the terminal attached and returns its exit
/// code. `None` means the process ended without one (e.g. killed by a signal).
///
/// An interrupt received meanwhile turns the outcome into
/// [`ExecutionError::Interrupted`] once the child is gone.
pub fn execute(spec: &ProcessSpec) -> Result<Option<i32>, ExecutionError> {
    execute_until(spec, interrupt::flag(), INTERRUPT_GRACE)
}

/// [`execute`] against an explicit interrupt flag. After the flag is raised the
/// child gets `grace` to exit on its own before it is killed.
pub(crate) fn execute_until(
    spec: &ProcessSpec,
    interrupted: &AtomicBool,
    grace: Duration,
) -> Result<Option<i32>, ExecutionError> {
    if interrupted.load(Ordering::SeqCst) {
        return Err(ExecutionError::Interrupted(spec.display()));
    }

    log::debug!("Executing: {}", spec.display());
    let mut child = spec
        .command()
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| ExecutionError::CommandFailed(spec.display(), e))?;

    let mut interrupted_at: Option<Instant> = None;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if interrupted_at.is_some() || interrupted.load(Ordering::SeqCst) {
                    return Err(ExecutionError::Interrupted(spec.display()));
                }
                if !status.success() {
                    log::debug!("'{}' exited with {:?}", spec.display(), status.code());
                }
                return Ok(status.code());
            }
            Ok(None) => {
                match interrupted_at {
                    None if interrupted.load(Ordering::SeqCst) => {
                        log::debug!("Interrupted, waiting for child (PID: {}) to exit...", child.id());
                        interrupted_at = Some(Instant::now());
                    }
                    Some(since) if since.elapsed() >= grace => {
                        log::debug!("Killing child process (PID: {})...", child.id());
                        if let Err(e) = child.kill() {
                            log::warn!("Failed to kill child process {}: {}", child.id(), e);
                        }
                        child.wait().ok();
                        return Err(ExecutionError::Interrupted(spec.display()));
                    }
                    _ => {}
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => return Err(ExecutionError::CommandFailed(spec.display(), e)),
        }
    }
}

/// Runs a process and captures its standard output.
/// Stderr is passed through to the user's terminal.
pub fn execute_and_capture_output(spec: &ProcessSpec) -> Result<String, ExecutionError> {
    log::debug!("Capturing output of: {}", spec.display());
    let output = spec
        .command()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|e| ExecutionError::CommandFailed(spec.display(), e))?;

    if interrupt::requested() {
        return Err(ExecutionError::Interrupted(spec.display()));
    }
    if !output.status.success() {
        return Err(ExecutionError::NonZeroExitStatus(spec.display()));
    }

    String::from_utf8(output.stdout).map_err(|e| ExecutionError::InvalidUtf8Output {
        command: spec.display(),
        source: e,
    })
}

/// Writes `content` to a temporary file in `dir` whose name ends with `file_name`.
pub fn write_temp_script(
    dir: &Path,
    file_name: &str,
    content: &[u8],
) -> std::io::Result<tempfile::TempPath> {
    let mut file = tempfile::Builder::new()
        .prefix(".warboot-")
        .suffix(&format!("-{}", file_name))
        .tempfile_in(dir)?;
    file.write_all(content)?;
    file.flush()?;
    Ok(file.into_temp_path())
}

/// True when `error` was caused by an interrupted child process.
pub fn is_interrupted(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<ExecutionError>(),
            Some(ExecutionError::Interrupted(_))
        )
    })
}

/// Looks `executable_name` up in the directories listed in `PATH`.
pub fn find_in_path(executable_name: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(executable_name))
        .find(|candidate| candidate.is_file())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_execute_reports_exit_code() {
        let mut spec = ProcessSpec::new("sh");
        spec.args(["-c", "exit 4"]);
        assert_eq!(execute(&spec).unwrap(), Some(4));
    }

    #[test]
    fn test_capture_with_cleared_environment() {
        let mut spec = ProcessSpec::new("/bin/sh");
        spec.args(["-c", "printf '%s' \"${WARBOOT_TEST_VAR:-unset}\""]);
        spec.inherit_env = false;
        assert_eq!(execute_and_capture_output(&spec).unwrap(), "unset");

        let mut spec = ProcessSpec::new("/bin/sh");
        spec.args(["-c", "printf '%s' \"${HOME:-unset}\""]);
        spec.inherit_env = false;
        assert_eq!(execute_and_capture_output(&spec).unwrap(), "unset");
    }

    #[test]
    fn test_capture_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut spec = ProcessSpec::new("/bin/sh");
        spec.args(["-c", "pwd"]);
        spec.cwd = Some(dir.path().to_path_buf());
        let output = execute_and_capture_output(&spec).unwrap();
        assert_eq!(
            std::fs::canonicalize(output.trim()).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[test]
    fn test_capture_non_zero_exit() {
        let mut spec = ProcessSpec::new("sh");
        spec.args(["-c", "exit 1"]);
        assert!(matches!(
            execute_and_capture_output(&spec),
            Err(ExecutionError::NonZeroExitStatus(_))
        ));
    }

    #[test]
    fn test_missing_program() {
        let spec = ProcessSpec::new("warboot-no-such-program");
        assert!(matches!(execute(&spec), Err(ExecutionError::CommandFailed(..))));
    }

    #[test]
    fn test_interrupt_before_start_skips_the_child() {
        let mut spec = ProcessSpec::new("sh");
        spec.args(["-c", "exit 0"]);
        let interrupted = AtomicBool::new(true);
        assert!(matches!(
            execute_until(&spec, &interrupted, Duration::ZERO),
            Err(ExecutionError::Interrupted(_))
        ));
    }

    #[test]
    fn test_interrupted_child_may_exit_on_its_own() {
        let mut spec = ProcessSpec::new("sh");
        spec.args(["-c", "sleep 1; exit 0"]);
        let interrupted = AtomicBool::new(false);

        let started = Instant::now();
        let outcome = thread::scope(|scope| {
            scope.spawn(|| {
                thread::sleep(Duration::from_millis(200));
                interrupted.store(true, Ordering::SeqCst);
            });
            execute_until(&spec, &interrupted, Duration::from_secs(30))
        });

        assert!(matches!(outcome, Err(ExecutionError::Interrupted(_))));
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn test_interrupted_child_is_killed_after_grace() {
        let mut spec = ProcessSpec::new("sh");
        spec.args(["-c", "sleep 30"]);
        let interrupted = AtomicBool::new(false);

        let started = Instant::now();
        let outcome = thread::scope(|scope| {
            scope.spawn(|| {
                thread::sleep(Duration::from_millis(200));
                interrupted.store(true, Ordering::SeqCst);
            });
            execute_until(&spec, &interrupted, Duration::ZERO)
        });

        assert!(matches!(outcome, Err(ExecutionError::Interrupted(_))));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_is_interrupted_looks_through_context() {
        use anyhow::Context;
        let err = Err::<(), _>(ExecutionError::Interrupted("java".to_string()))
            .context("Web server stopped")
            .unwrap_err();
        assert!(is_interrupted(&err));
        assert!(!is_interrupted(&anyhow::anyhow!("server crashed")));
    }

    #[test]
    fn test_find_in_path() {
        assert!(find_in_path("sh").is_some());
        assert!(find_in_path("warboot-no-such-program").is_none());
    }

    #[test]
    fn test_write_temp_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_script(dir.path(), "rake", b"puts 1\n").unwrap();
        assert!(path.to_string_lossy().ends_with("-rake"));
        assert_eq!(std::fs::read(&path).unwrap(), b"puts 1\n");
    }
}
