// src/core/launch_mode.rs

use crate::constants::EXECUTABLE_SWITCH;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("missing executable after -S")]
    MissingExecutable,
}

/// An executable requested with `-S`, together with its own arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executable {
    pub name: String,
    pub argv: Vec<String>,
}

/// The launcher's view of the command line.
///
/// In server mode `launcher_args` is the whole raw sequence (it is forwarded to
/// the server). In executable mode it holds the tokens before `-S`, which are
/// applied as script runtime options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchArguments {
    pub raw: Vec<String>,
    pub launcher_args: Vec<String>,
    pub executable: Option<Executable>,
}

impl LaunchArguments {
    /// Splits the raw argument sequence at the first `-S`.
    ///
    /// # Errors
    /// Returns `ArgumentError::MissingExecutable` if `-S` is the last token or is
    /// followed by an empty string.
    pub fn parse(raw: Vec<String>) -> Result<Self, ArgumentError> {
        let Some(switch_index) = raw.iter().position(|arg| arg == EXECUTABLE_SWITCH) else {
            return Ok(Self {
                launcher_args: raw.clone(),
                raw,
                executable: None,
            });
        };

        let mut after_switch = raw.iter().skip(switch_index + 1);
        let name = match after_switch.next() {
            Some(name) if !name.is_empty() => name.clone(),
            _ => return Err(ArgumentError::MissingExecutable),
        };
        let argv: Vec<String> = after_switch.cloned().collect();
        let launcher_args: Vec<String> = raw.iter().take(switch_index).cloned().collect();

        Ok(Self {
            raw,
            launcher_args,
            executable: Some(Executable { name, argv }),
        })
    }

    /// True when the embedded web server should be started.
    pub fn is_server_mode(&self) -> bool {
        self.executable.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_parse_executable_mode() {
        let parsed = LaunchArguments::parse(args(&["--1.9", "-S", "rake", "db:migrate"])).unwrap();
        assert_eq!(parsed.launcher_args, args(&["--1.9"]));
        let exe = parsed.executable.unwrap();
        assert_eq!(exe.name, "rake");
        assert_eq!(exe.argv, args(&["db:migrate"]));
    }

    #[test]
    fn test_parse_server_mode_keeps_all_arguments() {
        let parsed = LaunchArguments::parse(args(&["--port", "8080"])).unwrap();
        assert!(parsed.is_server_mode());
        assert_eq!(parsed.launcher_args, args(&["--port", "8080"]));
        assert_eq!(parsed.raw, parsed.launcher_args);
    }

    #[test]
    fn test_parse_empty_arguments() {
        let parsed = LaunchArguments::parse(Vec::new()).unwrap();
        assert!(parsed.is_server_mode());
        assert!(parsed.launcher_args.is_empty());
    }

    #[test]
    fn test_switch_without_executable_fails() {
        assert_eq!(
            LaunchArguments::parse(args(&["-S"])),
            Err(ArgumentError::MissingExecutable)
        );
        assert_eq!(
            LaunchArguments::parse(args(&["--debug", "-S", ""])),
            Err(ArgumentError::MissingExecutable)
        );
    }

    #[test]
    fn test_only_first_switch_splits() {
        let parsed = LaunchArguments::parse(args(&["-S", "gem", "-S", "x"])).unwrap();
        assert!(parsed.launcher_args.is_empty());
        let exe = parsed.executable.unwrap();
        assert_eq!(exe.name, "gem");
        assert_eq!(exe.argv, args(&["-S", "x"]));
    }

    #[test]
    fn test_executable_without_arguments() {
        let parsed = LaunchArguments::parse(args(&["-S", "irb"])).unwrap();
        let exe = parsed.executable.unwrap();
        assert_eq!(exe.name, "irb");
        assert!(exe.argv.is_empty());
    }
}
