// src/cli.rs

use clap::Parser;
use std::ffi::OsString;
use std::iter;

/// warboot: runs the application packaged in this capsule.
///
/// Without `-S` the embedded web server is started and every argument is
/// forwarded to it. With `-S <executable>` the named executable runs inside the
/// embedded script runtime; arguments before `-S` are runtime options and the
/// ones after the executable are its own arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
// Every token belongs to the launched component, including `--help`.
#[command(disable_help_flag = true, disable_version_flag = true)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// The raw argument sequence, interpreted by the launch mode resolver.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Parses the arguments of the current process.
    pub fn parse_process_args() -> Self {
        Self::parse_tokens(std::env::args_os())
    }

    /// Parses `tokens` (program name first) keeping every user token verbatim.
    ///
    /// An escape `--` is inserted after the program name, so clap stops
    /// interpreting and a `--` given by the user reaches the launcher as a value.
    pub fn parse_tokens<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut tokens = tokens.into_iter().map(Into::into);
        let program = tokens.next().unwrap_or_else(|| OsString::from("warboot"));
        Self::parse_from(
            iter::once(program)
                .chain(iter::once(OsString::from("--")))
                .chain(tokens),
        )
    }
}
