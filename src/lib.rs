//! # warboot
//!
//! Bootstrap launcher for self-executing web application capsules. The capsule is a
//! zip archive (usually this binary with the archive appended) carrying a web
//! server library, its configuration and the application itself.
//!
//! - **Server mode** (`warboot [args...]`): extracts the web server library, loads
//!   `webserver.properties` and starts the configured entry point.
//! - **Executable mode** (`warboot [opts...] -S <exe> [args...]`): extracts the whole
//!   capsule and runs `<exe>` inside the embedded script runtime.

include!(concat!(env!("OUT_DIR"), "/translations.rs"));

pub mod cli;
pub mod constants;
pub mod core;
pub mod system;
