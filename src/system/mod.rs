//! # System Interaction Layer
//!
//! Boundary between the launch logic and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: Spawns child processes, either attached to the terminal or with
//!   captured output, with optional environment isolation. Waits are
//!   interruptible.
//! - **`interrupt`**: Turns Ctrl+C (and `SIGTERM`) into a flag the executor polls.
//! - **`jvm`**: JVM-backed implementations of the runtime seams: the web server's
//!   `main` entry point and the JRuby script runtime.

pub mod executor;
pub mod interrupt;
pub mod jvm;
