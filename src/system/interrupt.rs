// src/system/interrupt.rs

//! Interrupt tracking (Ctrl+C, and `SIGTERM` on Unix).
//!
//! Once [`install`] has run, these signals no longer terminate warboot. They raise
//! a process-wide flag instead; the executor polls it while a child runs, lets the
//! child shut down and then returns [`ExecutionError::Interrupted`], so the launch
//! unwinds normally and the work area is removed.
//!
//! [`ExecutionError::Interrupted`]: crate::system::executor::ExecutionError::Interrupted

use lazy_static::lazy_static;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use thiserror::Error;
use tokio::runtime::Builder;

lazy_static! {
    static ref INTERRUPTED: AtomicBool = AtomicBool::new(false);
}

#[derive(Error, Debug)]
pub enum InterruptError {
    #[error("Could not install the interrupt handler: {0}")]
    Install(#[from] io::Error),
}

/// Replaces the default disposition of the interrupt signals with the flag.
///
/// The listeners are registered before this returns; a background thread then
/// waits for them for the rest of the process lifetime.
pub fn install() -> Result<(), InterruptError> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    let mut listener = {
        let _context = runtime.enter();
        Listener::new()?
    };

    thread::Builder::new()
        .name("warboot-signals".to_string())
        .spawn(move || {
            while runtime.block_on(listener.recv()) {
                log::debug!("Interrupt received");
                INTERRUPTED.store(true, Ordering::SeqCst);
            }
        })?;
    Ok(())
}

/// The flag raised by the installed handler.
pub fn flag() -> &'static AtomicBool {
    &INTERRUPTED
}

/// True once an interrupt has been received.
pub fn requested() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

#[cfg(unix)]
struct Listener {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Listener {
    fn new() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Waits for the next signal. `false` once no more can arrive.
    async fn recv(&mut self) -> bool {
        tokio::select! {
            received = self.interrupt.recv() => received.is_some(),
            received = self.terminate.recv() => received.is_some(),
        }
    }
}

#[cfg(windows)]
struct Listener {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(windows)]
impl Listener {
    fn new() -> io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    async fn recv(&mut self) -> bool {
        self.ctrl_c.recv().await.is_some()
    }
}
