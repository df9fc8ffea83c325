use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use crate::io::terminal::Terminal;

/// Set while a child process owns the terminal.
#[derive(Debug, Clone, Default)]
pub struct ForegroundFlag(Arc<AtomicBool>);

impl ForegroundFlag {
    pub fn enter(&self) -> ForegroundGuard<'_> {
        self.0.store(true, Ordering::SeqCst);
        ForegroundGuard(&self.0)
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct ForegroundGuard<'a>(&'a AtomicBool);

impl Drop for ForegroundGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Leave it to the foreground child.
    Ignore,
    /// Restore the terminal and exit with this status.
    Terminate(i32),
}

pub fn action_for(signal: i32, foreground: &ForegroundFlag) -> SignalAction {
    if signal == SIGINT && foreground.is_active() {
        SignalAction::Ignore
    } else {
        SignalAction::Terminate(128 + signal)
    }
}

/// Spawns the thread that turns SIGINT, SIGTERM and SIGHUP into a clean exit.
pub fn spawn_listener(terminal: Terminal, foreground: ForegroundFlag) -> io::Result<JoinHandle<()>> {
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;
    thread::Builder::new()
        .name("signal-listener".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                match action_for(signal, &foreground) {
                    SignalAction::Ignore => {
                        tracing::debug!(signal, "signal left to foreground child");
                    }
                    SignalAction::Terminate(status) => {
                        tracing::debug!(signal, "terminating on signal");
                        if let Err(e) = terminal.close() {
                            tracing::warn!(error = %e, "failed to restore terminal");
                        }
                        std::process::exit(status);
                    }
                }
            }
        })
}
