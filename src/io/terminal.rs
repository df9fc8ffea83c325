//! Raw/cooked mode control for the controlling terminal.
//!
//! [`Terminal`] is a cheap handle onto shared mode state, so the line editor,
//! the dispatcher and the signal listener can all restore the terminal.
//! Every raw-mode session ends in [`Terminal::close`], which is idempotent.

use std::io::{self, IsTerminal};
use std::os::fd::AsFd;
use std::sync::{Arc, Mutex, MutexGuard};

use nix::sys::termios::{self, SetArg, Termios};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("stdin is not a terminal")]
    NotATerminal,
    #[error("failed to switch terminal mode: {0}")]
    ModeSwitch(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalMode {
    Raw,
    Cooked,
}

/// The device whose line discipline is switched.
pub trait TtyDevice: Send {
    fn is_terminal(&self) -> bool;
    /// Records the current settings as the snapshot `restore` returns to.
    fn capture(&mut self) -> io::Result<()>;
    fn enter_raw(&mut self) -> io::Result<()>;
    fn restore(&mut self) -> io::Result<()>;
}

/// Standard input of the process, switched with termios.
#[derive(Default)]
pub struct StdinTty {
    saved: Option<Termios>,
}

impl TtyDevice for StdinTty {
    fn is_terminal(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn capture(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        self.saved = Some(termios::tcgetattr(stdin.as_fd())?);
        Ok(())
    }

    fn enter_raw(&mut self) -> io::Result<()> {
        let Some(saved) = &self.saved else {
            return Err(io::Error::other("terminal state not captured"));
        };
        let mut raw = saved.clone();
        termios::cfmakeraw(&mut raw);
        let stdin = io::stdin();
        termios::tcsetattr(stdin.as_fd(), SetArg::TCSADRAIN, &raw)?;
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        if let Some(saved) = &self.saved {
            let stdin = io::stdin();
            termios::tcsetattr(stdin.as_fd(), SetArg::TCSADRAIN, saved)?;
        }
        Ok(())
    }
}

struct ModeState {
    device: Box<dyn TtyDevice>,
    mode: TerminalMode,
    // Number of live CookedGuards; raw mode comes back when it drops to zero.
    suspended: usize,
    closed: bool,
}

#[derive(Clone)]
pub struct Terminal {
    state: Arc<Mutex<ModeState>>,
}

impl Terminal {
    /// Switches stdin to raw mode.
    pub fn open() -> Result<Self, TerminalError> {
        Self::with_device(Box::new(StdinTty::default()))
    }

    pub fn with_device(mut device: Box<dyn TtyDevice>) -> Result<Self, TerminalError> {
        if !device.is_terminal() {
            return Err(TerminalError::NotATerminal);
        }
        device.capture()?;
        device.enter_raw()?;
        tracing::debug!("terminal switched to raw mode");
        Ok(Terminal {
            state: Arc::new(Mutex::new(ModeState {
                device,
                mode: TerminalMode::Raw,
                suspended: 0,
                closed: false,
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ModeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn mode(&self) -> TerminalMode {
        self.lock().mode
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Returns to cooked mode until the guard is dropped. Guards nest: raw
    /// mode is re-entered only when the outermost one goes away.
    pub fn suspend(&self) -> Result<CookedGuard, TerminalError> {
        let mut state = self.lock();
        if !state.closed && state.suspended == 0 && state.mode == TerminalMode::Raw {
            state.device.restore()?;
            state.mode = TerminalMode::Cooked;
            tracing::debug!("terminal released to cooked mode");
        }
        state.suspended += 1;
        Ok(CookedGuard {
            terminal: self.clone(),
        })
    }

    /// Restores the snapshot taken at open. Later calls do nothing.
    pub fn close(&self) -> Result<(), TerminalError> {
        let mut state = self.lock();
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        if state.mode == TerminalMode::Raw {
            state.device.restore()?;
            state.mode = TerminalMode::Cooked;
        }
        tracing::debug!("terminal restored");
        Ok(())
    }
}

impl Drop for ModeState {
    fn drop(&mut self) {
        if !self.closed && self.mode == TerminalMode::Raw {
            let _ = self.device.restore();
        }
    }
}

/// Holds the terminal in cooked mode; see [`Terminal::suspend`].
pub struct CookedGuard {
    terminal: Terminal,
}

impl Drop for CookedGuard {
    fn drop(&mut self) {
        let mut state = self.terminal.lock();
        state.suspended = state.suspended.saturating_sub(1);
        if state.closed || state.suspended > 0 {
            return;
        }
        match state.device.enter_raw() {
            Ok(()) => {
                state.mode = TerminalMode::Raw;
                tracing::debug!("terminal re-entered raw mode");
            }
            Err(e) => tracing::warn!(error = %e, "failed to re-enter raw mode"),
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::TtyDevice;

    #[derive(Debug, Default, Clone, PartialEq, Eq)]
    pub struct Calls {
        pub captures: usize,
        pub raws: usize,
        pub restores: usize,
    }

    /// In-memory device recording every transition.
    #[derive(Clone)]
    pub struct FakeTty {
        pub tty: bool,
        pub calls: Arc<Mutex<Calls>>,
    }

    impl FakeTty {
        pub fn new() -> Self {
            FakeTty {
                tty: true,
                calls: Arc::new(Mutex::new(Calls::default())),
            }
        }

        pub fn calls(&self) -> Calls {
            self.calls.lock().unwrap().clone()
        }
    }

    impl TtyDevice for FakeTty {
        fn is_terminal(&self) -> bool {
            self.tty
        }
        fn capture(&mut self) -> io::Result<()> {
            self.calls.lock().unwrap().captures += 1;
            Ok(())
        }
        fn enter_raw(&mut self) -> io::Result<()> {
            self.calls.lock().unwrap().raws += 1;
            Ok(())
        }
        fn restore(&mut self) -> io::Result<()> {
            self.calls.lock().unwrap().restores += 1;
            Ok(())
        }
    }
}
