pub mod editor;
pub mod keys;
pub mod terminal;

pub use editor::{LineEditor, ReadlineError};
pub use terminal::{CookedGuard, Terminal, TerminalError, TerminalMode};
