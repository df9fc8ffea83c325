use thiserror::Error;

use crate::config::ConfigError;
use crate::executor::ExecError;
use crate::io::{ReadlineError, TerminalError};
use crate::parser::ParseError;

/// Everything the read-parse-dispatch loop can run into.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Terminal(#[from] TerminalError),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShellError {
    /// Fatal errors end the session; the rest only abort the current line.
    pub fn is_fatal(&self) -> bool {
        match self {
            ShellError::Terminal(_) => true,
            ShellError::Readline(ReadlineError::Eof) => false,
            ShellError::Readline(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality() {
        assert!(!ShellError::from(ParseError::TrailingEscape).is_fatal());
        assert!(!ShellError::from(ExecError::CommandNotFound("x".into())).is_fatal());
        assert!(ShellError::from(TerminalError::NotATerminal).is_fatal());
    }

    #[test]
    fn test_messages_pass_through() {
        let err = ShellError::from(ExecError::CommandNotFound("foo".into()));
        assert_eq!(err.to_string(), "foo: command not found");
    }
}
