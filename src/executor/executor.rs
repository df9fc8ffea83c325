use std::io;

use thiserror::Error;

use crate::ast::RedirectionPlan;
use crate::environment::Environment;
use crate::parser::RedirectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// The command ran; its status is reported but never ends the shell.
    Code(i32),
    /// `exit` was requested with this status.
    Exit(i32),
}

pub type ExecStatus = Result<ExecOutcome, ExecError>;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{0}: command not found")]
    CommandNotFound(String),
    #[error(transparent)]
    Redirect(#[from] RedirectionError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub trait Executor {
    fn exec(&mut self, plan: &RedirectionPlan, env: &mut Environment) -> ExecStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_not_found_message() {
        let err = ExecError::CommandNotFound("nosuchcmd".to_string());
        assert_eq!(err.to_string(), "nosuchcmd: command not found");
    }
}
