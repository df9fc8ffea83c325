use std::io::{self, Read, Write};

use crate::environment::Environment;
use crate::error::ShellError;
use crate::executor::{ExecOutcome, Executor};
use crate::io::{LineEditor, ReadlineError};
use crate::lexer::tokenize;
use crate::parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

pub struct Shell<R, W, E> {
    editor: LineEditor<R, W>,
    env: Environment,
    executor: E,
}

impl<R: Read, W: Write, E: Executor> Shell<R, W, E> {
    pub fn new(editor: LineEditor<R, W>, env: Environment, executor: E) -> Self {
        Shell {
            editor,
            env,
            executor,
        }
    }

    pub fn editor(&self) -> &LineEditor<R, W> {
        &self.editor
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Reads and runs lines until `exit` or end of input; returns the exit status.
    pub fn run(&mut self) -> Result<i32, ShellError> {
        loop {
            let line = match self.editor.read_line() {
                Ok(line) => line,
                Err(ReadlineError::Eof) => return Ok(0),
                Err(e) => return Err(e.into()),
            };

            match self.evaluate(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit(code)) => return Ok(code),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => self.report(&e)?,
            }
        }
    }

    /// Tokenizes, resolves and dispatches one line. The terminal is held in
    /// cooked mode for the whole dispatch.
    pub fn evaluate(&mut self, line: &str) -> Result<Flow, ShellError> {
        let tokens = tokenize(line)?;
        if tokens.is_empty() {
            return Ok(Flow::Continue);
        }
        let plan = parser::resolve(tokens)?;

        let _cooked = self.editor.terminal().suspend()?;
        match self.executor.exec(&plan, &mut self.env)? {
            ExecOutcome::Code(code) => {
                tracing::debug!(code, "command finished");
                Ok(Flow::Continue)
            }
            ExecOutcome::Exit(code) => Ok(Flow::Exit(code)),
        }
    }

    fn report(&self, err: &ShellError) -> Result<(), ShellError> {
        let _cooked = self.editor.terminal().suspend()?;
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "{}", err)?;
        stderr.flush()?;
        Ok(())
    }

    /// Saves history and restores the terminal. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.editor.history().save() {
            tracing::warn!(error = %e, "failed to save history");
        }
        if let Err(e) = self.editor.terminal().close() {
            tracing::warn!(error = %e, "failed to restore terminal");
        }
    }
}
