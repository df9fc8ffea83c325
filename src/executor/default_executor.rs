use std::fs::File;
use std::io::{self, Write};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Command, Stdio};
use std::rc::Rc;

use super::builtins::{BuiltinIo, BuiltinManager};
use super::executor::{ExecError, ExecOutcome, ExecStatus, Executor};
use super::path_resolver::PathResolver;
use crate::ast::RedirectionPlan;
use crate::environment::Environment;
use crate::parser::{self, OpenRedirections};
use crate::signals::ForegroundFlag;

/// Runs builtins in-process and everything else as a child process.
pub struct DefaultExecutor {
    builtins: BuiltinManager,
    resolver: PathResolver,
    foreground: ForegroundFlag,
}

impl Executor for DefaultExecutor {
    fn exec(&mut self, plan: &RedirectionPlan, env: &mut Environment) -> ExecStatus {
        let Some(name) = plan.name() else {
            return Ok(ExecOutcome::Code(0));
        };
        // Handles live exactly as long as this call.
        let redirections = parser::open(&plan.directives)?;

        if self.builtins.is_builtin(name) {
            tracing::debug!(name, "dispatching builtin");
            self.exec_builtin(name, plan.arguments(), env, &redirections)
        } else {
            self.exec_external(name, plan.arguments(), env, &redirections)
        }
    }
}

impl DefaultExecutor {
    pub fn new(foreground: ForegroundFlag) -> Self {
        DefaultExecutor {
            builtins: BuiltinManager::new(),
            resolver: PathResolver,
            foreground,
        }
    }

    fn exec_builtin(
        &mut self,
        name: &str,
        args: &[String],
        env: &mut Environment,
        redirections: &OpenRedirections,
    ) -> ExecStatus {
        let mut out = writer(&redirections.stdout, || Box::new(io::stdout().lock()));
        let mut err = writer(&redirections.stderr, || Box::new(io::stderr().lock()));

        let status = {
            let mut io = BuiltinIo {
                out: &mut out,
                err: &mut err,
            };
            self.builtins
                .execute(name, args, env, &mut io)
                .unwrap_or_else(|| Err(ExecError::CommandNotFound(name.to_string())))
        };
        out.flush()?;
        err.flush()?;
        status
    }

    fn exec_external(
        &mut self,
        name: &str,
        args: &[String],
        env: &mut Environment,
        redirections: &OpenRedirections,
    ) -> ExecStatus {
        let path = self
            .resolver
            .resolve(name, env.search_path())
            .ok_or_else(|| ExecError::CommandNotFound(name.to_string()))?;
        tracing::debug!(name, path = %path.display(), "spawning external command");

        let mut command = Command::new(&path);
        command.arg0(name).args(args).stdin(Stdio::inherit());
        if let Some(f) = &redirections.stdout {
            command.stdout(Stdio::from(f.try_clone()?));
        }
        if let Some(f) = &redirections.stderr {
            command.stderr(Stdio::from(f.try_clone()?));
        }

        let status = {
            let _fg = self.foreground.enter();
            command.status().map_err(|e| match e.kind() {
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                    ExecError::CommandNotFound(name.to_string())
                }
                _ => ExecError::Io(e),
            })?
        };

        let code = status
            .code()
            .or_else(|| status.signal().map(|sig| 128 + sig))
            .unwrap_or(1);
        tracing::debug!(name, code, "child exited");
        Ok(ExecOutcome::Code(code))
    }
}

fn writer<'a>(
    slot: &'a Option<Rc<File>>,
    fallback: impl FnOnce() -> Box<dyn Write + 'a>,
) -> Box<dyn Write + 'a> {
    match slot {
        Some(file) => Box::new(&**file),
        None => fallback(),
    }
}
