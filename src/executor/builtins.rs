use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;

use super::executor::{ExecOutcome, ExecStatus};
use super::path_resolver::PathResolver;
use crate::environment::Environment;

/// Names of every builtin, sorted. Used by `type` and command completion.
pub const BUILTIN_NAMES: [&str; 5] = ["cd", "echo", "exit", "pwd", "type"];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

/// Output streams a builtin writes to for one invocation.
pub struct BuiltinIo<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
}

pub trait BuiltinCommand {
    fn name(&self) -> &'static str;
    fn run(&self, args: &[String], env: &mut Environment, io: &mut BuiltinIo<'_>) -> ExecStatus;
}

pub struct BuiltinManager {
    commands: HashMap<&'static str, Box<dyn BuiltinCommand>>,
}

impl BuiltinManager {
    pub fn new() -> Self {
        let mut mgr = BuiltinManager {
            commands: HashMap::new(),
        };
        mgr.register(Box::new(ExitCommand));
        mgr.register(Box::new(EchoCommand));
        mgr.register(Box::new(TypeCommand));
        mgr.register(Box::new(PwdCommand));
        mgr.register(Box::new(CdCommand));
        mgr
    }

    pub fn register(&mut self, cmd: Box<dyn BuiltinCommand>) {
        self.commands.insert(cmd.name(), cmd);
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Runs `name` if it is registered; `None` means it is not a builtin.
    pub fn execute(
        &self,
        name: &str,
        args: &[String],
        env: &mut Environment,
        io: &mut BuiltinIo<'_>,
    ) -> Option<ExecStatus> {
        let cmd = self.commands.get(name)?;
        Some(cmd.run(args, env, io))
    }
}

impl Default for BuiltinManager {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ExitCommand;

impl BuiltinCommand for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }
    fn run(&self, args: &[String], _env: &mut Environment, io: &mut BuiltinIo<'_>) -> ExecStatus {
        match args {
            [] => Ok(ExecOutcome::Exit(0)),
            [code] => match code.parse::<i32>() {
                Ok(code) => Ok(ExecOutcome::Exit(code)),
                Err(_) => {
                    writeln!(io.err, "exit: {}: numeric argument required", code)?;
                    Ok(ExecOutcome::Exit(1))
                }
            },
            _ => {
                writeln!(io.err, "exit: too many arguments")?;
                Ok(ExecOutcome::Code(1))
            }
        }
    }
}

pub struct EchoCommand;

impl BuiltinCommand for EchoCommand {
    fn name(&self) -> &'static str {
        "echo"
    }
    fn run(&self, args: &[String], _env: &mut Environment, io: &mut BuiltinIo<'_>) -> ExecStatus {
        writeln!(io.out, "{}", args.join(" "))?;
        Ok(ExecOutcome::Code(0))
    }
}

pub struct TypeCommand;

impl BuiltinCommand for TypeCommand {
    fn name(&self) -> &'static str {
        "type"
    }
    fn run(&self, args: &[String], env: &mut Environment, io: &mut BuiltinIo<'_>) -> ExecStatus {
        let mut status = 0;
        for name in args {
            if is_builtin(name) {
                writeln!(io.out, "{} is a shell builtin", name)?;
            } else if let Some(path) = PathResolver.resolve(name, env.search_path()) {
                writeln!(io.out, "{} is {}", name, path.display())?;
            } else {
                writeln!(io.out, "{}: not found", name)?;
                status = 1;
            }
        }
        Ok(ExecOutcome::Code(status))
    }
}

pub struct PwdCommand;

impl BuiltinCommand for PwdCommand {
    fn name(&self) -> &'static str {
        "pwd"
    }
    fn run(&self, _args: &[String], _env: &mut Environment, io: &mut BuiltinIo<'_>) -> ExecStatus {
        match std::env::current_dir() {
            Ok(dir) => {
                writeln!(io.out, "{}", dir.display())?;
                Ok(ExecOutcome::Code(0))
            }
            Err(e) => {
                writeln!(io.err, "pwd: {}", e)?;
                Ok(ExecOutcome::Code(1))
            }
        }
    }
}

pub struct CdCommand;

impl CdCommand {
    fn target(args: &[String], env: &Environment) -> Result<PathBuf, &'static str> {
        match args.first().map(|s| s.as_str()) {
            None => env.home().map(|h| h.to_path_buf()).ok_or("cd: HOME not set"),
            Some("-") => env
                .previous_dir()
                .map(|p| p.to_path_buf())
                .ok_or("cd: OLDPWD not set"),
            Some(path) if (path == "~" || path.starts_with("~/")) && env.home().is_none() => {
                Err("cd: HOME not set")
            }
            Some(path) => Ok(env.expand_tilde(path)),
        }
    }
}

impl BuiltinCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }
    fn run(&self, args: &[String], env: &mut Environment, io: &mut BuiltinIo<'_>) -> ExecStatus {
        if args.len() > 1 {
            writeln!(io.err, "cd: too many arguments")?;
            return Ok(ExecOutcome::Code(1));
        }
        let target = match Self::target(args, env) {
            Ok(target) => target,
            Err(msg) => {
                writeln!(io.err, "{}", msg)?;
                return Ok(ExecOutcome::Code(1));
            }
        };

        let previous = std::env::current_dir().ok();
        if let Err(e) = std::env::set_current_dir(&target) {
            let reason = match e.kind() {
                io::ErrorKind::NotFound => "No such file or directory".to_string(),
                io::ErrorKind::NotADirectory => "Not a directory".to_string(),
                _ => e.to_string(),
            };
            writeln!(io.err, "cd: {}: {}", target.display(), reason)?;
            return Ok(ExecOutcome::Code(1));
        }
        tracing::debug!(dir = %target.display(), "changed directory");
        if let Some(previous) = previous {
            env.set_previous_dir(previous);
        }
        Ok(ExecOutcome::Code(0))
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    struct Captured {
        out: Vec<u8>,
        err: Vec<u8>,
    }

    fn run(name: &str, args: &[&str], env: &mut Environment) -> (ExecOutcome, Captured) {
        let mgr = BuiltinManager::new();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut cap = Captured { out: Vec::new(), err: Vec::new() };
        let outcome = {
            let mut io = BuiltinIo { out: &mut cap.out, err: &mut cap.err };
            mgr.execute(name, &args, env, &mut io).unwrap().unwrap()
        };
        (outcome, cap)
    }

    fn text(bytes: &[u8]) -> String {
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn bare_env() -> Environment {
        Environment::with_paths(None, vec![])
    }

    #[test]
    fn test_registered_names_match_builtin_list() {
        let mgr = BuiltinManager::new();
        for name in BUILTIN_NAMES {
            assert!(mgr.is_builtin(name), "{} not registered", name);
        }
        assert!(!mgr.is_builtin("ls"));
        assert!(mgr.execute("ls", &[], &mut bare_env(), &mut BuiltinIo {
            out: &mut io::sink(),
            err: &mut io::sink(),
        }).is_none());
    }

    #[test]
    fn test_echo_joins_with_spaces() {
        let (outcome, cap) = run("echo", &["hello", "big  world"], &mut bare_env());
        assert_eq!(outcome, ExecOutcome::Code(0));
        assert_eq!(text(&cap.out), "hello big  world\n");

        let (_, cap) = run("echo", &[], &mut bare_env());
        assert_eq!(text(&cap.out), "\n");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(run("exit", &[], &mut bare_env()).0, ExecOutcome::Exit(0));
        assert_eq!(run("exit", &["42"], &mut bare_env()).0, ExecOutcome::Exit(42));

        let (outcome, cap) = run("exit", &["abc"], &mut bare_env());
        assert_eq!(outcome, ExecOutcome::Exit(1));
        assert!(text(&cap.err).contains("numeric argument required"));

        let (outcome, cap) = run("exit", &["1", "2"], &mut bare_env());
        assert_eq!(outcome, ExecOutcome::Code(1));
        assert_eq!(text(&cap.err), "exit: too many arguments\n");
    }

    #[test]
    fn test_type_reports_builtins_paths_and_misses() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("mytool");
        std::fs::File::create(&tool).unwrap();
        std::fs::set_permissions(&tool, std::os::unix::fs::PermissionsExt::from_mode(0o755)).unwrap();
        let mut env = Environment::with_paths(None, vec![dir.path().to_path_buf()]);

        let (outcome, cap) = run("type", &["echo", "mytool", "nope"], &mut env);
        assert_eq!(outcome, ExecOutcome::Code(1));
        assert_eq!(
            text(&cap.out),
            format!(
                "echo is a shell builtin\nmytool is {}\nnope: not found\n",
                tool.display()
            )
        );
    }

    #[test]
    #[serial]
    fn test_cd_tracks_previous_directory() {
        let start = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().canonicalize().unwrap();
        let mut env = bare_env();

        let (_, cap) = run("cd", &["-"], &mut env);
        assert_eq!(text(&cap.err), "cd: OLDPWD not set\n");

        let (outcome, _) = run("cd", &[target.to_str().unwrap()], &mut env);
        assert_eq!(outcome, ExecOutcome::Code(0));
        assert_eq!(std::env::current_dir().unwrap(), target);
        assert_eq!(env.previous_dir(), Some(start.as_path()));

        let (outcome, _) = run("cd", &["-"], &mut env);
        assert_eq!(outcome, ExecOutcome::Code(0));
        assert_eq!(std::env::current_dir().unwrap(), start);
        assert_eq!(env.previous_dir(), Some(target.as_path()));
    }

    #[test]
    #[serial]
    fn test_cd_home_and_missing_dir() {
        let start = std::env::current_dir().unwrap();
        let home = tempfile::tempdir().unwrap();
        let home_path = home.path().canonicalize().unwrap();
        let mut env = Environment::with_paths(Some(home_path.clone()), vec![]);

        run("cd", &["~"], &mut env);
        assert_eq!(std::env::current_dir().unwrap(), home_path);
        run("cd", &[start.to_str().unwrap()], &mut env);
        run("cd", &[], &mut env);
        assert_eq!(std::env::current_dir().unwrap(), home_path);

        let (outcome, cap) = run("cd", &["/definitely/not/here"], &mut env);
        assert_eq!(outcome, ExecOutcome::Code(1));
        assert_eq!(text(&cap.err), "cd: /definitely/not/here: No such file or directory\n");
        assert_eq!(std::env::current_dir().unwrap(), home_path);

        std::env::set_current_dir(&start).unwrap();
    }

    #[test]
    #[serial]
    fn test_pwd_prints_current_dir() {
        let (outcome, cap) = run("pwd", &[], &mut bare_env());
        assert_eq!(outcome, ExecOutcome::Code(0));
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(text(&cap.out), format!("{}\n", cwd.display()));
    }
}
