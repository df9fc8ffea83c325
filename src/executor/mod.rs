mod builtins;
mod default_executor;
mod executor;
mod path_resolver;

pub use builtins::{is_builtin, BuiltinCommand, BuiltinIo, BuiltinManager, BUILTIN_NAMES};
pub use default_executor::DefaultExecutor;
pub use executor::{ExecError, ExecOutcome, ExecStatus, Executor};
pub use path_resolver::{is_executable, PathResolver};
