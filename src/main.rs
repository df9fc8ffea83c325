use std::io;

use rawsh::completion::Completer;
use rawsh::config::{Config, ConfigLoader};
use rawsh::environment::Environment;
use rawsh::executor::DefaultExecutor;
use rawsh::history::HistoryManager;
use rawsh::io::{LineEditor, Terminal};
use rawsh::repl::Shell;
use rawsh::signals::{self, ForegroundFlag};

fn main() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("RAWSH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    let env = Environment::new();
    let config = load_config(&env);

    let terminal = match Terminal::open() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("rawsh: {}", e);
            std::process::exit(1);
        }
    };

    let foreground = ForegroundFlag::default();
    if let Err(e) = signals::spawn_listener(terminal.clone(), foreground.clone()) {
        tracing::warn!(error = %e, "signal listener not installed");
    }

    let history = load_history(&config, &env);
    let completer = Completer::new(env.clone());
    let editor = LineEditor::new(
        config.prompt.clone(),
        terminal,
        completer,
        history,
        io::stdin(),
        io::stdout(),
    );
    let mut shell = Shell::new(editor, env, DefaultExecutor::new(foreground));

    let code = match shell.run() {
        Ok(code) => code,
        Err(e) => {
            shell.shutdown();
            eprintln!("rawsh: {}", e);
            std::process::exit(1);
        }
    };
    shell.shutdown();
    std::process::exit(code);
}

fn load_config(env: &Environment) -> Config {
    let Some(path) = ConfigLoader::locate(env.home()) else {
        return Config::default();
    };
    match ConfigLoader::load_from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "using default config");
            Config::default()
        }
    }
}

fn load_history(config: &Config, env: &Environment) -> HistoryManager {
    let Some(file) = &config.history_file else {
        return HistoryManager::new(config.history_max);
    };
    let path = env.expand_tilde(file);
    match HistoryManager::load(&path, config.history_max) {
        Ok(history) => history,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "history not loaded");
            HistoryManager::new(config.history_max)
        }
    }
}
