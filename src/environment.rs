use std::env;
use std::path::{Path, PathBuf};

/// Per-session state consulted by builtins, dispatch and completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    home: Option<PathBuf>,
    search_path: Vec<PathBuf>,
    previous_dir: Option<PathBuf>,
}

impl Environment {
    /// Snapshot of `HOME` and `PATH` from the process environment.
    pub fn new() -> Self {
        let home = env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .map(PathBuf::from);
        let search_path = env::var_os("PATH")
            .map(|p| env::split_paths(&p).collect())
            .unwrap_or_default();
        Self::with_paths(home, search_path)
    }

    pub fn with_paths(home: Option<PathBuf>, search_path: Vec<PathBuf>) -> Self {
        Environment {
            home,
            search_path,
            previous_dir: None,
        }
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    pub fn previous_dir(&self) -> Option<&Path> {
        self.previous_dir.as_deref()
    }

    pub fn set_previous_dir(&mut self, dir: PathBuf) {
        self.previous_dir = Some(dir);
    }

    /// Expands a leading `~` or `~/` against the home directory.
    pub fn expand_tilde(&self, path: &str) -> PathBuf {
        match (path, self.home()) {
            ("~", Some(home)) => home.to_path_buf(),
            (p, Some(home)) if p.starts_with("~/") => home.join(&p[2..]),
            (p, _) => PathBuf::from(p),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
