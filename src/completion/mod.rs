//! Tab completion for command names and filesystem paths.

pub mod grid;

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use crate::environment::Environment;
use crate::executor::{is_executable, BUILTIN_NAMES};

pub use grid::{common_prefix, format_grid};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Empty,
    /// Replacement for the partial word, escaped, trailing separator included.
    Single(String),
    /// `candidates` are plain names for display; `common_prefix` is escaped
    /// like `Single`.
    Ambiguous {
        candidates: Vec<String>,
        common_prefix: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Command,
    Argument,
}

/// Byte offset where the word under the cursor begins.
pub fn word_start(line: &str, cursor: usize) -> usize {
    let mut start = 0;
    let mut escaped = false;
    for (i, ch) in line[..cursor].char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == ' ' || ch == '\t' {
            start = i + ch.len_utf8();
        }
    }
    start
}

/// Command position only while no unescaped blank precedes the cursor.
pub fn context(line: &str, cursor: usize) -> Context {
    if word_start(line, cursor) == 0 {
        Context::Command
    } else {
        Context::Argument
    }
}

/// Drops the backslashes of a partial word as the lexer would.
pub fn unescape(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut chars = word.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Backslash-escapes characters the lexer would otherwise split on or eat.
pub fn escape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if matches!(ch, ' ' | '\t' | '\\' | '\'' | '"') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub struct Completer {
    env: Environment,
    base_dir: Option<PathBuf>,
}

impl Completer {
    pub fn new(env: Environment) -> Self {
        Completer { env, base_dir: None }
    }

    /// Resolve relative paths against `dir` instead of the working directory.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn complete(&self, line: &str, cursor: usize) -> Completion {
        let start = word_start(line, cursor);
        let word = unescape(&line[start..cursor]);
        let candidates = match context(line, cursor) {
            Context::Command => self.command_candidates(&word),
            Context::Argument => self.path_candidates(&word),
        };

        match candidates.len() {
            0 => Completion::Empty,
            1 => {
                let only = candidates.into_iter().next().unwrap_or_default();
                let mut text = escape(&only);
                if !only.ends_with('/') {
                    text.push(' ');
                }
                Completion::Single(text)
            }
            _ => Completion::Ambiguous {
                common_prefix: escape(&common_prefix(&candidates)),
                candidates,
            },
        }
    }

    /// Builtins plus executables on the search path starting with `prefix`.
    pub fn command_candidates(&self, prefix: &str) -> Vec<String> {
        let mut names: BTreeSet<String> = BUILTIN_NAMES
            .iter()
            .filter(|name| name.starts_with(prefix))
            .map(|name| name.to_string())
            .collect();

        for dir in self.env.search_path() {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };
                if name.starts_with(prefix) && is_executable(&entry.path()) {
                    names.insert(name);
                }
            }
        }
        names.into_iter().collect()
    }

    /// Entries of the directory named by `word` whose names start with its
    /// last component. Directories carry a trailing `/`.
    pub fn path_candidates(&self, word: &str) -> Vec<String> {
        let (dir_part, base) = match word.rfind('/') {
            Some(idx) => word.split_at(idx + 1),
            None => ("", word),
        };

        let dir = if dir_part.is_empty() {
            self.base()
        } else {
            let expanded = self.env.expand_tilde(dir_part);
            if expanded.is_absolute() {
                expanded
            } else {
                self.base().join(expanded)
            }
        };

        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut found: Vec<String> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                if !name.starts_with(base) {
                    return None;
                }
                let is_dir = fs::metadata(entry.path()).map(|m| m.is_dir()).unwrap_or(false);
                let suffix = if is_dir { "/" } else { "" };
                Some(format!("{}{}{}", dir_part, name, suffix))
            })
            .collect();
        found.sort();
        found
    }

    fn base(&self) -> PathBuf {
        self.base_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
