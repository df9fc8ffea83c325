use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Bounded list of accepted lines, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: VecDeque<String>,
    max_len: usize,
    file_path: Option<PathBuf>,
}

impl HistoryManager {
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_len.min(1024)),
            max_len,
            file_path: None,
        }
    }

    // Load from history file; a missing file is an empty history
    pub fn load(path: impl AsRef<Path>, max_len: usize) -> std::io::Result<Self> {
        let path = path.as_ref();
        let mut history = Self::new(max_len);
        history.file_path = Some(path.to_path_buf());

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(history),
            Err(e) => return Err(e),
        };
        // Same rules as interactive entry; only the newest max_len survive
        for line in BufReader::new(file).lines() {
            history.add(&line?);
        }
        Ok(history)
    }

    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        let file = OpenOptions::new().create(true).write(true).truncate(true).open(path)?;
        let mut out = BufWriter::new(file);
        for line in &self.entries {
            writeln!(out, "{}", line)?;
        }
        out.flush()
    }

    /// Records `line` (trimmed). Blank lines and repeats of the newest entry
    /// are ignored; when full, the oldest entry is evicted first.
    pub fn add(&mut self, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() || self.max_len == 0 {
            return;
        }
        if self.entries.back().is_some_and(|last| last == trimmed) {
            return;
        }
        if self.entries.len() >= self.max_len {
            self.entries.pop_front();
        }
        self.entries.push_back(trimmed.to_string());
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.entries.get(idx).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_len
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.as_str())
    }
}
