use std::io::{self, Read, Write};

use thiserror::Error;

use super::keys::{Key, KeyReader};
use super::terminal::{Terminal, TerminalError};
use crate::completion::{self, Completer, Completion};
use crate::history::HistoryManager;

#[derive(Debug, Error)]
pub enum ReadlineError {
    #[error("end of input")]
    Eof,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Terminal(#[from] TerminalError),
}

/// Line being edited; thrown away once a line is accepted.
#[derive(Debug, Default)]
struct EditState {
    buf: Vec<char>,
    cursor: usize,
    history_pos: Option<usize>,
    draft: String,
}

impl EditState {
    fn text(&self) -> String {
        self.buf.iter().collect()
    }

    fn set_text(&mut self, text: &str) {
        self.buf = text.chars().collect();
        self.cursor = self.buf.len();
    }

    fn insert(&mut self, ch: char) {
        self.buf.insert(self.cursor, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.buf.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.buf.len() {
            self.buf.remove(self.cursor);
        }
    }

    fn delete_word(&mut self) {
        let mut start = self.cursor;
        while start > 0 && self.buf[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !self.buf[start - 1].is_whitespace() {
            start -= 1;
        }
        self.buf.drain(start..self.cursor);
        self.cursor = start;
    }

    /// Replaces the `word_len` chars before the cursor with `text`.
    fn replace_word(&mut self, word_len: usize, text: &str) {
        let start = self.cursor - word_len.min(self.cursor);
        self.buf.splice(start..self.cursor, text.chars());
        self.cursor = start + text.chars().count();
    }
}

pub struct LineEditor<R, W> {
    prompt: String,
    terminal: Terminal,
    completer: Completer,
    history: HistoryManager,
    keys: KeyReader<R>,
    out: W,
}

impl<R: Read, W: Write> LineEditor<R, W> {
    pub fn new(
        prompt: impl Into<String>,
        terminal: Terminal,
        completer: Completer,
        history: HistoryManager,
        input: R,
        output: W,
    ) -> Self {
        LineEditor {
            prompt: prompt.into(),
            terminal,
            completer,
            history,
            keys: KeyReader::new(input),
            out: output,
        }
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Shows the prompt and edits one line. The accepted line is returned as
    /// typed; its trimmed form goes into history.
    pub fn read_line(&mut self) -> Result<String, ReadlineError> {
        let mut state = EditState::default();
        self.refresh(&state)?;

        loop {
            let Some(key) = self.keys.next_key()? else {
                self.out.write_all(b"\r\n")?;
                self.out.flush()?;
                return Err(ReadlineError::Eof);
            };

            match key {
                Key::Enter => {
                    self.out.write_all(b"\r\n")?;
                    self.out.flush()?;
                    let line = state.text();
                    self.history.add(&line);
                    return Ok(line);
                }
                Key::Ctrl('d') if state.buf.is_empty() => {
                    self.out.write_all(b"\r\n")?;
                    self.out.flush()?;
                    return Err(ReadlineError::Eof);
                }
                Key::Ctrl('c') => {
                    self.out.write_all(b"^C\r\n")?;
                    state = EditState::default();
                }
                Key::Char(c) => state.insert(c),
                Key::Tab => self.complete(&mut state)?,
                Key::Backspace => state.backspace(),
                Key::Delete | Key::Ctrl('d') => state.delete(),
                Key::Left | Key::Ctrl('b') => state.cursor = state.cursor.saturating_sub(1),
                Key::Right | Key::Ctrl('f') => state.cursor = (state.cursor + 1).min(state.buf.len()),
                Key::Home | Key::Ctrl('a') => state.cursor = 0,
                Key::End | Key::Ctrl('e') => state.cursor = state.buf.len(),
                Key::Up | Key::Ctrl('p') => self.history_prev(&mut state),
                Key::Down | Key::Ctrl('n') => self.history_next(&mut state),
                Key::Ctrl('k') => state.buf.truncate(state.cursor),
                Key::Ctrl('u') => {
                    state.buf.drain(..state.cursor);
                    state.cursor = 0;
                }
                Key::Ctrl('w') => state.delete_word(),
                Key::Ctrl('l') => self.out.write_all(b"\x1b[H\x1b[2J")?,
                Key::Ctrl(_) | Key::Unknown => continue,
            }
            self.refresh(&state)?;
        }
    }

    fn refresh(&mut self, state: &EditState) -> io::Result<()> {
        let mut frame = format!("\r{}{}\x1b[K", self.prompt, state.text());
        let behind: usize = state.buf[state.cursor..].iter().map(|&c| char_width(c)).sum();
        if behind > 0 {
            frame.push_str(&format!("\x1b[{}D", behind));
        }
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()
    }

    fn history_prev(&mut self, state: &mut EditState) {
        let pos = match state.history_pos {
            None if self.history.is_empty() => return,
            None => {
                state.draft = state.text();
                self.history.len() - 1
            }
            Some(0) => return,
            Some(i) => i - 1,
        };
        if let Some(entry) = self.history.get(pos) {
            state.history_pos = Some(pos);
            state.set_text(entry);
        }
    }

    fn history_next(&mut self, state: &mut EditState) {
        let Some(pos) = state.history_pos else {
            return;
        };
        match self.history.get(pos + 1) {
            Some(entry) => {
                state.history_pos = Some(pos + 1);
                state.set_text(entry);
            }
            None => {
                state.history_pos = None;
                let draft = std::mem::take(&mut state.draft);
                state.set_text(&draft);
            }
        }
    }

    fn complete(&mut self, state: &mut EditState) -> Result<(), ReadlineError> {
        let line = state.text();
        let cursor = line
            .char_indices()
            .nth(state.cursor)
            .map_or(line.len(), |(i, _)| i);
        let word_len = line[completion::word_start(&line, cursor)..cursor].chars().count();

        match self.completer.complete(&line, cursor) {
            Completion::Empty => self.out.write_all(b"\x07")?,
            Completion::Single(text) => state.replace_word(word_len, &text),
            Completion::Ambiguous {
                candidates,
                common_prefix,
            } => {
                if common_prefix.chars().count() > word_len {
                    state.replace_word(word_len, &common_prefix);
                } else {
                    self.show_candidates(&candidates)?;
                }
            }
        }
        Ok(())
    }

    fn show_candidates(&mut self, candidates: &[String]) -> Result<(), ReadlineError> {
        let _cooked = self.terminal.suspend()?;
        let width = terminal_size::terminal_size()
            .map(|(w, _)| usize::from(w.0))
            .unwrap_or(80);
        self.out.write_all(b"\n")?;
        self.out
            .write_all(completion::format_grid(candidates, width).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Terminal columns taken by `ch`: two for East Asian wide and fullwidth
/// ranges, zero for combining marks, one otherwise.
fn char_width(ch: char) -> usize {
    match ch as u32 {
        0x0300..=0x036f | 0x200b..=0x200f | 0xfe00..=0xfe0f => 0,
        0x1100..=0x115f
        | 0x2e80..=0x303e
        | 0x3041..=0x33ff
        | 0x3400..=0x4dbf
        | 0x4e00..=0x9fff
        | 0xa000..=0xa4cf
        | 0xac00..=0xd7a3
        | 0xf900..=0xfaff
        | 0xfe30..=0xfe4f
        | 0xff00..=0xff60
        | 0xffe0..=0xffe6
        | 0x1f300..=0x1f64f
        | 0x1f900..=0x1f9ff
        | 0x20000..=0x3fffd => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File, Permissions};
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    use super::*;
    use crate::environment::Environment;
    use crate::io::terminal::fake::FakeTty;

    fn editor_in(
        bin: &Path,
        input: &'static [u8],
        history: HistoryManager,
    ) -> (LineEditor<&'static [u8], Vec<u8>>, FakeTty) {
        let tty = FakeTty::new();
        let terminal = Terminal::with_device(Box::new(tty.clone())).unwrap();
        let env = Environment::with_paths(None, vec![bin.to_path_buf()]);
        let completer = Completer::new(env).with_base_dir(bin);
        let editor = LineEditor::new("$ ", terminal, completer, history, input, Vec::new());
        (editor, tty)
    }

    fn editor(input: &'static [u8]) -> LineEditor<&'static [u8], Vec<u8>> {
        editor_in(Path::new("/nonexistent"), input, HistoryManager::new(10)).0
    }

    fn exe(dir: &Path, name: &str) {
        let path = dir.join(name);
        File::create(&path).unwrap();
        fs::set_permissions(&path, Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_accepts_line_verbatim_and_records_history() {
        let mut ed = editor(b"  echo hi  \r");
        assert_eq!(ed.read_line().unwrap(), "  echo hi  ");
        assert_eq!(ed.history().last(), Some("echo hi"));
        assert!(String::from_utf8_lossy(ed.output()).starts_with("\r$ "));
    }

    #[test]
    fn test_cursor_movement_and_insert() {
        let mut ed = editor(b"ab\x1b[D\x1b[DX\x1b[FY\x01Z\r");
        assert_eq!(ed.read_line().unwrap(), "ZXabY");
    }

    #[test]
    fn test_backspace_and_delete() {
        let mut ed = editor(b"abcd\x7f\x1b[D\x1b[D\x1b[3~\r");
        assert_eq!(ed.read_line().unwrap(), "ac");
    }

    #[test]
    fn test_kill_commands() {
        let mut ed = editor(b"echo foo bar\x17\r");
        assert_eq!(ed.read_line().unwrap(), "echo foo ");

        let mut ed = editor(b"echo foo\x1b[D\x1b[D\x1b[D\x15\r");
        assert_eq!(ed.read_line().unwrap(), "foo");

        let mut ed = editor(b"echo foo\x01\x1b[C\x0b\r");
        assert_eq!(ed.read_line().unwrap(), "e");
    }

    #[test]
    fn test_ctrl_c_discards_line() {
        let mut ed = editor(b"abc\x03def\r");
        assert_eq!(ed.read_line().unwrap(), "def");
        assert!(ed.history().iter().all(|h| h != "abc"));
    }

    #[test]
    fn test_eof_on_empty_line() {
        let mut ed = editor(b"\x04");
        assert!(matches!(ed.read_line(), Err(ReadlineError::Eof)));

        let mut ed = editor(b"");
        assert!(matches!(ed.read_line(), Err(ReadlineError::Eof)));

        let mut ed = editor(b"ab\x01\x04\r");
        assert_eq!(ed.read_line().unwrap(), "b");
    }

    #[test]
    fn test_history_navigation_restores_draft() {
        let mut ed = editor(b"one\rtwo\rtwo\rdra\x1b[A\x1b[A\x1b[A\r\x1b[A\x1b[B\x1b[Bft\r");
        assert_eq!(ed.read_line().unwrap(), "one");
        assert_eq!(ed.read_line().unwrap(), "two");
        assert_eq!(ed.read_line().unwrap(), "two");
        assert_eq!(ed.history().len(), 2);
        // Up past the oldest entry stays on it.
        assert_eq!(ed.read_line().unwrap(), "one");
        assert_eq!(ed.read_line().unwrap(), "ft");
    }

    #[test]
    fn test_tab_completes_unique_command() {
        let bin = tempfile::tempdir().unwrap();
        exe(bin.path(), "xyz_tool");
        let (mut ed, _) = editor_in(bin.path(), b"xyz_t\targ\r", HistoryManager::new(10));
        assert_eq!(ed.read_line().unwrap(), "xyz_tool arg");
    }

    #[test]
    fn test_tab_extends_to_common_prefix() {
        let bin = tempfile::tempdir().unwrap();
        exe(bin.path(), "xyz_foo");
        exe(bin.path(), "xyz_foo_bar");
        let (mut ed, _) = editor_in(bin.path(), b"xyz\t\r", HistoryManager::new(10));
        assert_eq!(ed.read_line().unwrap(), "xyz_foo");
    }

    #[test]
    fn test_tab_lists_candidates_in_cooked_mode() {
        let bin = tempfile::tempdir().unwrap();
        exe(bin.path(), "xyz_a");
        exe(bin.path(), "xyz_b");
        let (mut ed, tty) = editor_in(bin.path(), b"xyz_\t\r", HistoryManager::new(10));

        assert_eq!(ed.read_line().unwrap(), "xyz_");
        let shown = String::from_utf8_lossy(ed.output()).to_string();
        assert!(shown.contains("xyz_a  xyz_b\n"), "output: {:?}", shown);

        let calls = tty.calls();
        assert_eq!(calls.restores, 1);
        assert_eq!(calls.raws, 2);
    }

    #[test]
    fn test_tab_completes_directory_without_space() {
        let base = tempfile::tempdir().unwrap();
        fs::create_dir(base.path().join("subdir")).unwrap();
        let (mut ed, _) = editor_in(base.path(), b"cd sub\t\r", HistoryManager::new(10));
        assert_eq!(ed.read_line().unwrap(), "cd subdir/");
    }

    #[test]
    fn test_completed_name_with_space_stays_one_word() {
        let base = tempfile::tempdir().unwrap();
        File::create(base.path().join("my notes.txt")).unwrap();
        let (mut ed, _) = editor_in(base.path(), b"cat my\t\r", HistoryManager::new(10));

        let line = ed.read_line().unwrap();
        assert_eq!(line, "cat my\\ notes.txt ");
        let words: Vec<String> = crate::lexer::tokenize(&line)
            .unwrap()
            .into_iter()
            .map(|t| t.into_string())
            .collect();
        assert_eq!(words, vec!["cat", "my notes.txt"]);
    }

    #[test]
    fn test_cursor_back_counts_wide_columns() {
        let mut ed = editor("日本\x1b[D\x1b[D\r".as_bytes());
        assert_eq!(ed.read_line().unwrap(), "日本");
        let shown = String::from_utf8_lossy(ed.output()).to_string();
        assert!(shown.contains("\r$ 日本\x1b[K\x1b[2D"), "output: {:?}", shown);
        assert!(shown.contains("\r$ 日本\x1b[K\x1b[4D"), "output: {:?}", shown);
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width('日'), 2);
    }
}
