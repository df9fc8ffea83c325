use std::io::{self, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    /// Control chord, lowercase letter (`Ctrl('c')` for byte 0x03).
    Ctrl(char),
    Unknown,
}

/// Decodes raw-mode terminal bytes into keys.
pub struct KeyReader<R> {
    input: R,
    // Byte read past a bare Esc, handed out next.
    pending: Option<u8>,
}

impl<R: Read> KeyReader<R> {
    pub fn new(input: R) -> Self {
        KeyReader {
            input,
            pending: None,
        }
    }

    fn byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.pending.take() {
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Next key, or `None` once the input stream is exhausted.
    pub fn next_key(&mut self) -> io::Result<Option<Key>> {
        let Some(b) = self.byte()? else {
            return Ok(None);
        };
        let key = match b {
            b'\r' | b'\n' => Key::Enter,
            b'\t' => Key::Tab,
            0x7f | 0x08 => Key::Backspace,
            0x1b => self.escape()?,
            0x01..=0x1a => Key::Ctrl((b'a' + b - 1) as char),
            0x00..=0x1f => Key::Unknown,
            _ => self.utf8(b)?,
        };
        Ok(Some(key))
    }

    fn escape(&mut self) -> io::Result<Key> {
        let Some(intro) = self.byte()? else {
            return Ok(Key::Unknown);
        };
        if intro != b'[' && intro != b'O' {
            self.pending = Some(intro);
            return Ok(Key::Unknown);
        }
        let Some(fin) = self.byte()? else {
            return Ok(Key::Unknown);
        };
        let key = match fin {
            b'A' => Key::Up,
            b'B' => Key::Down,
            b'C' => Key::Right,
            b'D' => Key::Left,
            b'H' => Key::Home,
            b'F' => Key::End,
            b'0'..=b'9' => {
                let mut num = vec![fin];
                loop {
                    match self.byte()? {
                        Some(b'~') => break,
                        Some(d) if d.is_ascii_digit() || d == b';' => num.push(d),
                        _ => return Ok(Key::Unknown),
                    }
                }
                match num.as_slice() {
                    b"1" | b"7" => Key::Home,
                    b"4" | b"8" => Key::End,
                    b"3" => Key::Delete,
                    _ => Key::Unknown,
                }
            }
            _ => Key::Unknown,
        };
        Ok(key)
    }

    fn utf8(&mut self, lead: u8) -> io::Result<Key> {
        let len = match lead {
            0x00..=0x7f => 1,
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => return Ok(Key::Unknown),
        };
        let mut buf = vec![lead];
        for _ in 1..len {
            match self.byte()? {
                Some(b) => buf.push(b),
                None => return Ok(Key::Unknown),
            }
        }
        Ok(std::str::from_utf8(&buf)
            .ok()
            .and_then(|s| s.chars().next())
            .map_or(Key::Unknown, Key::Char))
    }
}
