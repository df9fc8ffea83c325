use super::token::Token;
use crate::parser::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    /// A backslash was seen; holds the state to return to after the next char.
    Escaped(Resume),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    Normal,
    DoubleQuoted,
}

pub struct Lexer<'a> {
    input: &'a str,
    state: State,
    buf: String,
    // Set once any quote opens, so `""` still yields an (empty) word.
    started: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            state: State::Normal,
            buf: String::new(),
            started: false,
            tokens: Vec::new(),
        }
    }

    /// Splits the whole line into words. Fails without returning any partial
    /// output if a quote is left open or the line ends on a lone backslash.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        for ch in self.input.chars() {
            self.step(ch);
        }

        match self.state {
            State::Normal => {}
            State::SingleQuoted => return Err(ParseError::UnterminatedQuote('\'')),
            State::DoubleQuoted => return Err(ParseError::UnterminatedQuote('"')),
            State::Escaped(_) => return Err(ParseError::TrailingEscape),
        }
        self.flush();

        tracing::debug!(tokens = ?self.tokens, "tokenized line");
        Ok(self.tokens)
    }

    fn step(&mut self, ch: char) {
        self.state = match self.state {
            State::Normal => match ch {
                ' ' | '\t' => {
                    self.flush();
                    State::Normal
                }
                '\\' => State::Escaped(Resume::Normal),
                '\'' => {
                    self.started = true;
                    State::SingleQuoted
                }
                '"' => {
                    self.started = true;
                    State::DoubleQuoted
                }
                _ => {
                    self.push(ch);
                    State::Normal
                }
            },
            State::SingleQuoted => match ch {
                '\'' => State::Normal,
                _ => {
                    self.push(ch);
                    State::SingleQuoted
                }
            },
            State::DoubleQuoted => match ch {
                '"' => State::Normal,
                '\\' => State::Escaped(Resume::DoubleQuoted),
                _ => {
                    self.push(ch);
                    State::DoubleQuoted
                }
            },
            State::Escaped(Resume::Normal) => {
                self.push(ch);
                State::Normal
            }
            State::Escaped(Resume::DoubleQuoted) => {
                match ch {
                    '"' | '$' | '`' | '\\' | '\n' => self.push(ch),
                    _ => {
                        self.push('\\');
                        self.push(ch);
                    }
                }
                State::DoubleQuoted
            }
        };
    }

    fn push(&mut self, ch: char) {
        self.buf.push(ch);
        self.started = true;
    }

    fn flush(&mut self) {
        if self.started {
            self.tokens.push(Token::new(std::mem::take(&mut self.buf)));
            self.started = false;
        }
    }
}

/// Convenience wrapper around [`Lexer::tokenize`].
pub fn tokenize(line: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(line).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(input: &str) -> Vec<String> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(Token::into_string)
            .collect()
    }

    #[test]
    fn test_tokenize_simple_words() {
        assert_eq!(words("echo hello"), vec!["echo", "hello"]);
    }

    #[test]
    fn test_plain_input_matches_whitespace_split() {
        for input in ["ls -la   /tmp", "  a\tb  c ", "", "   ", "x", "cat a.txt b.txt\t\tc"] {
            let expected: Vec<String> = input.split_whitespace().map(str::to_string).collect();
            assert_eq!(words(input), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn test_double_quoted_word() {
        assert_eq!(words(r#"echo "a b" c"#), vec!["echo", "a b", "c"]);
    }

    #[test]
    fn test_escaped_space_does_not_split() {
        assert_eq!(words(r"echo a\ b"), vec!["echo", "a b"]);
    }

    #[test]
    fn test_escaped_quote_inside_double_quotes() {
        assert_eq!(words(r#"echo "a\"b""#), vec!["echo", "a\"b"]);
    }

    #[test]
    fn test_single_quotes_keep_backslash() {
        assert_eq!(words(r"echo 'a\nb' 'c\'"), vec!["echo", r"a\nb", r"c\"]);
    }

    #[test]
    fn test_double_quotes_preserve_unknown_escapes() {
        assert_eq!(words(r#"echo "a\nb" "x\\y" "\$HOME""#), vec!["echo", r"a\nb", r"x\y", "$HOME"]);
    }

    #[test]
    fn test_double_quotes_unescape_backtick_and_newline() {
        assert_eq!(words("echo \"a\\`b\""), vec!["echo", "a`b"]);
        assert_eq!(words("echo \"a\\\nb\""), vec!["echo", "a\nb"]);
    }

    #[test]
    fn test_other_quote_type_is_literal() {
        assert_eq!(words(r#"echo "it's" 'say "hi"'"#), vec!["echo", "it's", r#"say "hi""#]);
    }

    #[test]
    fn test_adjacent_quotes_join_into_one_word() {
        assert_eq!(words(r#"echo 'foo'"bar"baz"#), vec!["echo", "foobarbaz"]);
    }

    #[test]
    fn test_empty_quotes_yield_empty_word() {
        assert_eq!(words(r#"echo "" ''"#), vec!["echo", "", ""]);
    }

    #[test]
    fn test_escape_outside_quotes_takes_next_char_literally() {
        assert_eq!(words(r#"echo \'x\' \"y\" \\"#), vec!["echo", "'x'", "\"y\"", "\\"]);
    }

    #[test]
    fn test_unterminated_quotes() {
        assert_eq!(tokenize("echo 'foo"), Err(ParseError::UnterminatedQuote('\'')));
        assert_eq!(tokenize("echo \"foo"), Err(ParseError::UnterminatedQuote('"')));
        assert_eq!(tokenize("echo \"a\\\""), Err(ParseError::UnterminatedQuote('"')));
    }

    #[test]
    fn test_trailing_escape() {
        assert_eq!(tokenize("echo foo\\"), Err(ParseError::TrailingEscape));
        assert_eq!(tokenize("\\"), Err(ParseError::TrailingEscape));
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").unwrap().is_empty());
    }
}
