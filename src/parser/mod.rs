pub mod redirect;

use thiserror::Error;

pub use redirect::{open, resolve, OpenRedirections, RedirectionError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("syntax error: unterminated quote {0}")]
    UnterminatedQuote(char),
    #[error("syntax error: trailing backslash")]
    TrailingEscape,
    #[error("syntax error: no target for redirection `{0}`")]
    MissingRedirectionTarget(String),
}
