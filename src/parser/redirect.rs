use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use thiserror::Error;

use super::ParseError;
use crate::ast::{RedirectMode, RedirectStream, RedirectionDirective, RedirectionPlan};
use crate::lexer::Token;

fn operator(word: &str) -> Option<(RedirectStream, RedirectMode)> {
    use RedirectMode::*;
    use RedirectStream::*;
    let op = match word {
        ">" | "1>" | ">|" => (Stdout, Truncate),
        ">>" | "1>>" => (Stdout, Append),
        "2>" => (Stderr, Truncate),
        "2>>" => (Stderr, Append),
        "&>" | "&>|" => (Both, Truncate),
        "&>>" => (Both, Append),
        _ => return None,
    };
    Some(op)
}

/// Pulls redirection operators and their targets out of `tokens`.
///
/// The remaining words keep their original order. Nothing is opened here;
/// see [`open`].
pub fn resolve(tokens: Vec<Token>) -> Result<RedirectionPlan, ParseError> {
    let mut plan = RedirectionPlan::default();
    let mut iter = tokens.into_iter();

    while let Some(token) = iter.next() {
        let Some((stream, mode)) = operator(token.as_str()) else {
            plan.args.push(token.into_string());
            continue;
        };
        let target = iter
            .next()
            .ok_or_else(|| ParseError::MissingRedirectionTarget(token.as_str().to_string()))?;
        plan.directives.push(RedirectionDirective {
            stream,
            mode,
            target: PathBuf::from(target.into_string()),
        });
    }

    tracing::debug!(args = ?plan.args, directives = ?plan.directives, "resolved redirections");
    Ok(plan)
}

#[derive(Debug, Error)]
#[error("{}: {source}", .path.display())]
pub struct RedirectionError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Output handles for a single command. A `Both` directive stores the same
/// `Rc` in both slots so the two streams share one file offset.
#[derive(Debug, Default)]
pub struct OpenRedirections {
    pub stdout: Option<Rc<File>>,
    pub stderr: Option<Rc<File>>,
}

/// Opens every directive in order. Each target is created (with its parent
/// directories); when a stream is redirected more than once the last one wins.
pub fn open(directives: &[RedirectionDirective]) -> Result<OpenRedirections, RedirectionError> {
    let mut opened = OpenRedirections::default();
    for directive in directives {
        let file = Rc::new(open_target(directive)?);
        match directive.stream {
            RedirectStream::Stdout => opened.stdout = Some(file),
            RedirectStream::Stderr => opened.stderr = Some(file),
            RedirectStream::Both => {
                opened.stdout = Some(Rc::clone(&file));
                opened.stderr = Some(file);
            }
        }
    }
    Ok(opened)
}

fn open_target(directive: &RedirectionDirective) -> Result<File, RedirectionError> {
    let path = &directive.target;
    let wrap = |source| RedirectionError { path: path.clone(), source };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true);
    match directive.mode {
        RedirectMode::Truncate => options.truncate(true),
        RedirectMode::Append => options.append(true),
    };
    options.open(path).map_err(wrap)
}
