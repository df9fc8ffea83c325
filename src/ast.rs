use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectStream {
    Stdout,
    Stderr,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    Truncate,
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectionDirective {
    pub stream: RedirectStream,
    pub mode: RedirectMode,
    pub target: PathBuf,
}

/// Residual argument vector plus the redirections that apply to it, in the
/// order they appeared on the line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RedirectionPlan {
    pub args: Vec<String>,
    pub directives: Vec<RedirectionDirective>,
}

impl RedirectionPlan {
    pub fn name(&self) -> Option<&str> {
        self.args.first().map(|s| s.as_str())
    }

    pub fn arguments(&self) -> &[String] {
        self.args.get(1..).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}
