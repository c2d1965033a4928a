//! Error Handling
//!
//! The interpreter's failure model: every operation either returns a
//! Value or sets the error slot. The slot carries a kind, a source
//! position, and a message.
//!
//! `return`/`result` are deliberately NOT represented here: they are
//! unwind-via-flags (`Environment::breakrun` + `Environment::retval_set`,
//! see `crate::environment`), never errors -- unwind is modeled as frame
//! flags rather than as Rust error values threaded with `?`, so only the
//! true failure shapes need a `thiserror` type here.

use std::fmt;

/// Error kind, not a type name: `FixHead` is a transient sentinel that
/// instructs the command dispatcher to patch the error's `position` to the
/// dispatch site before the error is allowed to keep propagating (so errors
/// raised deep inside a builtin's own argument-validation code point at the
/// call, not at whatever internal cursor position happened to be active).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Default,
    Unbalanced,
    FixHead,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct LittleError {
    pub kind: ErrorKind,
    pub position: usize,
    pub message: String,
}

impl LittleError {
    pub fn new(kind: ErrorKind, position: usize, message: impl Into<String>) -> Self {
        Self { kind, position, message: message.into() }
    }

    pub fn default_err(position: usize, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Default, position, message)
    }

    pub fn unbalanced(position: usize, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unbalanced, position, message)
    }

    /// Raised by a builtin that doesn't know its own dispatch position;
    /// `Interpreter::dispatch` rewrites the position once it knows where the
    /// call began.
    pub fn fix_head(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FixHead, 0, message)
    }

    pub fn fixed_to(mut self, position: usize) -> Self {
        if self.kind == ErrorKind::FixHead {
            self.kind = ErrorKind::Default;
            self.position = position;
        }
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Default => write!(f, "error"),
            ErrorKind::Unbalanced => write!(f, "unbalanced"),
            ErrorKind::FixHead => write!(f, "error"),
        }
    }
}

pub type EvalResult = Result<crate::value::Value, LittleError>;
