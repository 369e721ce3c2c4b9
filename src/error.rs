//! Error types of the generator pipeline.
//!
//! Scanning and assembly fail with a [`ParseError`] carrying the position of
//! the offending declaration; emission fails with a [`GenerationError`].
//! Both abort the run before any output is written.

use std::fmt;

use crate::spec::Position;

/// A scanning or assembly failure at a source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub pos: Position,
    pub message: String,
}

impl ParseError {
    pub fn new(pos: Position, message: impl Into<String>) -> Self {
        ParseError {
            pos,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pos, self.message)
    }
}

impl std::error::Error for ParseError {}

/// A failure while rendering code for an assembled package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// A rule applied to a field kind it has no semantics for.
    Unsupported { pos: Position, message: String },
    /// The underlying writer rejected output.
    Write(fmt::Error),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Unsupported { pos, message } => write!(f, "{pos}: {message}"),
            GenerationError::Write(err) => write!(f, "can't write generated code: {err}"),
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerationError::Write(err) => Some(err),
            GenerationError::Unsupported { .. } => None,
        }
    }
}

impl From<fmt::Error> for GenerationError {
    fn from(err: fmt::Error) -> Self {
        GenerationError::Write(err)
    }
}
