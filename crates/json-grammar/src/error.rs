//! Failure and error types for grammar application.
//!
//! A [`Failure`] is the local outcome of one rule at one position; enclosing
//! alternations inspect it and try their next branch. The exception is a
//! [fatal](Failure::is_fatal) failure such as exceeding the nesting limit,
//! which unwinds to the driver untouched. Only the driver turns the final
//! failure into a public [`ParseError`], adding line and column.

use thiserror::Error;

/// Why a rule did not match at a position.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FailureKind {
    /// A literal or character class did not match the next character.
    #[error("expected {expected}, found {found:?}")]
    Expected { expected: String, found: char },

    /// The rule needed more input than remained.
    #[error("expected {expected}, found end of input")]
    UnexpectedEnd { expected: String },

    /// Every branch of an ordered alternation failed without consuming input.
    #[error("expected one of {}", .expected.join(", "))]
    NoAlternative { expected: Vec<String> },

    /// Numeral text accepted by the grammar could not be converted.
    #[error("invalid number literal {0:?}")]
    InvalidNumber(String),

    /// A handle to a recursive grammar outlived the grammar itself.
    #[error("recursive grammar was dropped before use")]
    DetachedGrammar,

    /// Containers were nested deeper than the grammar allows.
    #[error("nesting exceeds the limit of {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// A rule that did not match, with the byte offset where it gave up.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub position: usize,
    pub kind: FailureKind,
}

impl Failure {
    /// Failure for a rule that wanted `expected` at `position`, reporting the
    /// character actually found there or end of input.
    pub fn expected(input: &str, position: usize, expected: impl Into<String>) -> Self {
        let expected = expected.into();
        let kind = match input.get(position..).and_then(|rest| rest.chars().next()) {
            Some(found) => FailureKind::Expected { expected, found },
            None => FailureKind::UnexpectedEnd { expected },
        };
        Failure { position, kind }
    }

    /// Descriptions of what would have matched, used to merge alternatives.
    pub(crate) fn expectations(&self) -> Vec<String> {
        match &self.kind {
            FailureKind::Expected { expected, .. } | FailureKind::UnexpectedEnd { expected } => {
                vec![expected.clone()]
            }
            FailureKind::NoAlternative { expected } => expected.clone(),
            FailureKind::InvalidNumber(_)
            | FailureKind::DetachedGrammar
            | FailureKind::NestingTooDeep { .. } => Vec::new(),
        }
    }

    /// Whether the failure ends the whole run. Fatal failures pass straight
    /// through alternations and repetitions instead of being retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, FailureKind::NestingTooDeep { .. })
    }
}

/// Errors returned by the public parsing entry points.
///
/// `line` and `column` are 1-based; `column` counts characters, not bytes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The grammar failed to match the input.
    #[error("parse error at line {line}, column {column}: {kind}")]
    Syntax {
        offset: usize,
        line: usize,
        column: usize,
        kind: FailureKind,
    },

    /// A value matched but non-whitespace input followed it
    /// (only reported by [`crate::parse_complete`]).
    #[error("unexpected trailing input at line {line}, column {column}")]
    TrailingInput {
        offset: usize,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    pub(crate) fn from_failure(input: &str, failure: Failure) -> Self {
        let (line, column) = line_column(input, failure.position);
        ParseError::Syntax {
            offset: failure.position,
            line,
            column,
            kind: failure.kind,
        }
    }

    pub(crate) fn trailing_input(input: &str, offset: usize) -> Self {
        let (line, column) = line_column(input, offset);
        ParseError::TrailingInput {
            offset,
            line,
            column,
        }
    }

    /// Byte offset into the input where the error was detected.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::Syntax { offset, .. } | ParseError::TrailingInput { offset, .. } => *offset,
        }
    }
}

fn line_column(input: &str, offset: usize) -> (usize, usize) {
    let before = input.get(..offset).unwrap_or(input);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// Convenience alias used throughout json-grammar.
pub type Result<T> = std::result::Result<T, ParseError>;
