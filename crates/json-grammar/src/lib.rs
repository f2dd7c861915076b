//! # json-grammar
//!
//! Strict JSON recognized by a recursive parser-combinator grammar.
//!
//! The grammar is built from small composable rules (literals, sequencing,
//! ordered alternation, repetition) and produces a tagged syntax tree,
//! [`JsonValue`]. The value rule refers to itself through arrays and objects;
//! it is defined with [`combinator::recursive`] and assembled on first use.
//!
//! ## Quick start
//!
//! ```rust
//! use json_grammar::{parse, JsonValue, KeyValuePair};
//!
//! let tree = parse(r#"{"a": 1, "b": [true, null]}"#).unwrap();
//! assert_eq!(
//!     tree,
//!     JsonValue::Object(vec![
//!         KeyValuePair::new("a", JsonValue::Number(1.0)),
//!         KeyValuePair::new(
//!             "b",
//!             JsonValue::Array(vec![JsonValue::Bool(true), JsonValue::Null]),
//!         ),
//!     ])
//! );
//! ```
//!
//! [`parse`] matches the longest valid value at the start of the input and
//! ignores whatever follows it. Use [`parse_prefix`] to see how much input was
//! consumed, or [`parse_complete`] to reject trailing input.
//!
//! ## Modules
//!
//! - [`combinator`] — `Parser<T>` and the combinators grammars are built from
//! - [`grammar`] — the JSON rules
//! - [`value`] — `JsonValue` syntax tree
//! - [`error`] — failure kinds and the public `ParseError`

pub mod combinator;
pub mod error;
pub mod grammar;
pub mod value;

use std::sync::LazyLock;

pub use combinator::{run, Parser, Success};
pub use error::{Failure, FailureKind, ParseError, Result};
pub use grammar::{json_value, MAX_DEPTH};
pub use value::{JsonValue, KeyValuePair};

static GRAMMAR: LazyLock<Parser<JsonValue>> = LazyLock::new(json_value);

/// Parse the JSON value at the start of `input`.
///
/// Input after the value is ignored, so `"1 garbage"` parses as `1`.
pub fn parse(input: &str) -> Result<JsonValue> {
    parse_prefix(input).map(|success| success.value)
}

/// Parse the JSON value at the start of `input`, reporting how much of the
/// input it covered.
pub fn parse_prefix(input: &str) -> Result<Success<'_, JsonValue>> {
    run(&*GRAMMAR, input)
}

/// Parse `input` as a single JSON value, rejecting anything but whitespace
/// after it.
pub fn parse_complete(input: &str) -> Result<JsonValue> {
    let success = parse_prefix(input)?;
    let trailing = success.rest().trim_start();
    if trailing.is_empty() {
        Ok(success.value)
    } else {
        Err(ParseError::trailing_input(
            input,
            input.len() - trailing.len(),
        ))
    }
}
