//! The JSON grammar, assembled from the combinators in [`crate::combinator`].
//!
//! ```text
//! value      = number | boolean | null | string | array | object
//! number     = scientific | float | int
//! scientific = (float | int) ("e" | "E") (float | int)
//! float      = sign? digits "." digits
//! int        = sign? digits
//! string     = '"' (escaped-quote | not-'"')* '"'
//! array      = ws "[" ws  (value (ws "," ws value)*)?  ws "]" ws
//! object     = ws "{" ws  (member (ws "," ws member)*)?  ws "}" ws
//! member     = ws string ws ":" ws value ws
//! ```
//!
//! `value` refers to itself through `array` and `object`, so it is defined
//! with [`recursive`] and only assembled the first time it runs. At most
//! [`MAX_DEPTH`] arrays and objects may be open at once; the next opening
//! bracket fails with [`FailureKind::NestingTooDeep`] right after it, instead
//! of recursing until the stack runs out.
//!
//! Alternatives are tried in the order written. `scientific` comes before
//! `float` and `int` so `1.5e3` is not read as `1` followed by leftovers.
//!
//! Strings understand a single escape: a backslash followed by `"` or `'`
//! becomes the bare quote. Any other backslash, including `\n` and `\\`, is
//! kept verbatim.

use crate::combinator::{
    between, char, choice, digits, literal, many, nesting_limit, none_of, one_of, possibly,
    recursive, sep_by, sequence, surrounded_by_whitespace, Parser,
};
use crate::error::FailureKind;
use crate::value::{JsonValue, KeyValuePair};

/// Build the grammar for a JSON value.
///
/// Each call builds an independent grammar graph. Leading whitespace is only
/// accepted in front of arrays and objects, and trailing input is left
/// unconsumed.
pub fn json_value() -> Parser<JsonValue> {
    recursive(|value| {
        choice(vec![
            number(),
            boolean(),
            null(),
            string(),
            array(value.clone()),
            object(value),
        ])
    })
}

/// How many arrays and objects may be open at once.
pub const MAX_DEPTH: usize = 128;

/// Numeral text as matched, before conversion to `f64`.
#[derive(Debug, Clone, PartialEq)]
enum Numeral {
    Int(String),
    Float(String),
    Scientific { mantissa: String, exponent: String },
}

impl Numeral {
    fn to_f64(&self) -> Result<f64, FailureKind> {
        match self {
            Numeral::Int(text) | Numeral::Float(text) => parse_f64(text),
            // A fractional exponent such as `2e0.5` is valid here but not in
            // Rust's float syntax: scale by the integral part in the parse and
            // by 10^fraction, which lies in (0.1, 10), afterwards.
            Numeral::Scientific { mantissa, exponent } => match exponent.split_once('.') {
                Some((whole, fraction)) => {
                    let scaled = parse_f64(&format!("{mantissa}e{whole}"))?;
                    let mut fraction = parse_f64(&format!("0.{fraction}"))?;
                    if whole.starts_with('-') {
                        fraction = -fraction;
                    }
                    Ok(scaled * 10f64.powf(fraction))
                }
                None => parse_f64(&format!("{mantissa}e{exponent}")),
            },
        }
    }
}

fn parse_f64(text: &str) -> Result<f64, FailureKind> {
    text.parse::<f64>()
        .map_err(|_| FailureKind::InvalidNumber(text.to_string()))
}

fn sign() -> Parser<Option<char>> {
    possibly(one_of("+-"))
}

fn int() -> Parser<String> {
    sequence((sign(), digits())).map(|(sign, whole)| match sign {
        Some(sign) => format!("{sign}{whole}"),
        None => whole,
    })
}

fn float() -> Parser<String> {
    sequence((sign(), digits(), char('.'), digits())).map(|(sign, whole, _, fraction)| {
        let sign = sign.map(String::from).unwrap_or_default();
        format!("{sign}{whole}.{fraction}")
    })
}

fn scientific() -> Parser<Numeral> {
    sequence((
        choice(vec![float(), int()]),
        one_of("eE"),
        choice(vec![float(), int()]),
    ))
    .map(|(mantissa, _, exponent)| Numeral::Scientific { mantissa, exponent })
}

fn number() -> Parser<JsonValue> {
    choice(vec![
        scientific(),
        float().map(Numeral::Float),
        int().map(Numeral::Int),
    ])
    .try_map(|numeral| numeral.to_f64().map(JsonValue::Number))
}

fn boolean() -> Parser<JsonValue> {
    choice(vec![literal("true"), literal("false")]).map(|word| JsonValue::Bool(word == "true"))
}

fn null() -> Parser<JsonValue> {
    literal("null").map(|_| JsonValue::Null)
}

fn escaped_quote() -> Parser<char> {
    sequence((char('\\'), one_of("\"'"))).map(|(_, quote)| quote)
}

fn string_literal() -> Parser<String> {
    between(
        char('"'),
        char('"'),
        many(choice(vec![escaped_quote(), none_of("\"")])),
    )
    .map(|chars| chars.into_iter().collect::<String>())
}

fn string() -> Parser<JsonValue> {
    string_literal().map(JsonValue::String)
}

fn comma_separated<T: 'static>(element: Parser<T>) -> Parser<Vec<T>> {
    sep_by(surrounded_by_whitespace(char(',')), element)
}

/// `open`, then `contents` and `close` counted as one nesting level.
fn container<T: 'static>(open: char, close: char, contents: Parser<T>) -> Parser<T> {
    sequence((
        surrounded_by_whitespace(char(open)),
        nesting_limit(
            MAX_DEPTH,
            sequence((contents, surrounded_by_whitespace(char(close)))),
        ),
    ))
    .map(|(_, (contents, _))| contents)
}

fn array(value: Parser<JsonValue>) -> Parser<JsonValue> {
    container('[', ']', comma_separated(value)).map(JsonValue::Array)
}

fn key_value(value: Parser<JsonValue>) -> Parser<KeyValuePair> {
    surrounded_by_whitespace(sequence((
        string_literal(),
        surrounded_by_whitespace(char(':')),
        value,
    )))
    .map(|(key, _, value)| KeyValuePair { key, value })
}

fn object(value: Parser<JsonValue>) -> Parser<JsonValue> {
    container('{', '}', comma_separated(key_value(value))).map(JsonValue::Object)
}
