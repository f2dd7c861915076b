//! A small parser-combinator toolkit.
//!
//! A [`Parser<T>`] is an immutable, cheaply clonable rule: given the input and
//! a byte offset it either succeeds with a `T` and the offset after the match,
//! or returns a [`Failure`]. Failures are local: nothing a failed rule did is
//! visible to the caller, so an enclosing [`choice`] simply retries its next
//! branch from the same offset. Only [fatal](Failure::is_fatal) failures skip
//! the retry and end the run.
//!
//! Grammars are built by composing the matchers ([`literal`], [`char()`],
//! [`one_of`], [`none_of`], [`digits`], [`whitespace`]) with the combinators
//! ([`sequence`], [`choice`], [`many`], [`sep_by`], [`between`], [`possibly`],
//! [`Parser::map`]). Self-referential grammars go through [`recursive`], with
//! [`nesting_limit`] bounding how deep they may go, and [`run`] drives a
//! grammar over a whole input.

use std::cell::Cell;
use std::sync::{Arc, OnceLock, Weak};

use tracing::{debug, trace};

use crate::error::{Failure, FailureKind, ParseError, Result};

/// Outcome of applying a rule at one offset: the value and the next offset.
pub type Step<T> = std::result::Result<(T, usize), Failure>;

type ParseFn<T> = dyn Fn(&str, usize) -> Step<T> + Send + Sync;

/// A composable grammar rule producing values of type `T`.
pub struct Parser<T> {
    run: Arc<ParseFn<T>>,
}

impl<T> Clone for Parser<T> {
    fn clone(&self) -> Self {
        Parser {
            run: Arc::clone(&self.run),
        }
    }
}

impl<T> std::fmt::Debug for Parser<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Parser")
    }
}

impl<T: 'static> Parser<T> {
    /// Wrap a matching function. `position` is always on a char boundary.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, usize) -> Step<T> + Send + Sync + 'static,
    {
        Parser { run: Arc::new(f) }
    }

    /// Apply the rule to `input` starting at byte offset `position`.
    pub fn apply(&self, input: &str, position: usize) -> Step<T> {
        (self.run)(input, position)
    }

    /// Transform a successful result. Success and failure are unchanged.
    pub fn map<U, F>(self, f: F) -> Parser<U>
    where
        U: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        Parser::new(move |input, position| {
            self.apply(input, position)
                .map(|(value, next)| (f(value), next))
        })
    }

    /// Transform a successful result with a conversion that may reject it.
    /// A rejection is reported at the offset where the rule started.
    pub fn try_map<U, F>(self, f: F) -> Parser<U>
    where
        U: 'static,
        F: Fn(T) -> std::result::Result<U, FailureKind> + Send + Sync + 'static,
    {
        Parser::new(move |input, position| {
            let (value, next) = self.apply(input, position)?;
            f(value)
                .map(|converted| (converted, next))
                .map_err(|kind| Failure { position, kind })
        })
    }
}

fn peek(input: &str, position: usize) -> Option<char> {
    input.get(position..).and_then(|rest| rest.chars().next())
}

/// Match the exact string `expected`.
pub fn literal(expected: &'static str) -> Parser<&'static str> {
    Parser::new(move |input, position| {
        let rest = input.get(position..).unwrap_or("");
        if rest.starts_with(expected) {
            return Ok((expected, position + expected.len()));
        }
        let label = format!("{expected:?}");
        if expected.starts_with(rest) {
            // input ran out partway through the literal
            return Err(Failure {
                position,
                kind: FailureKind::UnexpectedEnd { expected: label },
            });
        }
        Err(Failure::expected(input, position, label))
    })
}

/// Match the single character `c`.
pub fn char(c: char) -> Parser<char> {
    satisfy(format!("{c:?}"), move |found| found == c)
}

/// Match any one character contained in `set`.
pub fn one_of(set: &'static str) -> Parser<char> {
    satisfy(format!("one of {set:?}"), move |found| set.contains(found))
}

/// Match any one character not contained in `excluded`.
pub fn none_of(excluded: &'static str) -> Parser<char> {
    satisfy(format!("any character except {excluded:?}"), move |found| {
        !excluded.contains(found)
    })
}

fn satisfy<F>(label: String, predicate: F) -> Parser<char>
where
    F: Fn(char) -> bool + Send + Sync + 'static,
{
    Parser::new(move |input, position| match peek(input, position) {
        Some(c) if predicate(c) => Ok((c, position + c.len_utf8())),
        _ => Err(Failure::expected(input, position, label.as_str())),
    })
}

/// Match one or more ASCII digits.
pub fn digits() -> Parser<String> {
    Parser::new(|input, position| {
        let rest = input.get(position..).unwrap_or("");
        let len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if len == 0 {
            return Err(Failure::expected(input, position, "digit"));
        }
        Ok((rest[..len].to_string(), position + len))
    })
}

/// Match zero or more whitespace characters. Never fails.
pub fn whitespace() -> Parser<String> {
    Parser::new(|input, position| {
        let rest = input.get(position..).unwrap_or("");
        let len: usize = rest
            .chars()
            .take_while(|c| c.is_whitespace())
            .map(char::len_utf8)
            .sum();
        Ok((rest[..len].to_string(), position + len))
    })
}

/// A fixed-size group of parsers applied one after another.
///
/// Implemented for tuples of two to four parsers; the output is the tuple of
/// their results.
pub trait Sequence {
    type Output;

    fn apply_all(&self, input: &str, position: usize) -> Step<Self::Output>;
}

macro_rules! impl_sequence {
    ($($p:ident: $t:ident),+) => {
        impl<$($t: 'static),+> Sequence for ($(Parser<$t>,)+) {
            type Output = ($($t,)+);

            fn apply_all(&self, input: &str, position: usize) -> Step<Self::Output> {
                let ($($p,)+) = self;
                let mut position = position;
                $(
                    let ($p, next) = $p.apply(input, position)?;
                    position = next;
                )+
                Ok((($($p,)+), position))
            }
        }
    };
}

impl_sequence!(a: A, b: B);
impl_sequence!(a: A, b: B, c: C);
impl_sequence!(a: A, b: B, c: C, d: D);

/// Ordered conjunction: every member must match, in order.
pub fn sequence<S>(parsers: S) -> Parser<S::Output>
where
    S: Sequence + Send + Sync + 'static,
    S::Output: 'static,
{
    Parser::new(move |input, position| parsers.apply_all(input, position))
}

/// Ordered alternation: the first member to succeed wins.
///
/// On failure, reports the branch that got furthest into the input (the
/// last-tried one on ties). When no branch got past `position`, the failure is
/// [`FailureKind::NoAlternative`] listing what each branch expected. A fatal
/// failure is returned as soon as a branch reports it.
pub fn choice<T: 'static>(parsers: Vec<Parser<T>>) -> Parser<T> {
    Parser::new(move |input, position| {
        let mut furthest: Option<Failure> = None;
        let mut expected: Vec<String> = Vec::new();
        for parser in &parsers {
            let failure = match parser.apply(input, position) {
                Ok(success) => return Ok(success),
                Err(failure) if failure.is_fatal() => return Err(failure),
                Err(failure) => failure,
            };
            if failure.position == position {
                for label in failure.expectations() {
                    if !expected.contains(&label) {
                        expected.push(label);
                    }
                }
            }
            if furthest
                .as_ref()
                .is_none_or(|best| failure.position >= best.position)
            {
                furthest = Some(failure);
            }
        }
        match furthest {
            Some(failure) if failure.position > position => Err(failure),
            _ => Err(Failure {
                position,
                kind: FailureKind::NoAlternative { expected },
            }),
        }
    })
}

/// Zero or more repetitions. Stops on a zero-width match and fails only on a
/// fatal failure.
pub fn many<T: 'static>(parser: Parser<T>) -> Parser<Vec<T>> {
    Parser::new(move |input, mut position| {
        let mut items = Vec::new();
        loop {
            match parser.apply(input, position) {
                Ok((_, next)) if next == position => break,
                Ok((item, next)) => {
                    items.push(item);
                    position = next;
                }
                Err(failure) if failure.is_fatal() => return Err(failure),
                Err(_) => break,
            }
        }
        Ok((items, position))
    })
}

/// Zero or more `parser` matches separated by `separator`, keeping only the
/// `parser` results.
///
/// Once a separator has been consumed an element is required, so a trailing
/// separator fails the whole list.
pub fn sep_by<S, T>(separator: Parser<S>, parser: Parser<T>) -> Parser<Vec<T>>
where
    S: 'static,
    T: 'static,
{
    Parser::new(move |input, start| {
        let mut items = Vec::new();
        let (first, mut position) = match parser.apply(input, start) {
            Ok(success) => success,
            Err(failure) if failure.is_fatal() => return Err(failure),
            Err(_) => return Ok((items, start)),
        };
        items.push(first);
        loop {
            let after_separator = match separator.apply(input, position) {
                Ok((_, next)) => next,
                Err(failure) if failure.is_fatal() => return Err(failure),
                Err(_) => break,
            };
            let (item, next) = parser.apply(input, after_separator)?;
            items.push(item);
            position = next;
        }
        Ok((items, position))
    })
}

/// `open`, then `parser`, then `close`; yields only the `parser` result.
pub fn between<O, C, T>(open: Parser<O>, close: Parser<C>, parser: Parser<T>) -> Parser<T>
where
    O: 'static,
    C: 'static,
    T: 'static,
{
    sequence((open, parser, close)).map(|(_, value, _)| value)
}

/// Zero or one occurrence. Fails only on a fatal failure.
pub fn possibly<T: 'static>(parser: Parser<T>) -> Parser<Option<T>> {
    Parser::new(move |input, position| match parser.apply(input, position) {
        Ok((value, next)) => Ok((Some(value), next)),
        Err(failure) if failure.is_fatal() => Err(failure),
        Err(_) => Ok((None, position)),
    })
}

/// Allow whitespace before and after `parser`, discarding it.
pub fn surrounded_by_whitespace<T: 'static>(parser: Parser<T>) -> Parser<T> {
    between(whitespace(), whitespace(), parser)
}

type Builder<T> = dyn Fn(Parser<T>) -> Parser<T> + Send + Sync;

struct Deferred<T> {
    builder: Box<Builder<T>>,
    grammar: OnceLock<Parser<T>>,
}

impl<T: 'static> Deferred<T> {
    fn resolve(self: &Arc<Self>) -> &Parser<T> {
        self.grammar.get_or_init(|| {
            trace!("building deferred grammar");
            (self.builder)(handle(Arc::downgrade(self)))
        })
    }
}

fn handle<T: 'static>(deferred: Weak<Deferred<T>>) -> Parser<T> {
    Parser::new(move |input, position| match deferred.upgrade() {
        Some(deferred) => deferred.resolve().apply(input, position),
        None => Err(Failure {
            position,
            kind: FailureKind::DetachedGrammar,
        }),
    })
}

/// Define a self-referential grammar.
///
/// `builder` receives a handle standing for the grammar being defined and
/// returns its definition. The builder runs once, on the first application,
/// so rules that mention the handle can be constructed before the definition
/// exists. The handle must only be stored inside the returned grammar; it is
/// a weak reference and fails with [`FailureKind::DetachedGrammar`] once the
/// returned parser and all its clones are dropped.
pub fn recursive<T, F>(builder: F) -> Parser<T>
where
    T: 'static,
    F: Fn(Parser<T>) -> Parser<T> + Send + Sync + 'static,
{
    let deferred = Arc::new(Deferred {
        builder: Box::new(builder),
        grammar: OnceLock::new(),
    });
    Parser::new(move |input, position| deferred.resolve().apply(input, position))
}

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct DepthGuard;

impl DepthGuard {
    fn enter(limit: usize) -> Option<Self> {
        DEPTH.with(|depth| {
            if depth.get() >= limit {
                return None;
            }
            depth.set(depth.get() + 1);
            Some(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Bound how deeply `parser` may be re-entered while it is already running.
///
/// Each application counts as one level for as long as it runs. Once `limit`
/// levels are active on the current thread, a further application fails with
/// the fatal [`FailureKind::NestingTooDeep`] without calling `parser`, so a
/// self-referential grammar cannot recurse without bound on hostile input.
pub fn nesting_limit<T: 'static>(limit: usize, parser: Parser<T>) -> Parser<T> {
    Parser::new(move |input, position| {
        let Some(_level) = DepthGuard::enter(limit) else {
            trace!(limit, position, "nesting limit reached");
            return Err(Failure {
                position,
                kind: FailureKind::NestingTooDeep { limit },
            });
        };
        parser.apply(input, position)
    })
}

/// A successful run of a grammar over an input.
#[derive(Debug, Clone, PartialEq)]
pub struct Success<'a, T> {
    pub value: T,
    /// Byte offset just past the matched prefix.
    pub consumed: usize,
    input: &'a str,
}

impl<'a, T> Success<'a, T> {
    /// Input left over after the matched prefix.
    pub fn rest(&self) -> &'a str {
        &self.input[self.consumed..]
    }

    /// Whether the grammar matched the entire input.
    pub fn is_complete(&self) -> bool {
        self.consumed == self.input.len()
    }
}

/// Apply `parser` to `input` from offset 0.
///
/// The grammar may stop before the end of the input; inspect
/// [`Success::rest`] to find out what was left over.
pub fn run<'a, T: 'static>(parser: &Parser<T>, input: &'a str) -> Result<Success<'a, T>> {
    match parser.apply(input, 0) {
        Ok((value, consumed)) => {
            debug!(input_len = input.len(), consumed, "grammar matched");
            Ok(Success {
                value,
                consumed,
                input,
            })
        }
        Err(failure) => {
            debug!(
                input_len = input.len(),
                position = failure.position,
                "grammar failed"
            );
            Err(ParseError::from_failure(input, failure))
        }
    }
}
