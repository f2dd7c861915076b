/// Property-based tests for the JSON grammar.
///
/// Uses `proptest` to generate random syntax trees, render them as text and
/// check that the grammar reads back exactly the tree it was given.
///
/// Strategies generate:
/// - Strings from a character set that includes both quote characters but no
///   backslash (a rendered `\` followed by `"` would read back as an escape)
/// - Integers and short decimals, which render without exponents
/// - Arrays and objects nested up to four levels, with duplicate keys allowed
/// - Runs of up to a few thousand opening brackets, closed or left open, to
///   cover nesting on both sides of the depth limit
use json_grammar::{
    json_value, parse, parse_prefix, run, FailureKind, JsonValue, KeyValuePair, ParseError,
    MAX_DEPTH,
};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 _:,\\[\\]{}\"'\u{e9}\u{2713}-]{0,12}").unwrap()
}

fn arb_number() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-1_000_000i64..1_000_000i64).prop_map(|n| n as f64),
        (-1_000_000i64..1_000_000i64, 1u32..4u32)
            .prop_map(|(mantissa, places)| mantissa as f64 / 10f64.powi(places as i32)),
    ]
}

fn arb_leaf() -> impl Strategy<Value = JsonValue> {
    prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::Bool),
        arb_number().prop_map(JsonValue::Number),
        arb_text().prop_map(JsonValue::String),
    ]
}

fn arb_value() -> impl Strategy<Value = JsonValue> {
    arb_leaf().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(JsonValue::Array),
            prop::collection::vec((arb_text(), inner), 0..4).prop_map(|members| {
                JsonValue::Object(
                    members
                        .into_iter()
                        .map(|(key, value)| KeyValuePair::new(key, value))
                        .collect(),
                )
            }),
        ]
    })
}

fn arb_openers() -> impl Strategy<Value = Vec<&'static str>> {
    let opener = || prop::sample::select(vec!["[", r#"{"k":"#]);
    prop_oneof![
        prop::collection::vec(opener(), 0..=MAX_DEPTH),
        prop::collection::vec(opener(), MAX_DEPTH + 1..3_000),
    ]
}

fn closers(openers: &[&str]) -> String {
    openers
        .iter()
        .rev()
        .map(|opener| if *opener == "[" { ']' } else { '}' })
        .collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn compact_text_reads_back(value in arb_value()) {
        let text = value.to_string();
        let success = parse_prefix(&text).unwrap();
        prop_assert!(success.is_complete(), "left over: {:?}", success.rest());
        prop_assert_eq!(success.value, value);
    }

    #[test]
    fn pretty_printed_text_reads_back(value in arb_value()) {
        let text = serde_json::to_string_pretty(&value).unwrap();
        prop_assert_eq!(parse(&text).unwrap(), value);
    }

    #[test]
    fn whitespace_inside_containers_is_insignificant(items in prop::collection::vec(arb_leaf(), 0..6)) {
        let value = JsonValue::Array(items);
        let compact = value.to_string();
        let spaced = compact.replacen('[', " [ \n", 1);
        prop_assert_eq!(parse(&spaced).unwrap(), value);
    }

    #[test]
    fn repeated_runs_agree(value in arb_value()) {
        let grammar = json_value();
        let text = value.to_string();
        let first = run(&grammar, &text).map(|s| s.value);
        let second = run(&grammar, &text).map(|s| s.value);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn arbitrary_input_never_panics(input in any::<String>()) {
        let _ = parse(&input);
    }

    #[test]
    fn unclosed_nesting_always_fails(openers in arb_openers()) {
        match parse(&openers.concat()) {
            Err(ParseError::Syntax { kind: FailureKind::NestingTooDeep { .. }, .. }) => {
                prop_assert!(openers.len() > MAX_DEPTH);
            }
            Err(_) => prop_assert!(openers.len() <= MAX_DEPTH),
            Ok(value) => prop_assert!(false, "unclosed input parsed as {:?}", value),
        }
    }

    #[test]
    fn closed_nesting_parses_up_to_the_limit(openers in arb_openers()) {
        let input = format!("{}null{}", openers.concat(), closers(&openers));
        prop_assert_eq!(parse(&input).is_ok(), openers.len() <= MAX_DEPTH);
    }
}
