use rstest::rstest;

use openrosa_xpath::ResultType;
use openrosa_xpath::tree::{Document, XmlNode, doc, elem, text};

fn fixture() -> Document {
    Document::new(
        doc()
            .child(
                elem("r")
                    .child(elem("a").child(text("alpha")))
                    .child(elem("a").child(text("beta")))
                    .child(elem("empty")),
            )
            .build(),
    )
}

fn context(document: &Document, expr: &str) -> XmlNode {
    document.evaluate(expr).unwrap().nodes().unwrap()[0]
        .as_tree()
        .unwrap()
        .clone()
}

fn eval_string(expr: &str) -> String {
    let document = fixture();
    let r = context(&document, "r");
    document
        .evaluate_from(expr, &r, ResultType::String)
        .unwrap()
        .string_value()
        .unwrap()
        .to_string()
}

fn eval_bool(expr: &str) -> bool {
    let document = fixture();
    let r = context(&document, "r");
    document
        .evaluate_from(expr, &r, ResultType::Boolean)
        .unwrap()
        .boolean_value()
        .unwrap()
}

fn eval_number(expr: &str) -> f64 {
    let document = fixture();
    let r = context(&document, "r");
    document
        .evaluate_from(expr, &r, ResultType::Number)
        .unwrap()
        .number_value()
        .unwrap()
}

#[test]
fn concat_expands_every_node_of_a_set() {
    assert_eq!(eval_string("concat(a, '-')"), "alphabeta-");
    assert_eq!(eval_string("concat('x')"), "x");
    assert_eq!(eval_string("concat(1, 2, 3)"), "123");
}

#[rstest]
#[case("starts-with('abcd', 'ab')", true)]
#[case("starts-with('abcd', 'bc')", false)]
#[case("ends-with('abcd', 'cd')", true)]
#[case("ends-with('abcd', 'bc')", false)]
#[case("contains('abcd', 'bc')", true)]
#[case("contains('abcd', 'x')", false)]
fn haystack_needle_functions(#[case] expr: &str, #[case] expected: bool) {
    assert_eq!(eval_bool(expr), expected);
}

#[test]
fn substring_before_and_after() {
    assert_eq!(eval_string("substring-before('1999/04/01', '/')"), "1999");
    assert_eq!(eval_string("substring-after('1999/04/01', '/')"), "04/01");
    assert_eq!(eval_string("substring-before('abc', 'x')"), "");
    assert_eq!(eval_string("substring-after('abc', 'x')"), "");
}

#[rstest]
#[case("substring('12345', 2, 3)", "234")]
#[case("substring('12345', 2)", "2345")]
#[case("substring('12345', 1.5, 2.6)", "234")]
#[case("substring('12345', 0, 3)", "12")]
#[case("substring('12345', 0 div 0, 3)", "")]
#[case("substring('12345', 1, 0 div 0)", "")]
#[case("substring('12345', -42, 1 div 0)", "12345")]
fn substring_cases(#[case] expr: &str, #[case] expected: &str) {
    assert_eq!(eval_string(expr), expected);
}

#[rstest]
#[case("substr('hello', 0)", "hello")]
#[case("substr('hello', 1)", "ello")]
#[case("substr('hello', 1, 3)", "el")]
#[case("substr('hello', -2)", "lo")]
#[case("substr('hello', 0, -1)", "hell")]
#[case("substr('hello', 4, 2)", "")]
fn substr_cases(#[case] expr: &str, #[case] expected: &str) {
    assert_eq!(eval_string(expr), expected);
}

#[test]
fn string_length_and_normalize_space() {
    assert_eq!(eval_number("string-length('höla')"), 4.0);
    assert_eq!(eval_number("string-length('')"), 0.0);
    assert_eq!(eval_string("normalize-space('  a   b \t c ')"), "a b c");
}

#[test]
fn translate_maps_and_drops() {
    assert_eq!(eval_string("translate('bar', 'abc', 'ABC')"), "BAr");
    assert_eq!(eval_string("translate('--aaa--', 'abc-', 'ABC')"), "AAA");
    // First occurrence wins for duplicated source characters.
    assert_eq!(eval_string("translate('aaa', 'aa', 'xy')"), "xxx");
}

#[rstest]
#[case("selected('apple banana cherry', 'banana')", true)]
#[case("selected('apple banana cherry', 'ban')", false)]
#[case("selected('apple banana cherry', ' banana ')", true)]
#[case("selected('', 'x')", false)]
fn selected_cases(#[case] expr: &str, #[case] expected: bool) {
    assert_eq!(eval_bool(expr), expected);
}

#[test]
fn selected_at_picks_zero_based_tokens() {
    assert_eq!(eval_string("selected-at('a b c', 0)"), "a");
    assert_eq!(eval_string("selected-at('a b c', 2)"), "c");
    assert_eq!(eval_string("selected-at('a b c', 3)"), "");
    assert_eq!(eval_string("selected-at('a b c', -1)"), "");
}

#[test]
fn join_accepts_scalars_and_node_sets() {
    assert_eq!(eval_string("join(', ', a)"), "alpha, beta");
    assert_eq!(eval_string("join('-', 'x', 'y', 'z')"), "x-y-z");
    assert_eq!(eval_string("join('-')"), "");
}

#[test]
fn coalesce_takes_the_first_non_empty() {
    assert_eq!(eval_string("coalesce('', 'b')"), "b");
    assert_eq!(eval_string("coalesce('a', 'b')"), "a");
    assert_eq!(eval_string("coalesce(empty, 'fallback')"), "fallback");
}

#[test]
fn once_returns_existing_value_or_computes() {
    let document = fixture();
    let a = context(&document, "r/a");
    let filled = document
        .evaluate_from("once('new')", &a, ResultType::String)
        .unwrap();
    assert_eq!(filled.string_value().unwrap(), "alpha");

    let empty = context(&document, "r/empty");
    let fresh = document
        .evaluate_from("once('new')", &empty, ResultType::String)
        .unwrap();
    assert_eq!(fresh.string_value().unwrap(), "new");
    let nan = document
        .evaluate_from("once('NaN')", &empty, ResultType::String)
        .unwrap();
    assert_eq!(nan.string_value().unwrap(), "");
}

#[rstest]
#[case("regex('abcd', 'b.d')", true)]
#[case("regex('abcd', '^b')", false)]
#[case("regex('2012-02-03', '^\\d{4}')", true)]
fn regex_cases(#[case] expr: &str, #[case] expected: bool) {
    assert_eq!(eval_bool(expr), expected);
}

#[test]
fn uuid_is_v4_shaped() {
    let value = eval_string("uuid()");
    let re = fancy_regex::Regex::new(
        r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$",
    )
    .unwrap();
    assert!(re.is_match(&value).unwrap(), "not a v4 uuid: {value}");
    assert_ne!(value, eval_string("uuid()"));
}

#[test]
fn string_defaults_to_context() {
    let document = fixture();
    let a = context(&document, "r/a");
    let sv = document
        .evaluate_from("string()", &a, ResultType::String)
        .unwrap();
    assert_eq!(sv.string_value().unwrap(), "alpha");
}
