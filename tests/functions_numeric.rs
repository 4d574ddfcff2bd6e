use rstest::rstest;

use openrosa_xpath::ResultType;
use openrosa_xpath::tree::{Document, doc, elem, text};

fn document() -> Document {
    Document::new(
        doc()
            .child(
                elem("r")
                    .child(elem("n").child(text("3")))
                    .child(elem("n").child(text("7")))
                    .child(elem("n").child(text("5"))),
            )
            .build(),
    )
}

fn eval_number(expr: &str) -> f64 {
    let d = document();
    let r = d.evaluate("r").unwrap().nodes().unwrap()[0]
        .as_tree()
        .unwrap()
        .clone();
    d.evaluate_from(expr, &r, ResultType::Number)
        .unwrap()
        .number_value()
        .unwrap()
}

fn eval_string(expr: &str) -> String {
    let d = document();
    let r = d.evaluate("r").unwrap().nodes().unwrap()[0]
        .as_tree()
        .unwrap()
        .clone();
    d.evaluate_from(expr, &r, ResultType::String)
        .unwrap()
        .string_value()
        .unwrap()
        .to_string()
}

fn eval_bool(expr: &str) -> bool {
    let d = document();
    let r = d.evaluate("r").unwrap().nodes().unwrap()[0]
        .as_tree()
        .unwrap()
        .clone();
    d.evaluate_from(expr, &r, ResultType::Boolean)
        .unwrap()
        .boolean_value()
        .unwrap()
}

#[rstest]
#[case("round(1.2345, 2)", 1.23)]
#[case("round(1.2355, 2)", 1.24)]
#[case("round(1.5)", 2.0)]
#[case("round(-0.5)", 0.0)]
#[case("round(1234.5678, -2)", 1200.0)]
#[case("int(-1.7)", -1.0)]
#[case("int(1.7)", 1.0)]
#[case("int('7.9')", 7.0)]
#[case("floor(1.9)", 1.0)]
#[case("ceiling(1.1)", 2.0)]
#[case("abs(-4.5)", 4.5)]
fn rounding_family(#[case] expr: &str, #[case] expected: f64) {
    assert_eq!(eval_number(expr), expected);
}

#[test]
fn arithmetic_follows_ieee() {
    assert_eq!(eval_number("7 mod 2"), 1.0);
    assert_eq!(eval_number("-7 mod 2"), -1.0);
    assert_eq!(eval_number("4.5 mod 1.5"), 0.0);
    assert_eq!(eval_number("10 div 4"), 2.5);
    assert_eq!(eval_string("1 div 0"), "Infinity");
    assert_eq!(eval_string("-1 div 0"), "-Infinity");
    assert_eq!(eval_string("0 div 0"), "NaN");
    assert_eq!(eval_number("2 + 3 * 4"), 14.0);
    assert_eq!(eval_number("-n[1] + 1"), -2.0);
}

#[test]
fn canonical_number_strings() {
    assert_eq!(eval_string("string(5)"), "5");
    assert_eq!(eval_string("string(5.0)"), "5");
    assert_eq!(eval_string("string(-0)"), "0");
    assert_eq!(eval_string("string(0.5)"), "0.5");
    assert_eq!(eval_string("string(-42)"), "-42");
    // Idempotence of the canonical form.
    assert_eq!(
        eval_string("string(number(string(number('12.5'))))"),
        "12.5"
    );
}

#[test]
fn boolean_number_round_trips() {
    assert!(eval_bool("not(not(true()))"));
    assert!(!eval_bool("not(not(false()))"));
    assert!(eval_bool("boolean(number(true()))"));
    assert!(!eval_bool("boolean(number(false()))"));
    assert!(!eval_bool("boolean(0 div 0)"));
    assert!(eval_bool("boolean(-1)"));
}

#[test]
fn number_conversions() {
    assert_eq!(eval_number("number('  12.5 ')"), 12.5);
    assert!(eval_number("number('12px')").is_nan());
    assert!(eval_number("number('1e3')").is_nan());
    assert_eq!(eval_number("number(true())"), 1.0);
    assert_eq!(eval_number("number(n[2])"), 7.0);
}

#[test]
fn min_max_mix_scalars_and_node_sets() {
    assert_eq!(eval_number("min(n)"), 3.0);
    assert_eq!(eval_number("max(n)"), 7.0);
    assert_eq!(eval_number("min(n, 1)"), 1.0);
    assert_eq!(eval_number("max(n, 11, '9')"), 11.0);
    assert!(eval_number("min(n, 'x')").is_nan());
    assert!(eval_number("min(missing)").is_nan());
}

#[rstest]
#[case("pow(2, 10)", 1024.0)]
#[case("pow(4, 0.5)", 2.0)]
#[case("sqrt(81)", 9.0)]
#[case("exp10(3)", 1000.0)]
#[case("log10(1000)", 3.0)]
#[case("atan2(0, 1)", 0.0)]
fn power_family(#[case] expr: &str, #[case] expected: f64) {
    assert!((eval_number(expr) - expected).abs() < 1e-9);
}

#[test]
fn trig_and_pi() {
    assert!((eval_number("pi()") - std::f64::consts::PI).abs() < 1e-12);
    assert!((eval_number("sin(pi() div 2)") - 1.0).abs() < 1e-12);
    assert!((eval_number("cos(0)") - 1.0).abs() < 1e-12);
    assert!((eval_number("log(exp(1))") - 1.0).abs() < 1e-12);
}

#[test]
fn random_is_bounded_and_rounded() {
    for _ in 0..20 {
        let v = eval_number("random()");
        assert!((0.0..1.0).contains(&v));
        assert_eq!((v * 1e15).round() / 1e15, v);
    }
}

#[test]
fn sum_over_node_set() {
    assert_eq!(eval_number("sum(n)"), 15.0);
    assert_eq!(eval_number("sum(missing)"), 0.0);
}
