use rstest::rstest;

use openrosa_xpath::ResultType;
use openrosa_xpath::tree::{Document, XmlNode, doc, elem, text};

fn fixture() -> Document {
    Document::new(
        doc()
            .child(
                elem("r")
                    .child(elem("w").child(text("yes")))
                    .child(elem("w").child(text("yes")))
                    .child(elem("w"))
                    .child(elem("v").child(text("2")))
                    .child(elem("v").child(text("5")))
                    .child(elem("v").child(text("4"))),
            )
            .build(),
    )
}

fn context(document: &Document) -> XmlNode {
    document.evaluate("r").unwrap().nodes().unwrap()[0]
        .as_tree()
        .unwrap()
        .clone()
}

fn eval_bool(expr: &str) -> bool {
    let document = fixture();
    let r = context(&document);
    document
        .evaluate_from(expr, &r, ResultType::Boolean)
        .unwrap()
        .boolean_value()
        .unwrap()
}

fn eval_string(expr: &str) -> String {
    let document = fixture();
    let r = context(&document);
    document
        .evaluate_from(expr, &r, ResultType::String)
        .unwrap()
        .string_value()
        .unwrap()
        .to_string()
}

#[rstest]
#[case("boolean-from-string('true')", true)]
#[case("boolean-from-string('TRUE')", true)]
#[case("boolean-from-string('1')", true)]
#[case("boolean-from-string('yes')", false)]
#[case("boolean-from-string('0')", false)]
#[case("boolean-from-string('')", false)]
fn boolean_from_string_cases(#[case] expr: &str, #[case] expected: bool) {
    assert_eq!(eval_bool(expr), expected);
}

#[rstest]
// Two of three scalar answers are truthy.
#[case("checklist(2, 3, 'x', '', 'y')", true)]
#[case("checklist(3, 3, 'x', '', 'y')", false)]
// -1 disables a bound.
#[case("checklist(-1, 1, 'x', '', '')", true)]
#[case("checklist(-1, 1, 'x', 'y', '')", false)]
#[case("checklist(1, -1, 'a', 'b', 'c')", true)]
// Node-set answers count their non-empty members.
#[case("checklist(2, 2, w)", true)]
#[case("checklist(3, 3, w)", false)]
fn checklist_cases(#[case] expr: &str, #[case] expected: bool) {
    assert_eq!(eval_bool(expr), expected);
}

#[rstest]
// Both answers truthy: weight sum is 7.
#[case("weighted-checklist(7, 7, 'x', 2, 'y', 5)", true)]
#[case("weighted-checklist(8, -1, 'x', 2, 'y', 5)", false)]
// Falsy answers contribute nothing.
#[case("weighted-checklist(2, 2, 'x', 2, '', 5)", true)]
// Node-set values zip with node-set weights; only the two truthy
// answers contribute their weights (2 + 5).
#[case("weighted-checklist(7, 7, w, v)", true)]
#[case("weighted-checklist(8, 20, w, v)", false)]
fn weighted_checklist_cases(#[case] expr: &str, #[case] expected: bool) {
    assert_eq!(eval_bool(expr), expected);
}

#[test]
fn weighted_checklist_rejects_odd_pairs() {
    let document = fixture();
    let r = context(&document);
    let err = document
        .evaluate_from("weighted-checklist(1, 1, 'x')", &r, ResultType::Boolean)
        .unwrap_err();
    assert!(err.to_string().contains("pairs"), "{err}");
}

#[test]
fn if_selects_by_condition() {
    assert_eq!(eval_string("if(true(), 'yes', 'no')"), "yes");
    assert_eq!(eval_string("if(false(), 'yes', 'no')"), "no");
    assert_eq!(eval_string("if(count(w) > 2, 'many', 'few')"), "many");
    // The chosen branch keeps its own kind.
    assert_eq!(eval_string("string(if(true(), 1 + 1, 'x'))"), "2");
}
