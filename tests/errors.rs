use openrosa_xpath::error::{INVALID_EXPRESSION_ERR, TYPE_ERR};
use openrosa_xpath::tree::{Document, XmlNode, doc, elem, text};
use openrosa_xpath::{Error, Evaluator, EvaluatorBuilder, ResultType};

fn fixture() -> Document {
    Document::new(
        doc()
            .child(elem("r").child(elem("a").child(text("1"))))
            .build(),
    )
}

#[test]
fn syntax_errors_carry_positions() {
    let d = fixture();
    let err = d.evaluate("a[").unwrap_err();
    assert_eq!(err.dom_code(), Some(INVALID_EXPRESSION_ERR));
    let Error::InvalidExpression { line, column, .. } = &err else {
        panic!("expected a parse error, got {err}");
    };
    assert_eq!(*line, Some(1));
    assert!(column.is_some());
}

#[test]
fn more_invalid_expressions() {
    let d = fixture();
    for source in ["", "a b", "1 +", "..[", "a::b", "fn(", "@", "a[]"] {
        let err = d.evaluate(source).unwrap_err();
        assert_eq!(
            err.dom_code(),
            Some(INVALID_EXPRESSION_ERR),
            "{source:?} should fail to parse"
        );
    }
}

#[test]
fn unknown_functions_name_the_culprit() {
    let d = fixture();
    let err = d.evaluate("unknownfn()").unwrap_err();
    assert!(matches!(err, Error::Evaluation(_)));
    assert!(err.to_string().contains("unknownfn"), "{err}");
}

#[test]
fn arity_violations() {
    let d = fixture();
    let too_few = d.evaluate("not()").unwrap_err();
    assert!(too_few.to_string().contains("at least"), "{too_few}");
    let too_many = d.evaluate("true(1)").unwrap_err();
    assert!(too_many.to_string().contains("at most"), "{too_many}");
    let concat_needs_one = d.evaluate("concat()").unwrap_err();
    assert!(matches!(concat_needs_one, Error::Evaluation(_)));
}

#[test]
fn argument_kind_violations() {
    let d = fixture();
    // count() requires a node-set.
    let err = d.evaluate("count(1)").unwrap_err();
    assert_eq!(err.dom_code(), Some(TYPE_ERR));
    // Booleans coerce to the null date rather than erroring.
    let result = d
        .evaluate_as("string(date(true()))", ResultType::String)
        .unwrap();
    assert_eq!(result.string_value().unwrap(), "Invalid Date");
}

#[test]
fn union_requires_node_sets() {
    let d = fixture();
    let err = d.evaluate("1 | 2").unwrap_err();
    assert_eq!(err.dom_code(), Some(TYPE_ERR));
    let err = d.evaluate("//a | 'x'").unwrap_err();
    assert_eq!(err.dom_code(), Some(TYPE_ERR));
}

#[test]
fn variables_resolve_from_bindings() {
    let d = fixture();
    let unbound = d.evaluate("$threshold").unwrap_err();
    assert!(matches!(unbound, Error::Evaluation(_)));
    assert!(unbound.to_string().contains("threshold"), "{unbound}");

    let evaluator: Evaluator<XmlNode> = EvaluatorBuilder::new()
        .with_variable("threshold", 2.0)
        .build();
    let result = evaluator
        .evaluate("$threshold + 1", d.root(), None, ResultType::Number)
        .unwrap();
    assert_eq!(result.number_value().unwrap(), 3.0);
}

#[test]
fn errors_render_with_their_taxonomy() {
    let d = fixture();
    let err = d.evaluate("a[").unwrap_err();
    assert!(err.to_string().starts_with("invalid expression"), "{err}");
    let err = d.evaluate("1 | 2").unwrap_err();
    assert!(err.to_string().starts_with("type error"), "{err}");
}
