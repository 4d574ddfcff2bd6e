use openrosa_xpath::error::TYPE_ERR;
use openrosa_xpath::tree::{Document, doc, elem, text};
use openrosa_xpath::ResultType;

fn fixture() -> Document {
    Document::new(
        doc()
            .child(
                elem("r")
                    .child(elem("a").child(text("1")))
                    .child(elem("a").child(text("2")))
                    .child(elem("a").child(text("3"))),
            )
            .build(),
    )
}

#[test]
fn any_resolves_to_the_value_kind() {
    let d = fixture();
    assert_eq!(
        d.evaluate("1 + 1").unwrap().result_type(),
        ResultType::Number
    );
    assert_eq!(
        d.evaluate("'x'").unwrap().result_type(),
        ResultType::String
    );
    assert_eq!(
        d.evaluate("true()").unwrap().result_type(),
        ResultType::Boolean
    );
    assert_eq!(
        d.evaluate("//a").unwrap().result_type(),
        ResultType::UnorderedNodeIterator
    );
    // Dates surface as strings.
    assert_eq!(
        d.evaluate("today()").unwrap().result_type(),
        ResultType::String
    );
}

#[test]
fn requested_kinds_convert() {
    let d = fixture();
    let n = d.evaluate_as("//a", ResultType::Number).unwrap();
    assert_eq!(n.number_value().unwrap(), 1.0);
    let s = d.evaluate_as("1 = 1", ResultType::String).unwrap();
    assert_eq!(s.string_value().unwrap(), "true");
    let b = d.evaluate_as("''", ResultType::Boolean).unwrap();
    assert!(!b.boolean_value().unwrap());
}

#[test]
fn iterator_walks_in_order() {
    let d = fixture();
    let mut it = d
        .evaluate_as("//a", ResultType::OrderedNodeIterator)
        .unwrap();
    let mut values = Vec::new();
    while let Some(node) = it.iterate_next().unwrap() {
        values.push(node.string_value());
    }
    assert_eq!(values, ["1", "2", "3"]);
    assert!(it.iterate_next().unwrap().is_none());
    assert!(!it.invalid_iterator_state());
}

#[test]
fn snapshots_are_random_access() {
    let d = fixture();
    let snap = d
        .evaluate_as("//a", ResultType::OrderedNodeSnapshot)
        .unwrap();
    assert_eq!(snap.snapshot_length().unwrap(), 3);
    assert_eq!(snap.snapshot_item(1).unwrap().unwrap().string_value(), "2");
    assert!(snap.snapshot_item(9).unwrap().is_none());
}

#[test]
fn single_node_kinds_take_the_first() {
    let d = fixture();
    let first = d
        .evaluate_as("//a", ResultType::FirstOrderedNode)
        .unwrap();
    assert_eq!(
        first.single_node_value().unwrap().unwrap().string_value(),
        "1"
    );
    let none = d
        .evaluate_as("//missing", ResultType::AnyUnorderedNode)
        .unwrap();
    assert!(none.single_node_value().unwrap().is_none());
}

#[test]
fn accessors_are_policed() {
    let d = fixture();
    let number = d.evaluate_as("1", ResultType::Number).unwrap();
    assert_eq!(number.string_value().unwrap_err().dom_code(), Some(TYPE_ERR));
    assert_eq!(
        number.single_node_value().unwrap_err().dom_code(),
        Some(TYPE_ERR)
    );
    let mut snap = d
        .evaluate_as("//a", ResultType::OrderedNodeSnapshot)
        .unwrap();
    assert_eq!(snap.number_value().unwrap_err().dom_code(), Some(TYPE_ERR));
    assert_eq!(snap.iterate_next().unwrap_err().dom_code(), Some(TYPE_ERR));
}

#[test]
fn node_kinds_require_node_sets() {
    let d = fixture();
    let err = d
        .evaluate_as("1 + 1", ResultType::OrderedNodeSnapshot)
        .unwrap_err();
    assert_eq!(err.dom_code(), Some(TYPE_ERR));
    let err = d
        .evaluate_as("'x'", ResultType::AnyUnorderedNode)
        .unwrap_err();
    assert_eq!(err.dom_code(), Some(TYPE_ERR));
}

#[test]
fn result_type_codes_follow_dom() {
    assert_eq!(ResultType::Any.code(), 0);
    assert_eq!(ResultType::Number.code(), 1);
    assert_eq!(ResultType::String.code(), 2);
    assert_eq!(ResultType::Boolean.code(), 3);
    assert_eq!(ResultType::UnorderedNodeIterator.code(), 4);
    assert_eq!(ResultType::OrderedNodeIterator.code(), 5);
    assert_eq!(ResultType::UnorderedNodeSnapshot.code(), 6);
    assert_eq!(ResultType::OrderedNodeSnapshot.code(), 7);
    assert_eq!(ResultType::AnyUnorderedNode.code(), 8);
    assert_eq!(ResultType::FirstOrderedNode.code(), 9);
}
