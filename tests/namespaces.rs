use std::collections::HashMap;

use openrosa_xpath::tree::{Document, XmlNode, attr, doc, elem, text};
use openrosa_xpath::{Evaluator, NodeKind, ResultType};

// <root xmlns:p="urn:one">
//   <mid xmlns:q="urn:two" xmlns="urn:default">
//     <p:leaf xmlns:p="urn:shadow">x</p:leaf>
//   </mid>
// </root>
fn fixture() -> Document {
    Document::new(
        doc()
            .child(
                elem("root").attr(attr("xmlns:p", "urn:one")).child(
                    elem("mid")
                        .attr(attr("xmlns:q", "urn:two"))
                        .attr(attr("xmlns", "urn:default"))
                        .child(
                            elem("p:leaf")
                                .attr(attr("xmlns:p", "urn:shadow"))
                                .child(text("x")),
                        ),
                ),
            )
            .build(),
    )
}

fn node(document: &Document, expr: &str) -> XmlNode {
    document.evaluate(expr).unwrap().nodes().unwrap()[0]
        .as_tree()
        .unwrap()
        .clone()
}

#[test]
fn namespace_axis_synthesises_in_scope_declarations() {
    let document = fixture();
    let mid = node(&document, "root/*");
    let result = document
        .evaluate_from("namespace::node()", &mid, ResultType::UnorderedNodeSnapshot)
        .unwrap();
    let mut seen: Vec<(String, String)> = (0..result.snapshot_length().unwrap())
        .map(|i| {
            let n = result.snapshot_item(i).unwrap().unwrap();
            assert_eq!(n.kind(), NodeKind::Namespace);
            (n.name().unwrap().qualified(), n.string_value())
        })
        .collect();
    seen.sort();
    assert_eq!(
        seen,
        [
            ("".to_string(), "urn:default".to_string()),
            ("p".to_string(), "urn:one".to_string()),
            ("q".to_string(), "urn:two".to_string()),
            (
                "xml".to_string(),
                "http://www.w3.org/XML/1998/namespace".to_string()
            ),
        ]
    );
}

#[test]
fn inner_declarations_shadow_outer_ones() {
    let document = fixture();
    let leaf = node(&document, "root/*/*");
    let result = document
        .evaluate_from(
            "namespace::node()",
            &leaf,
            ResultType::UnorderedNodeSnapshot,
        )
        .unwrap();
    let uris: HashMap<String, String> = (0..result.snapshot_length().unwrap())
        .map(|i| {
            let n = result.snapshot_item(i).unwrap().unwrap();
            (n.name().unwrap().qualified(), n.string_value())
        })
        .collect();
    assert_eq!(uris["p"], "urn:shadow");
    assert_eq!(uris["q"], "urn:two");
    assert_eq!(uris[""], "urn:default");
}

#[test]
fn namespace_name_test_matches_prefix() {
    let document = fixture();
    let mid = node(&document, "root/*");
    let result = document
        .evaluate_from("namespace::q", &mid, ResultType::UnorderedNodeSnapshot)
        .unwrap();
    assert_eq!(result.snapshot_length().unwrap(), 1);
    assert_eq!(
        result.snapshot_item(0).unwrap().unwrap().string_value(),
        "urn:two"
    );
}

#[test]
fn prefixed_name_tests_match_by_uri() {
    let document = fixture();
    let root = document.root().clone();
    let mut map = HashMap::new();
    map.insert("s".to_string(), "urn:shadow".to_string());
    let evaluator = Evaluator::<XmlNode>::new();
    let result = evaluator
        .evaluate("//s:leaf", &root, Some(&map), ResultType::OrderedNodeSnapshot)
        .unwrap();
    assert_eq!(result.snapshot_length().unwrap(), 1);
    assert_eq!(
        result.snapshot_item(0).unwrap().unwrap().string_value(),
        "x"
    );

    // The same element is not in urn:one.
    let mut wrong = HashMap::new();
    wrong.insert("s".to_string(), "urn:one".to_string());
    let miss = evaluator
        .evaluate("//s:leaf", &root, Some(&wrong), ResultType::OrderedNodeSnapshot)
        .unwrap();
    assert_eq!(miss.snapshot_length().unwrap(), 0);
}

#[test]
fn prefix_wildcard_matches_whole_namespace() {
    let document = fixture();
    let root = document.root().clone();
    let mut map = HashMap::new();
    map.insert("s".to_string(), "urn:shadow".to_string());
    let evaluator = Evaluator::<XmlNode>::new();
    let result = evaluator
        .evaluate("count(//s:*)", &root, Some(&map), ResultType::Number)
        .unwrap();
    assert_eq!(result.number_value().unwrap(), 1.0);
}

#[test]
fn unresolvable_prefix_fails_at_compile_time() {
    let evaluator = Evaluator::<XmlNode>::new();
    let err = evaluator.compile("//nope:leaf", None).unwrap_err();
    assert_eq!(err.dom_code(), Some(openrosa_xpath::error::NAMESPACE_ERR));
    assert!(err.to_string().contains("nope"), "{err}");
}

#[test]
fn xml_prefix_is_always_available() {
    let document = Document::new(
        doc()
            .child(elem("r").attr(attr("xml:lang", "fr")))
            .build(),
    );
    let r = node(&document, "r");
    let evaluator = Evaluator::<XmlNode>::new();
    let result = evaluator
        .evaluate("@xml:lang", &r, None, ResultType::String)
        .unwrap();
    assert_eq!(result.string_value().unwrap(), "fr");
}

#[test]
fn namespace_uri_of_prefixed_and_default_elements() {
    let document = fixture();
    let leaf = node(&document, "root/*/*");
    let ns = document
        .evaluate_from("namespace-uri(.)", &leaf, ResultType::String)
        .unwrap();
    assert_eq!(ns.string_value().unwrap(), "urn:shadow");
    let mid = node(&document, "root/*");
    let ns = document
        .evaluate_from("namespace-uri(.)", &mid, ResultType::String)
        .unwrap();
    assert_eq!(ns.string_value().unwrap(), "urn:default");
}
