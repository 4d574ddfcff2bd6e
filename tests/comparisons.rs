use openrosa_xpath::ResultType;
use openrosa_xpath::tree::{Document, XmlNode, doc, elem, text};

fn fixture() -> Document {
    Document::new(
        doc()
            .child(
                elem("r")
                    .child(elem("a").child(text("1")))
                    .child(elem("a").child(text("2")))
                    .child(elem("a").child(text("3")))
                    .child(elem("d").child(text("2012-02-03"))),
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

fn eval_bool(document: &Document, context_node: &XmlNode, expr: &str) -> bool {
    document
        .evaluate_from(expr, context_node, ResultType::Boolean)
        .unwrap()
        .boolean_value()
        .unwrap()
}

#[test]
fn node_set_comparisons_are_existential() {
    let document = fixture();
    let r = context(&document, "r");
    assert!(eval_bool(&document, &r, "a = 2"));
    assert!(!eval_bool(&document, &r, "a = 5"));
    // Some member differs from 1, so != holds even though one equals 1.
    assert!(eval_bool(&document, &r, "a != 1"));
    assert!(eval_bool(&document, &r, "a > 2"));
    assert!(!eval_bool(&document, &r, "a > 3"));
    assert!(eval_bool(&document, &r, "a = '2'"));
    assert!(!eval_bool(&document, &r, "a = 'x'"));
}

#[test]
fn node_set_pairs() {
    let document = Document::new(
        doc()
            .child(
                elem("r")
                    .child(elem("l").child(text("5")))
                    .child(elem("l").child(text("7")))
                    .child(elem("m").child(text("7")))
                    .child(elem("m").child(text("9"))),
            )
            .build(),
    );
    let r = context(&document, "r");
    assert!(eval_bool(&document, &r, "l = m"));
    assert!(eval_bool(&document, &r, "l < m"));
    assert!(!eval_bool(&document, &r, "l > 8"));
}

#[test]
fn boolean_against_node_set_compares_emptiness() {
    let document = fixture();
    let r = context(&document, "r");
    assert!(eval_bool(&document, &r, "a = true()"));
    assert!(eval_bool(&document, &r, "missing = false()"));
    assert!(!eval_bool(&document, &r, "missing = true()"));
}

#[test]
fn scalar_precedence_rules() {
    let document = fixture();
    let r = context(&document, "r");
    // Either side number: numeric comparison.
    assert!(eval_bool(&document, &r, "'4' = 4"));
    assert!(eval_bool(&document, &r, "4 = '4.0'"));
    // Relational always numeric, even over strings.
    assert!(eval_bool(&document, &r, "'9' < '10'"));
    // Plain strings compare as strings for equality.
    assert!(eval_bool(&document, &r, "'abc' = 'abc'"));
    assert!(!eval_bool(&document, &r, "'abc' = 'abd'"));
    // Booleans dominate.
    assert!(eval_bool(&document, &r, "'x' = true()"));
    assert!(eval_bool(&document, &r, "'' = false()"));
}

#[test]
fn nan_never_compares_equal() {
    let document = fixture();
    let r = context(&document, "r");
    assert!(!eval_bool(&document, &r, "(0 div 0) = (0 div 0)"));
    assert!(eval_bool(&document, &r, "(0 div 0) != (0 div 0)"));
    assert!(!eval_bool(&document, &r, "'nope' < 1"));
}

#[test]
fn date_string_promotion() {
    let document = fixture();
    let r = context(&document, "r");
    // Evaluated well after 2012-02-03.
    assert!(eval_bool(&document, &r, "'2012-02-03' < today()"));
    assert!(!eval_bool(&document, &r, "'2012-02-03' > today()"));
    assert!(eval_bool(&document, &r, "'2012-02-03' = date('2012-02-03')"));
    assert!(eval_bool(&document, &r, "'2012-02-03' < '2012-03-01'"));
}

#[test]
fn node_set_against_dates() {
    let document = fixture();
    let r = context(&document, "r");
    assert!(eval_bool(&document, &r, "d < today()"));
    assert!(eval_bool(&document, &r, "d = '2012-02-03'"));
    assert!(eval_bool(&document, &r, "d < '2012-02-04'"));
    assert!(!eval_bool(&document, &r, "d < '2012-02-03'"));
}

#[test]
fn date_strings_that_are_not_dates_stay_strings() {
    let document = fixture();
    let r = context(&document, "r");
    // Purely numeric strings never promote.
    assert!(eval_bool(&document, &r, "'1234' = 1234"));
    // Malformed dates compare as NaN.
    assert!(!eval_bool(&document, &r, "'2012-13-45' < today()"));
}
