use openrosa_xpath::ResultType;
use openrosa_xpath::tree::{Document, doc, elem, text};

fn eval_number(expr: &str) -> f64 {
    let d = Document::new(
        doc()
            .child(
                elem("r")
                    .child(elem("p").child(text("0 0")))
                    .child(elem("p").child(text("0 1")))
                    .child(elem("trace").child(text("0 0;0 1;1 1;1 0"))),
            )
            .build(),
    );
    let r = d.evaluate("r").unwrap().nodes().unwrap()[0]
        .as_tree()
        .unwrap()
        .clone();
    d.evaluate_from(expr, &r, ResultType::Number)
        .unwrap()
        .number_value()
        .unwrap()
}

// One degree of arc on the R = 6378100 m sphere.
const ONE_DEGREE_M: f64 = 6_378_100.0 * std::f64::consts::PI / 180.0;

#[test]
fn distance_over_strings_and_node_sets() {
    let equator_step = eval_number("distance('0 0;0 1')");
    assert!((equator_step / ONE_DEGREE_M - 1.0).abs() < 1e-9);
    let meridian_step = eval_number("distance('0 0;1 0')");
    assert!((meridian_step / ONE_DEGREE_M - 1.0).abs() < 1e-9);
    // A node-set of single geopoints joins into one trace.
    let from_nodes = eval_number("distance(p)");
    assert!((from_nodes / ONE_DEGREE_M - 1.0).abs() < 1e-9);
    // Three legs around the square.
    let open_square = eval_number("distance(trace)");
    assert!(open_square > 2.9 * ONE_DEGREE_M && open_square < 3.1 * ONE_DEGREE_M);
}

#[test]
fn distance_degenerate_inputs() {
    assert_eq!(eval_number("distance('0 0')"), 0.0);
    assert!(eval_number("distance('')").is_nan());
    assert!(eval_number("distance('not a point')").is_nan());
    assert!(eval_number("distance('91 0;0 0')").is_nan());
    assert!(eval_number("distance('0 181;0 0')").is_nan());
}

#[test]
fn area_of_a_unit_square_at_the_equator() {
    let area = eval_number("area('0 0;0 1;1 1;1 0')");
    // ≈ 1.239e10 m² for a 1°×1° cell on the sphere.
    assert!((area / 1.2391e10 - 1.0).abs() < 1e-3, "area = {area}");
    // The trace node holds the same ring.
    let from_node = eval_number("area(trace)");
    assert!((from_node - area).abs() < 1.0);
}

#[test]
fn area_degenerate_inputs() {
    assert_eq!(eval_number("area('0 0;0 1')"), 0.0);
    assert!(eval_number("area('zero zero')").is_nan());
}

#[test]
fn geopoints_may_carry_altitude_and_accuracy() {
    let with_extras = eval_number("distance('0 0 1200 5;0 1 1300 5')");
    assert!((with_extras / ONE_DEGREE_M - 1.0).abs() < 1e-9);
}
