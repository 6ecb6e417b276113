use super::*;

use rstest::{fixture, rstest};

use crate::capture::CaptureSet;
use crate::language::SupportedLanguage;
use crate::parser::Parser;

fn parse(language: SupportedLanguage, source: &str) -> SyntaxTree {
    Parser::new(language)
        .expect("parser")
        .parse(source)
        .expect("parse")
}

fn compile(source: &str, captures: &CaptureSet) -> Pattern {
    Pattern::compile(SupportedLanguage::TypeScript, source, captures).expect("pattern")
}

#[fixture]
fn setter() -> Pattern {
    compile(
        "$API.setDomLayout($VALUE)",
        &CaptureSet::new().expression("API").expression("VALUE"),
    )
}

fn bound_text(tree: &SyntaxTree, found: &Match, name: &str) -> String {
    let id = found.bindings.single(name).expect("bound");
    tree.text_of(id)
}

#[rstest]
fn binds_receiver_and_argument(setter: Pattern) {
    let tree = parse(
        SupportedLanguage::TypeScript,
        "gridApi.setDomLayout('autoHeight');\n",
    );

    let found = setter.find_first(&tree).expect("match");
    assert_eq!(bound_text(&tree, &found, "API"), "gridApi");
    assert_eq!(bound_text(&tree, &found, "VALUE"), "'autoHeight'");
    assert_eq!(tree.text_of(found.node), "gridApi.setDomLayout('autoHeight')");
}

#[rstest]
fn ignores_whitespace_and_comments(setter: Pattern) {
    let tree = parse(
        SupportedLanguage::TypeScript,
        "this.api . setDomLayout( /* layout */ value );",
    );

    let found = setter.find_first(&tree).expect("match");
    assert_eq!(bound_text(&tree, &found, "API"), "this.api");
}

#[rstest]
#[case("gridApi.setDomLayout(a, b);")]
#[case("gridApi.setRowData(value);")]
#[case("setDomLayout(value);")]
fn mismatched_shapes_do_not_match(setter: Pattern, #[case] source: &str) {
    let tree = parse(SupportedLanguage::TypeScript, source);
    assert!(setter.find_all(&tree).is_empty());
}

#[test]
fn class_restriction_rejects_non_identifiers() {
    let pattern = compile("$API.destroy()", &CaptureSet::new().identifier("API"));
    let tree = parse(
        SupportedLanguage::TypeScript,
        "gridApi.destroy();\nthis.gridApi.destroy();",
    );

    let found = pattern.find_all(&tree);
    assert_eq!(found.len(), 1);
    let first = found.first().expect("one match");
    assert_eq!(bound_text(&tree, first, "API"), "gridApi");
}

#[rstest]
#[case("assertEqual(total, total);", true)]
#[case("assertEqual(total, other);", false)]
#[case("assertEqual(a.b( 1 ), a.b(1));", true)]
fn repeated_metavariable_requires_equal_subtrees(#[case] source: &str, #[case] expected: bool) {
    let pattern = compile("assertEqual($X, $X)", &CaptureSet::new());
    let tree = parse(SupportedLanguage::TypeScript, source);
    assert_eq!(pattern.find_first(&tree).is_some(), expected);
}

#[test]
fn wildcard_matches_without_binding() {
    let pattern = compile("$_.destroy()", &CaptureSet::new());
    let tree = parse(SupportedLanguage::TypeScript, "grid.destroy();");

    let found = pattern.find_first(&tree).expect("match");
    assert!(found.bindings.is_empty());
}

#[rstest]
#[case("api.refresh();", 0)]
#[case("api.refresh(force);", 1)]
#[case("api.refresh(force, rows, columns);", 5)]
fn sequence_metavariable_captures_sibling_runs(#[case] source: &str, #[case] captured: usize) {
    let pattern = compile("$API.refresh($$$ARGS)", &CaptureSet::new());
    let tree = parse(SupportedLanguage::TypeScript, source);

    let found = pattern.find_first(&tree).expect("match");
    let nodes = found.bindings.get("ARGS").expect("bound").nodes().len();
    assert_eq!(nodes, captured);
}

#[test]
fn sequence_metavariable_backtracks_before_trailing_node() {
    let pattern = compile("log($$$FIRST, last)", &CaptureSet::new());
    let tree = parse(SupportedLanguage::TypeScript, "log(a, b, last);");

    let found = pattern.find_first(&tree).expect("match");
    let first = found.bindings.get("FIRST").expect("bound");
    let text: Vec<_> = first.nodes().iter().map(|id| tree.text_of(*id)).collect();
    assert_eq!(text, vec!["a", ",", "b"]);
}

#[test]
fn match_at_rejects_other_languages() {
    let pattern = compile("$X", &CaptureSet::new());
    let tree = parse(SupportedLanguage::Python, "x");
    assert!(pattern.match_at(&tree, tree.root()).is_none());
}

#[test]
fn any_of_short_circuits_on_first_success() {
    let show = compile("$API.showLoadingOverlay()", &CaptureSet::new());
    let hide = compile("$API.hideOverlay()", &CaptureSet::new());
    let matcher = AnyOf::new(Vec::new()).or(show).or(hide);
    let tree = parse(
        SupportedLanguage::TypeScript,
        "api.showLoadingOverlay();\napi.hideOverlay();\napi.other();",
    );

    let matched = tree
        .post_order()
        .into_iter()
        .filter(|id| matcher.match_at(&tree, *id).is_some())
        .count();
    assert_eq!(matched, 2);
}

#[test]
fn any_of_reports_names_common_to_all_alternatives() {
    let matcher = AnyOf::new(Vec::new())
        .or(compile("$API.a($X)", &CaptureSet::new()))
        .or(compile("$API.b($Y)", &CaptureSet::new()));

    let names: Vec<_> = matcher.capture_names().into_iter().collect();
    assert_eq!(names, vec!["API"]);
}

#[test]
fn rust_patterns_match_inside_functions() {
    let pattern = Pattern::compile(
        SupportedLanguage::Rust,
        "$RECV.unwrap()",
        &CaptureSet::new().expression("RECV"),
    )
    .expect("pattern");
    let tree = parse(
        SupportedLanguage::Rust,
        "fn main() { let v = parse(input).unwrap(); }",
    );

    let found = pattern.find_first(&tree).expect("match");
    assert_eq!(bound_text(&tree, &found, "RECV"), "parse(input)");
}
