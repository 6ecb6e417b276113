use super::*;

use rstest::rstest;

use crate::parser::Parser;

fn parse(language: SupportedLanguage, source: &str) -> SyntaxTree {
    Parser::new(language)
        .expect("parser")
        .parse(source)
        .expect("parse")
}

fn find(tree: &SyntaxTree, kind: &str, text: &str) -> NodeId {
    tree.post_order()
        .into_iter()
        .find(|id| {
            tree.node(*id).is_some_and(|node| {
                node.kind().grammar_name() == Some(kind) && node.text() == text
            })
        })
        .expect("node present")
}

#[rstest]
#[case(SupportedLanguage::TypeScript, "  // leading comment\nconst a = f( 1 ,2 );\n\n")]
#[case(SupportedLanguage::TypeScript, "gridApi.setDomLayout('print'); /* trailing */")]
#[case(SupportedLanguage::Rust, "fn main() {\n    let x = 1; // one\n}\n")]
#[case(SupportedLanguage::Python, "def f(a,  b):\n    return a  +  b\n")]
#[case(SupportedLanguage::TypeScript, "")]
fn printing_an_untouched_tree_round_trips(
    #[case] language: SupportedLanguage,
    #[case] source: &str,
) {
    assert_eq!(parse(language, source).print(), source);
}

#[test]
fn broken_source_still_round_trips() {
    let source = "function broken( {\n  x = ;\n";
    let tree = parse(SupportedLanguage::TypeScript, source);
    assert!(tree.has_errors());
    assert_eq!(tree.print(), source);
}

#[test]
fn root_span_covers_whole_source() {
    let source = "\n\nfoo();\n";
    let tree = parse(SupportedLanguage::TypeScript, source);
    let span = tree
        .root_node()
        .and_then(|root| root.span().cloned())
        .expect("root span");
    assert_eq!(span.byte_range, 0..source.len());
}

#[test]
fn node_spans_are_one_based() {
    let tree = parse(SupportedLanguage::TypeScript, "a();\n  b();");
    let call = find(&tree, "call_expression", "b()");
    let span = tree
        .node(call)
        .and_then(|node| node.span().cloned())
        .expect("span");
    assert_eq!(span.start.line, 2);
    assert_eq!(span.start.column, 3);
}

#[test]
fn replace_at_grafts_fragment_and_retires_old_subtree() {
    let mut tree = parse(SupportedLanguage::TypeScript, "call(oldName);");
    let target = find(&tree, "identifier", "oldName");
    let donor = parse(SupportedLanguage::TypeScript, "newName;");
    let fragment = donor
        .extract(find(&donor, "identifier", "newName"))
        .expect("extract");

    let new_id = tree.replace_at(target, &fragment).expect("replace");

    assert_eq!(tree.print(), "call(newName);");
    assert!(!tree.is_live(target));
    assert!(tree.is_live(new_id));
    assert_eq!(
        tree.node(new_id)
            .and_then(|n| n.parent())
            .and_then(|p| p.kind().grammar_name()),
        Some("arguments")
    );
}

#[test]
fn stale_locations_are_rejected() {
    let mut tree = parse(SupportedLanguage::TypeScript, "call(oldName);");
    let target = find(&tree, "identifier", "oldName");
    let fragment = tree.extract(target).expect("extract");
    tree.replace_at(target, &fragment).expect("replace");

    assert_eq!(
        tree.replace_at(target, &fragment).err(),
        Some(SyntaxError::stale_location(target))
    );
    assert!(tree.extract(target).is_err());
    assert!(tree.remove_at(target).is_err());
}

#[test]
fn replace_at_rejects_foreign_language_fragments() {
    let mut tree = parse(SupportedLanguage::TypeScript, "x;");
    let python = parse(SupportedLanguage::Python, "y");
    let fragment = python.extract(python.root()).expect("extract");

    let result = tree.replace_at(tree.root(), &fragment);
    assert!(matches!(result, Err(SyntaxError::InvalidEdit { .. })));
}

#[test]
fn remove_at_drops_the_node_but_not_its_neighbours() {
    let mut tree = parse(SupportedLanguage::TypeScript, "first();\nsecond();\n");
    let statement = find(&tree, "expression_statement", "first();");

    tree.remove_at(statement).expect("remove");

    assert_eq!(tree.print(), "\nsecond();\n");
    assert!(tree.remove_at(tree.root()).is_err());
}

#[test]
fn post_order_visits_children_before_parents() {
    let tree = parse(SupportedLanguage::TypeScript, "f(x);");
    let order = tree.post_order();
    let position = |id: NodeId| order.iter().position(|candidate| *candidate == id);

    let argument = find(&tree, "identifier", "x");
    let call = find(&tree, "call_expression", "f(x)");
    assert!(position(argument) < position(call));
    assert_eq!(order.last().copied(), Some(tree.root()));
}

#[test]
fn structural_equality_ignores_trivia_only() {
    let left = parse(SupportedLanguage::TypeScript, "f(a,b);");
    let right = parse(SupportedLanguage::TypeScript, "f( a , /* c */ b );");
    let other = parse(SupportedLanguage::TypeScript, "f(a, c);");

    let whole = |tree: &SyntaxTree| tree.extract(tree.root()).expect("extract");
    assert!(whole(&left).structurally_eq(&whole(&right)));
    assert!(!whole(&left).structurally_eq(&whole(&other)));
}

#[test]
fn extract_sequence_keeps_separators() {
    let tree = parse(SupportedLanguage::TypeScript, "f(a,   b);");
    let arguments = find(&tree, "arguments", "(a,   b)");
    let inner: Vec<_> = tree
        .node(arguments)
        .expect("arguments")
        .children()
        .map(|child| child.id())
        .collect();
    let run = inner.get(1..inner.len() - 1).expect("inner run");

    let fragment = tree.extract_sequence(run).expect("sequence");
    assert!(fragment.is_sequence());
    assert_eq!(fragment.text(), "a,   b");
}

#[test]
fn extract_sequence_rejects_gaps() {
    let tree = parse(SupportedLanguage::TypeScript, "f(a, b, c);");
    let a = find(&tree, "identifier", "a");
    let c = find(&tree, "identifier", "c");

    assert!(tree.extract_sequence(&[a, c]).is_err());
}
