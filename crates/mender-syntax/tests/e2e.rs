//! End-to-end tests for mender-syntax through its public API.

use insta::assert_snapshot;
use rstest::rstest;

use mender_syntax::{
    AnyOf, CaptureSet, Deprecation, FnTemplate, Parser, Pattern, Replacement, RewriteOptions,
    RuleRewriter, RuleSet, SupportedLanguage, TextTemplate,
};

fn rewrite(language: SupportedLanguage, rules: RuleSet, source: &str) -> String {
    let mut tree = Parser::new(language)
        .unwrap_or_else(|err| panic!("parser: {err}"))
        .parse(source)
        .unwrap_or_else(|err| panic!("parse: {err}"));
    RuleRewriter::new(rules)
        .rewrite(&mut tree, RewriteOptions::default())
        .unwrap_or_else(|err| panic!("rewrite: {err}"));
    tree.print()
}

fn text_rule(language: SupportedLanguage, id: &str, pattern: &str, template: &str) -> Replacement {
    let captures = CaptureSet::new().expression("RECV");
    let compiled =
        Pattern::compile(language, pattern, &captures).unwrap_or_else(|err| panic!("{err}"));
    let rendered =
        TextTemplate::compile(language, template).unwrap_or_else(|err| panic!("{err}"));
    Replacement::new(id, compiled, rendered).unwrap_or_else(|err| panic!("{err}"))
}

#[rstest]
#[case(
    SupportedLanguage::Rust,
    "$RECV.unwrap()",
    "$RECV.expect(\"checked\")",
    "fn main() {\n    let v = parse(s).unwrap();\n}\n",
    "fn main() {\n    let v = parse(s).expect(\"checked\");\n}\n"
)]
#[case(
    SupportedLanguage::Python,
    "$RECV.has_key($KEY)",
    "$KEY in $RECV",
    "if table.has_key(name):\n    pass\n",
    "if name in table:\n    pass\n"
)]
#[case(
    SupportedLanguage::TypeScript,
    "$RECV.substr($$$ARGS)",
    "$RECV.slice($$$ARGS)",
    "const head = title.substr(0, 3);\n",
    "const head = title.slice(0, 3);\n"
)]
fn rewrites_each_supported_language(
    #[case] language: SupportedLanguage,
    #[case] pattern: &str,
    #[case] template: &str,
    #[case] source: &str,
    #[case] expected: &str,
) {
    let rules = RuleSet::new(language).replacement(text_rule(language, "rule", pattern, template));
    let output = rewrite(language, rules, source);
    assert_eq!(output, expected);
}

#[test]
fn any_of_rules_share_one_template() {
    let language = SupportedLanguage::TypeScript;
    let captures = CaptureSet::new().expression("RECV");
    let compile = |source: &str| {
        Pattern::compile(language, source, &captures).unwrap_or_else(|err| panic!("{err}"))
    };
    let matcher = AnyOf::new(Vec::new())
        .or(compile("$RECV.showNoRowsOverlay()"))
        .or(compile("$RECV.showLoadingOverlay()"));
    let template =
        TextTemplate::compile(language, "$RECV.hideOverlay()").unwrap_or_else(|err| panic!("{err}"));
    let rules = RuleSet::new(language).replacement(
        Replacement::new("overlays", matcher, template).unwrap_or_else(|err| panic!("{err}")),
    );

    let output = rewrite(
        language,
        rules,
        "api.showNoRowsOverlay();\napi.showLoadingOverlay();\n",
    );
    assert_snapshot!(output.trim_end().replace('\n', " | "), @"api.hideOverlay(); | api.hideOverlay();");
}

#[test]
fn function_templates_can_reuse_captures() {
    let language = SupportedLanguage::TypeScript;
    let pattern = Pattern::compile(language, "noop($VALUE)", &CaptureSet::new().expression("VALUE"))
        .unwrap_or_else(|err| panic!("{err}"));
    let template = FnTemplate::new(["VALUE"], |inputs| inputs.require("VALUE").cloned());
    let rules = RuleSet::new(language).replacement(
        Replacement::new("unwrap-noop", pattern, template).unwrap_or_else(|err| panic!("{err}")),
    );

    let output = rewrite(language, rules, "const x = noop(a + b);");
    assert_eq!(output, "const x = a + b;");
}

#[test]
fn deprecations_leave_source_untouched() {
    let language = SupportedLanguage::TypeScript;
    let pattern = Pattern::compile(language, "$RECV.legacy()", &CaptureSet::new())
        .unwrap_or_else(|err| panic!("{err}"));
    let rules = RuleSet::new(language).deprecation(Deprecation::new(
        "legacy",
        pattern,
        "legacy() must be migrated manually",
    ));
    let mut tree = Parser::new(language)
        .unwrap_or_else(|err| panic!("{err}"))
        .parse("a.legacy();\nb.legacy();\n")
        .unwrap_or_else(|err| panic!("{err}"));

    let report = RuleRewriter::new(rules)
        .rewrite(&mut tree, RewriteOptions::default())
        .unwrap_or_else(|err| panic!("{err}"));

    let lines: Vec<_> = report
        .errors()
        .filter_map(|finding| finding.span.as_ref())
        .map(|span| span.start.to_string())
        .collect();
    assert_eq!(lines, vec!["1:1", "2:1"]);
    assert_eq!(tree.print(), "a.legacy();\nb.legacy();\n");
}
