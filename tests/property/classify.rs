// Property tests for the marker checker.
//
// Random function bodies are generated as a small statement model, rendered to source and
// checked. A reference walk over the model states what must be reported:
// 1. Agreement: the checker reports exactly the model's findings, in order, in both modes
// 2. Determinism: the same source always yields the same diagnostics
// 3. Declarations only: with statement checks off, only declaration categories remain
// 4. Ordering: diagnostics never move backwards through the source

use proptest::prelude::*;
use throwcheck::check::can_throw;
use throwcheck::config::{CheckConfig, Coverage};
use throwcheck::diagnostics::Category;
use throwcheck::parser::ast::Callable;

const DECLS: &str = "void foo();\nvoid bar() noexcept;\nint get();\nint get_nt() noexcept;\n";
const MARK: &str = "[[maybe_unhandled]] ";

#[derive(Debug, Clone)]
enum Model {
    Call { throws: bool, marked: bool },
    Decl { throws: bool, marked: bool },
    If { throws: bool, marked: bool, body: Vec<Model> },
    While { throws: bool, marked: bool, body: Vec<Model> },
    Block { marked: bool, body: Vec<Model> },
}

fn arb_model() -> impl Strategy<Value = Model> {
    let leaf = prop_oneof![
        (any::<bool>(), any::<bool>()).prop_map(|(throws, marked)| Model::Call { throws, marked }),
        (any::<bool>(), any::<bool>()).prop_map(|(throws, marked)| Model::Decl { throws, marked }),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        let body = prop::collection::vec(inner, 0..4);
        prop_oneof![
            (any::<bool>(), any::<bool>(), body.clone())
                .prop_map(|(throws, marked, body)| Model::If { throws, marked, body }),
            (any::<bool>(), any::<bool>(), body.clone())
                .prop_map(|(throws, marked, body)| Model::While { throws, marked, body }),
            (any::<bool>(), body).prop_map(|(marked, body)| Model::Block { marked, body }),
        ]
    })
}

fn arb_body() -> impl Strategy<Value = Vec<Model>> {
    prop::collection::vec(arb_model(), 0..6)
}

fn render(stmts: &[Model], out: &mut String) {
    for s in stmts {
        let marked = match s {
            Model::Call { marked, .. }
            | Model::Decl { marked, .. }
            | Model::If { marked, .. }
            | Model::While { marked, .. }
            | Model::Block { marked, .. } => *marked,
        };
        if marked {
            out.push_str(MARK);
        }
        match s {
            Model::Call { throws, .. } => out.push_str(if *throws { "foo();\n" } else { "bar();\n" }),
            Model::Decl { throws, .. } => {
                out.push_str(if *throws { "int v = get();\n" } else { "int v = get_nt();\n" })
            }
            Model::If { throws, body, .. } | Model::While { throws, body, .. } => {
                let keyword = if matches!(s, Model::If { .. }) { "if" } else { "while" };
                let cond = if *throws { "get()" } else { "get_nt()" };
                out.push_str(&format!("{keyword} ({cond}) {{\n"));
                render(body, out);
                out.push_str("}\n");
            }
            Model::Block { body, .. } => {
                out.push_str("{\n");
                render(body, out);
                out.push_str("}\n");
            }
        }
    }
}

fn source_for(body: &[Model]) -> String {
    let mut out = format!("{DECLS}void test() {{\n");
    render(body, &mut out);
    out.push_str("}\n");
    out
}

fn stmt_finding(throws: bool, marked: bool, covered: bool) -> Option<Category> {
    match (marked, throws && !covered) {
        (true, false) => Some(Category::StmtSuperfluousAnnotation),
        (false, true) => Some(Category::StmtMissingAnnotation),
        _ => None,
    }
}

fn expected(stmts: &[Model], covered: bool, coverage: Coverage, out: &mut Vec<Category>) {
    for s in stmts {
        match s {
            Model::Call { throws, marked } => out.extend(stmt_finding(*throws, *marked, covered)),
            Model::Decl { throws, marked } => match (marked, throws) {
                (true, false) => out.push(Category::DeclSuperfluousAnnotation),
                (false, true) => out.push(Category::DeclMissingAnnotation),
                _ => {}
            },
            Model::If { throws, marked, body } | Model::While { throws, marked, body } => {
                out.extend(stmt_finding(*throws, *marked, covered));
                // The braces form an unmarked block, which is never reported.
                let inner = covered || (*marked && coverage == Coverage::Nested);
                expected(body, inner, coverage, out);
            }
            Model::Block { marked, body } => {
                out.extend(stmt_finding(false, *marked, covered));
                let inner = covered || (*marked && coverage == Coverage::Nested);
                expected(body, inner, coverage, out);
            }
        }
    }
}

fn categories(source: &str, config: &CheckConfig) -> Vec<Category> {
    throwcheck::check_source(source, config).unwrap().iter().map(|d| d.category).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn checker_agrees_with_model(body in arb_body()) {
        let source = source_for(&body);
        for coverage in [Coverage::Nested, Coverage::HeaderOnly] {
            let config = CheckConfig { coverage, ..CheckConfig::default() };
            let mut want = Vec::new();
            expected(&body, false, coverage, &mut want);
            prop_assert_eq!(categories(&source, &config), want, "coverage {:?}\n{}", coverage, source);
        }
    }

    #[test]
    fn check_is_deterministic(body in arb_body()) {
        let source = source_for(&body);
        let config = CheckConfig::default();
        let first = throwcheck::check_source(&source, &config).unwrap();
        let second = throwcheck::check_source(&source, &config).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn statement_toggle_leaves_only_declarations(body in arb_body()) {
        let source = source_for(&body);
        let config = CheckConfig { statements: false, ..CheckConfig::default() };
        for category in categories(&source, &config) {
            prop_assert!(matches!(
                category,
                Category::DeclMissingAnnotation | Category::DeclSuperfluousAnnotation
            ));
        }
    }

    #[test]
    fn diagnostics_follow_source_order(body in arb_body()) {
        let source = source_for(&body);
        let diags = throwcheck::check_source(&source, &CheckConfig::default()).unwrap();
        for pair in diags.windows(2) {
            prop_assert!(pair[0].span.start <= pair[1].span.start);
            prop_assert_ne!(pair[0].node, pair[1].node);
        }
    }

    #[test]
    fn can_throw_matches_specification(no_throw in any::<bool>(), extern_c in any::<bool>()) {
        let mut callable = Callable::function("f", 0);
        callable.no_throw = no_throw;
        callable.extern_linkage = extern_c;
        prop_assert_eq!(can_throw(&callable), !no_throw && !extern_c);
    }
}
