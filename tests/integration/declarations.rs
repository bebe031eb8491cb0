mod common;

use common::*;
use throwcheck::config::CheckConfig;
use throwcheck::diagnostics::Category::*;

const WIDGET: &str = "\
class Widget {
public:
  Widget();
  Widget(int v) noexcept;
};
struct Plain {
  int a, b;
};
";

fn check_records(body: &str) -> Vec<(throwcheck::diagnostics::Category, String)> {
    let source = format!("{WIDGET}{}", in_fn(body));
    findings(&source, &check(&source))
}

#[test]
fn throwing_initializer_is_missing() {
    assert_eq!(check_body("int x = get();"), vec![(DeclMissingAnnotation, "int x = get()".to_string())]);
}

#[test]
fn declaration_span_starts_at_type_or_marker() {
    let source = format!("{DECLS}[[maybe_unhandled]] const int g = 1;\n{}", in_fn("auto x = get(), y = get();"));
    assert_eq!(
        findings(&source, &check(&source)),
        vec![
            (DeclSuperfluousAnnotation, "[[maybe_unhandled]] const int g = 1".to_string()),
            (DeclMissingAnnotation, "auto x = get()".to_string()),
            (DeclMissingAnnotation, "y = get()".to_string()),
        ]
    );
}

#[test]
fn declaration_statement_is_not_reported_twice() {
    let found = check_body("int x = get();");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].0, DeclMissingAnnotation);
}

#[test]
fn no_throw_initializer_is_clean() {
    assert!(check_body("int x = get_nt();").is_empty());
    assert!(check_body("int y;").is_empty());
}

#[test]
fn marked_throwing_initializer_is_clean() {
    assert!(check_body("[[maybe_unhandled]] int x = get();").is_empty());
}

#[test]
fn marked_quiet_declaration_is_superfluous() {
    assert_eq!(
        check_body("[[maybe_unhandled]] int x = 1;"),
        vec![(DeclSuperfluousAnnotation, "[[maybe_unhandled]] int x = 1".to_string())]
    );
    assert_eq!(check_body("[[maybe_unhandled]] int y;"), vec![(DeclSuperfluousAnnotation, "[[maybe_unhandled]] int y".to_string())]);
}

#[test]
fn each_declarator_is_judged_alone() {
    assert_eq!(
        check_body("int a = get(), b = 2;"),
        vec![(DeclMissingAnnotation, "int a = get()".to_string())]
    );
    assert_eq!(
        check_body("[[maybe_unhandled]] int a = get(), b = 2;"),
        vec![(DeclSuperfluousAnnotation, "b = 2".to_string())]
    );
}

#[test]
fn direct_and_brace_initializers() {
    assert_eq!(
        check_body("int x(get());\nint y{get()};\nint z{get_nt()};"),
        vec![
            (DeclMissingAnnotation, "int x(get())".to_string()),
            (DeclMissingAnnotation, "int y{get()}".to_string()),
        ]
    );
}

#[test]
fn global_variables_are_checked() {
    let source = format!("{DECLS}int g = get();\n[[maybe_unhandled]] int h = get();\nint k = get_nt();\n");
    let found = findings(&source, &check(&source));
    assert_eq!(found, vec![(DeclMissingAnnotation, "int g = get()".to_string())]);
}

#[test]
fn default_construction_uses_default_constructor() {
    assert_eq!(check_records("Widget w;"), vec![(DeclMissingAnnotation, "Widget w".to_string())]);
    assert!(check_records("[[maybe_unhandled]] Widget w;").is_empty());
}

#[test]
fn construction_picks_constructor_by_arity() {
    assert!(check_records("Widget w(1);").is_empty());
    assert!(check_records("Widget w{get_nt()};").is_empty());
    assert_eq!(check_records("Widget w(get());"), vec![(DeclMissingAnnotation, "Widget w(get())".to_string())]);
    assert!(check_records("Widget w = Widget(1);").is_empty());
}

#[test]
fn pointers_do_not_construct() {
    assert!(check_records("Widget* p;\nconst Widget* q;").is_empty());
}

#[test]
fn records_without_constructors_never_throw() {
    assert!(check_records("Plain p;\nPlain q{};\nPlain r{1, 2};").is_empty());
    assert_eq!(
        check_records("[[maybe_unhandled]] Plain p{};"),
        vec![(DeclSuperfluousAnnotation, "[[maybe_unhandled]] Plain p{}".to_string())]
    );
}

#[test]
fn temporary_construction_statement() {
    assert_eq!(check_records("Widget();"), vec![(StmtMissingAnnotation, "Widget();".to_string())]);
    assert!(check_records("Widget(2);").is_empty());
}

#[test]
fn constructor_bodies_are_checked() {
    let source = format!("{DECLS}struct S {{\n  S() {{ foo(); }}\n}};\n");
    let found = findings(&source, &check(&source));
    assert_eq!(found, vec![(StmtMissingAnnotation, "foo();".to_string())]);
}

#[test]
fn for_init_declarations_are_checked_as_declarations() {
    assert_eq!(
        check_body("for ([[maybe_unhandled]] int i = 0; i < 3; i++) {}"),
        vec![(DeclSuperfluousAnnotation, "[[maybe_unhandled]] int i = 0".to_string())]
    );
    assert_eq!(
        check_body("for (int i = get(); i < 3; i++) {}"),
        vec![(DeclMissingAnnotation, "int i = get()".to_string())]
    );
}

#[test]
fn declarations_can_be_switched_off() {
    let config = CheckConfig { declarations: false, ..CheckConfig::default() };
    assert!(check_body_with("int x = get();\n[[maybe_unhandled]] int y = 1;", &config).is_empty());
    assert_eq!(
        check_body_with("int x = get();\nfoo();", &config),
        vec![(StmtMissingAnnotation, "foo();".to_string())]
    );
}
