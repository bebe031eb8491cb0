mod common;

use common::*;
use throwcheck::config::CheckConfig;
use throwcheck::diagnostics::Category::*;

fn nested(body: &str) -> Vec<(throwcheck::diagnostics::Category, String)> {
    check_body_with(body, &CheckConfig::default())
}

fn header(body: &str) -> Vec<(throwcheck::diagnostics::Category, String)> {
    check_body_with(body, &header_only())
}

#[test]
fn annotated_header_with_quiet_body() {
    let body = "[[maybe_unhandled]] if (get()) { bar(); }";
    assert!(nested(body).is_empty());
    assert!(header(body).is_empty());
}

#[test]
fn throwing_body_under_annotated_header() {
    let body = "[[maybe_unhandled]] if (get()) { foo(); }";
    assert!(nested(body).is_empty());
    assert_eq!(header(body), vec![(StmtMissingAnnotation, "foo();".to_string())]);
}

#[test]
fn inner_marker_under_annotated_header() {
    let body = "[[maybe_unhandled]] while (get()) { [[maybe_unhandled]] foo(); }";
    assert_eq!(
        nested(body),
        vec![(StmtSuperfluousAnnotation, "[[maybe_unhandled]] foo();".to_string())]
    );
    assert!(header(body).is_empty());
}

#[test]
fn annotated_block() {
    let body = "[[maybe_unhandled]] { foo(); }";
    assert_eq!(
        nested(body),
        vec![(StmtSuperfluousAnnotation, "[[maybe_unhandled]] { foo(); }".to_string())]
    );
    assert_eq!(
        header(body),
        vec![
            (StmtSuperfluousAnnotation, "[[maybe_unhandled]] { foo(); }".to_string()),
            (StmtMissingAnnotation, "foo();".to_string()),
        ]
    );
}

#[test]
fn quiet_annotated_header_is_still_superfluous() {
    let body = "[[maybe_unhandled]] if (c) { foo(); }";
    assert_eq!(
        nested(body),
        vec![(StmtSuperfluousAnnotation, "[[maybe_unhandled]] if (c) { foo(); }".to_string())]
    );
    assert_eq!(
        header(body),
        vec![
            (StmtSuperfluousAnnotation, "[[maybe_unhandled]] if (c) { foo(); }".to_string()),
            (StmtMissingAnnotation, "foo();".to_string()),
        ]
    );
}

#[test]
fn coverage_reaches_deep_nesting() {
    let body = "[[maybe_unhandled]] if (get()) { while (c) { if (c) { foo(); } } }";
    assert!(nested(body).is_empty());
    assert_eq!(header(body), vec![(StmtMissingAnnotation, "foo();".to_string())]);
}

#[test]
fn coverage_does_not_leak_to_siblings() {
    let body = "[[maybe_unhandled]] foo();\nfoo();";
    assert_eq!(nested(body), vec![(StmtMissingAnnotation, "foo();".to_string())]);
    assert_eq!(nested(body), header(body));
}

#[test]
fn declarations_under_annotated_header_are_still_checked() {
    let body = "[[maybe_unhandled]] if (get()) { int x = get(); [[maybe_unhandled]] int y = 1; }";
    let expected = vec![
        (DeclMissingAnnotation, "int x = get()".to_string()),
        (DeclSuperfluousAnnotation, "[[maybe_unhandled]] int y = 1".to_string()),
    ];
    assert_eq!(nested(body), expected);
    assert_eq!(header(body), expected);
}

#[test]
fn else_branch_is_covered_too() {
    let body = "[[maybe_unhandled]] if (get()) bar(); else foo();";
    assert!(nested(body).is_empty());
    assert_eq!(header(body), vec![(StmtMissingAnnotation, "foo();".to_string())]);
}
