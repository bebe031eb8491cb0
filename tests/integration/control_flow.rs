mod common;

use common::*;
use throwcheck::diagnostics::Category::*;

#[test]
fn if_classifies_by_condition_only() {
    assert_eq!(
        check_body("if (get()) { bar(); }"),
        vec![(StmtMissingAnnotation, "if (get()) { bar(); }".to_string())]
    );
    assert!(check_body("if (get_nt()) { bar(); }").is_empty());
}

#[test]
fn branches_are_checked_on_their_own() {
    assert_eq!(check_body("if (c) foo();"), vec![(StmtMissingAnnotation, "foo();".to_string())]);
    assert_eq!(
        check_body("if (c) bar(); else foo();"),
        vec![(StmtMissingAnnotation, "foo();".to_string())]
    );
    assert_eq!(check_body("if (c) { foo(); }"), vec![(StmtMissingAnnotation, "foo();".to_string())]);
}

#[test]
fn else_if_chain() {
    assert_eq!(
        check_body("if (c) bar(); else if (get()) bar();"),
        vec![(StmtMissingAnnotation, "if (get()) bar();".to_string())]
    );
}

#[test]
fn loops_classify_by_condition() {
    assert_eq!(
        check_body("while (get()) {}"),
        vec![(StmtMissingAnnotation, "while (get()) {}".to_string())]
    );
    assert_eq!(
        check_body("do { } while (get());"),
        vec![(StmtMissingAnnotation, "do { } while (get());".to_string())]
    );
    assert!(check_body("while (c) { bar(); }").is_empty());
}

#[test]
fn loop_body_is_checked() {
    assert_eq!(check_body("while (c) foo();"), vec![(StmtMissingAnnotation, "foo();".to_string())]);
    assert_eq!(check_body("do foo(); while (c);"), vec![(StmtMissingAnnotation, "foo();".to_string())]);
}

#[test]
fn for_header_parts() {
    assert_eq!(
        check_body("for (foo(); c; ) {}"),
        vec![(StmtMissingAnnotation, "for (foo(); c; ) {}".to_string())]
    );
    assert_eq!(
        check_body("for (; get(); ) {}"),
        vec![(StmtMissingAnnotation, "for (; get(); ) {}".to_string())]
    );
    assert_eq!(
        check_body("for (;; i += get()) {}"),
        vec![(StmtMissingAnnotation, "for (;; i += get()) {}".to_string())]
    );
    assert!(check_body("for (;;) { break; }").is_empty());
    assert!(check_body("for (bar(); c; i++) {}").is_empty());
}

#[test]
fn for_body_is_checked() {
    assert_eq!(
        check_body("for (;;) foo();"),
        vec![(StmtMissingAnnotation, "foo();".to_string())]
    );
}

#[test]
fn marked_loop_header() {
    assert!(check_body("[[maybe_unhandled]] while (get()) {}").is_empty());
    assert!(check_body("[[maybe_unhandled]] for (;; get()) {}").is_empty());
    assert_eq!(
        check_body("[[maybe_unhandled]] for (;;) {}"),
        vec![(StmtSuperfluousAnnotation, "[[maybe_unhandled]] for (;;) {}".to_string())]
    );
}

#[test]
fn switch_and_case_labels() {
    let body = "switch (get()) { case 1: foo(); break; default: break; }";
    assert_eq!(
        check_body(body),
        vec![(StmtMissingAnnotation, body.to_string()), (StmtMissingAnnotation, "foo();".to_string())]
    );
}

#[test]
fn case_labelled_statement_can_be_marked() {
    assert!(check_body("switch (c) { case 1: [[maybe_unhandled]] foo(); break; }").is_empty());
    assert_eq!(
        check_body("switch (c) { default: [[maybe_unhandled]] bar(); }"),
        vec![(StmtSuperfluousAnnotation, "[[maybe_unhandled]] bar();".to_string())]
    );
}

#[test]
fn marked_substatement() {
    assert!(check_body("if (c) [[maybe_unhandled]] foo();").is_empty());
    assert_eq!(
        check_body("while (c) [[maybe_unhandled]] bar();"),
        vec![(StmtSuperfluousAnnotation, "[[maybe_unhandled]] bar();".to_string())]
    );
}

#[test]
fn nested_blocks() {
    assert_eq!(
        check_body("{ { if (c) { while (c) { foo(); } } } }"),
        vec![(StmtMissingAnnotation, "foo();".to_string())]
    );
}
