//! Marker consistency checking.
//!
//! The pass walks a resolved [`Tree`] once, in source order, and reports every declaration or
//! statement whose marker disagrees with whether it may throw. It reads the tree only and has
//! no failure mode: malformed shapes classify as "does not match".

pub mod annotation;
pub mod position;
pub mod throws;

use tracing::{debug, trace};

use crate::config::{CheckConfig, Coverage};
use crate::diagnostics::{Category, Diagnostic};
use crate::parser::ast::{Decl, NodeId, Stmt, Tree};
use crate::visit::{Visitor, walk_decl, walk_stmt};

pub use annotation::{decl_has_annotation, own_wrapper, stmt_has_annotation};
pub use position::{is_covered, is_eligible, statement_throws};
pub use throws::{can_throw, is_throwing_expr};

/// Run the pass over every root of `tree`.
///
/// The walk recurses once per tree level. The parser keeps nesting under
/// [`MAX_NESTING_DEPTH`](crate::parser::MAX_NESTING_DEPTH), and trees from [`TreeBuilder`]
/// must respect the same bound.
///
/// [`TreeBuilder`]: crate::parser::ast::TreeBuilder
pub fn check_tree(tree: &Tree, config: &CheckConfig) -> Vec<Diagnostic> {
    let _span = tracing::debug_span!("check_tree", nodes = tree.len()).entered();
    let mut checker = Checker::new(config);
    checker.visit_tree(tree);
    debug!(count = checker.diagnostics.len(), "check finished");
    checker.into_diagnostics()
}

/// What the checker concluded about one eligible statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StmtVerdict {
    /// Classification after coverage is applied.
    pub throws: bool,
    pub marked: bool,
    pub covered: bool,
}

impl StmtVerdict {
    pub fn category(self) -> Option<Category> {
        match (self.marked, self.throws) {
            (true, false) => Some(Category::StmtSuperfluousAnnotation),
            (false, true) => Some(Category::StmtMissingAnnotation),
            _ => None,
        }
    }
}

/// Verdict for `stmt`, or `None` when it is not checked at statement level.
pub fn stmt_verdict(tree: &Tree, stmt: NodeId, coverage: Coverage) -> Option<StmtVerdict> {
    if !is_eligible(tree, stmt) {
        return None;
    }
    let covered = is_covered(tree, stmt, coverage);
    Some(StmtVerdict {
        throws: !covered && statement_throws(tree, stmt),
        marked: stmt_has_annotation(tree, stmt),
        covered,
    })
}

/// Category for a variable declaration, or `None` when marker and initializer agree.
pub fn decl_verdict(tree: &Tree, decl: NodeId) -> Option<Category> {
    let Some(Decl::Var { init, .. }) = tree.as_decl(decl) else { return None };
    let throws = throws::slot_throws(tree, *init);
    match (decl_has_annotation(tree, decl), throws) {
        (true, false) => Some(Category::DeclSuperfluousAnnotation),
        (false, true) => Some(Category::DeclMissingAnnotation),
        _ => None,
    }
}

pub struct Checker<'a> {
    config: &'a CheckConfig,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
    pub fn new(config: &'a CheckConfig) -> Self {
        Self { config, diagnostics: Vec::new() }
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn report(&mut self, tree: &Tree, node: NodeId, category: Category) {
        let span = tree.span(node);
        debug!(%node, %category, start = span.start, end = span.end, "diagnostic");
        self.diagnostics.push(Diagnostic::new(node, span, category, &self.config.marker));
    }
}

impl Visitor for Checker<'_> {
    fn visit_decl(&mut self, tree: &Tree, id: NodeId, decl: &Decl) {
        if self.config.declarations {
            if let Some(category) = decl_verdict(tree, id) {
                self.report(tree, id, category);
            }
        }
        walk_decl(self, tree, id, decl);
    }

    fn visit_stmt(&mut self, tree: &Tree, id: NodeId, stmt: &Stmt) {
        if self.config.statements {
            if let Some(verdict) = stmt_verdict(tree, id, self.config.coverage) {
                trace!(node = %id, kind = stmt.keyword(), ?verdict, "statement");
                match verdict.category() {
                    // Points at the marker rather than the statement.
                    Some(category @ Category::StmtSuperfluousAnnotation) => {
                        let at = own_wrapper(tree, id).unwrap_or(id);
                        self.report(tree, at, category);
                    }
                    Some(category) => self.report(tree, id, category),
                    None => {}
                }
            }
        }
        walk_stmt(self, tree, id, stmt);
    }
}
