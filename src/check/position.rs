//! Which statements are checked, how each kind is classified, and when an enclosing marker
//! already answers for a statement.

use crate::config::Coverage;
use crate::parser::ast::{NodeId, NodeKind, Stmt, Tree};

use super::annotation::own_wrapper;
use super::throws::{is_throwing_expr, slot_throws};

/// Per-kind classification of a statement, ignoring coverage. Excluded kinds (blocks,
/// declaration statements, explicit throws, case labels) classify as non-throwing.
pub fn statement_throws(tree: &Tree, stmt: NodeId) -> bool {
    let Some(s) = tree.as_stmt(stmt) else { return false };
    match s {
        Stmt::If { cond, .. }
        | Stmt::While { cond, .. }
        | Stmt::Do { cond, .. }
        | Stmt::Switch { cond, .. } => is_throwing_expr(tree, *cond),
        Stmt::For { init, cond, inc, .. } => {
            for_init_throws(tree, *init) || slot_throws(tree, *cond) || slot_throws(tree, *inc)
        }
        Stmt::Expr { expr } => is_throwing_expr(tree, *expr),
        Stmt::Return { value } => slot_throws(tree, *value),
        Stmt::Break | Stmt::Continue | Stmt::Null => false,
        Stmt::Decl { .. } | Stmt::Compound { .. } | Stmt::Throw { .. } | Stmt::Case { .. } => false,
    }
}

// Declaration inits are reported on the declarators, not on the loop.
fn for_init_throws(tree: &Tree, init: Option<NodeId>) -> bool {
    match init.and_then(|id| tree.as_stmt(id)) {
        Some(Stmt::Expr { expr }) => is_throwing_expr(tree, *expr),
        _ => false,
    }
}

/// A statement is a candidate when it sits in a block, under a case label, inside a marker
/// wrapper, or in a substatement slot of a control-flow statement.
pub fn is_eligible(tree: &Tree, stmt: NodeId) -> bool {
    match tree.as_stmt(stmt) {
        None | Some(Stmt::Decl { .. }) => return false,
        Some(_) => {}
    }
    let Some(parent) = tree.parent(stmt) else { return false };
    match tree.kind(parent) {
        Some(NodeKind::Stmt(p)) => match p {
            Stmt::Compound { .. } => true,
            Stmt::Case { stmt: labelled, .. } => *labelled == Some(stmt),
            Stmt::If { then_branch, else_branch, .. } => {
                *then_branch == stmt || *else_branch == Some(stmt)
            }
            Stmt::For { body, .. }
            | Stmt::While { body, .. }
            | Stmt::Do { body, .. }
            | Stmt::Switch { body, .. } => *body == stmt,
            _ => false,
        },
        Some(NodeKind::Annotated { stmt: Some(inner) }) => *inner == stmt,
        _ => false,
    }
}

/// True when a marker on some enclosing statement already answers for `stmt`.
pub fn is_covered(tree: &Tree, stmt: NodeId, coverage: Coverage) -> bool {
    if coverage == Coverage::HeaderOnly {
        return false;
    }
    let own = own_wrapper(tree, stmt);
    tree.ancestors(stmt)
        .filter(|&a| Some(a) != own)
        .any(|a| matches!(tree.kind(a), Some(NodeKind::Annotated { stmt: Some(_) })))
}
