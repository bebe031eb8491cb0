//! Throw predicate and throwing-expression search.

use crate::parser::ast::{Callable, Expr, NodeId, Tree};
use crate::visit::{Visitor, walk_expr};

/// A callable may propagate an exception unless its specification forbids it or it has
/// foreign-language linkage.
pub fn can_throw(callable: &Callable) -> bool {
    !(callable.no_throw || callable.extern_linkage)
}

/// True when `expr`, or any expression nested inside it, calls or constructs through a resolved
/// target that can throw. Non-expression ids are never throwing.
pub fn is_throwing_expr(tree: &Tree, expr: NodeId) -> bool {
    let Some(e) = tree.as_expr(expr) else { return false };
    let mut finder = ThrowFinder { found: false };
    finder.visit_expr(tree, expr, e);
    finder.found
}

/// Same as [`is_throwing_expr`] on an optional slot.
pub fn slot_throws(tree: &Tree, slot: Option<NodeId>) -> bool {
    slot.is_some_and(|id| is_throwing_expr(tree, id))
}

struct ThrowFinder {
    found: bool,
}

impl Visitor for ThrowFinder {
    fn visit_expr(&mut self, tree: &Tree, id: NodeId, expr: &Expr) {
        if self.found {
            return;
        }
        let target = match expr {
            Expr::Call { target, .. } | Expr::Construct { target, .. } => *target,
            _ => None,
        };
        if target.and_then(|t| tree.callable(t)).is_some_and(can_throw) {
            self.found = true;
            return;
        }
        // Unresolved targets still have their arguments searched.
        walk_expr(self, tree, id, expr);
    }
}
