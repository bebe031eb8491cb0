//! Tree visitor infrastructure
//!
//! `Visitor` walks a [`Tree`] in source order (pre-order). Every method has a default that
//! recurses through the matching `walk_*` function.
//!
//! ## Usage
//!
//! Implement the trait for your pass, overriding only the methods you need. Call the
//! corresponding `walk_*` function inside your override to keep recursing; omit it to prune
//! traversal at that node.
//!
//! ```rust
//! use throwcheck::parser::ast::{Expr, NodeId, Tree};
//! use throwcheck::visit::{Visitor, walk_expr};
//!
//! struct CallCounter {
//!     calls: usize,
//! }
//!
//! impl Visitor for CallCounter {
//!     fn visit_expr(&mut self, tree: &Tree, id: NodeId, expr: &Expr) {
//!         if matches!(expr, Expr::Call { .. }) {
//!             self.calls += 1;
//!         }
//!         walk_expr(self, tree, id, expr);
//!     }
//! }
//! ```

use crate::parser::ast::*;

/// Read-only tree visitor. Default implementations recurse into all children.
pub trait Visitor: Sized {
    fn visit_tree(&mut self, tree: &Tree) {
        walk_tree(self, tree);
    }

    /// Dispatch on the node's kind tag. Dangling ids are skipped.
    fn visit_node(&mut self, tree: &Tree, id: NodeId) {
        walk_node(self, tree, id);
    }

    fn visit_decl(&mut self, tree: &Tree, id: NodeId, decl: &Decl) {
        walk_decl(self, tree, id, decl);
    }

    fn visit_stmt(&mut self, tree: &Tree, id: NodeId, stmt: &Stmt) {
        walk_stmt(self, tree, id, stmt);
    }

    fn visit_expr(&mut self, tree: &Tree, id: NodeId, expr: &Expr) {
        walk_expr(self, tree, id, expr);
    }

    fn visit_annotated(&mut self, tree: &Tree, id: NodeId, stmt: Option<NodeId>) {
        walk_annotated(self, tree, id, stmt);
    }
}

pub fn walk_tree<V: Visitor>(v: &mut V, tree: &Tree) {
    for &root in tree.roots() {
        v.visit_node(tree, root);
    }
}

pub fn walk_node<V: Visitor>(v: &mut V, tree: &Tree, id: NodeId) {
    let Some(node) = tree.get(id) else { return };
    match &node.kind {
        NodeKind::Decl(decl) => v.visit_decl(tree, id, decl),
        NodeKind::Stmt(stmt) => v.visit_stmt(tree, id, stmt),
        NodeKind::Expr(expr) => v.visit_expr(tree, id, expr),
        NodeKind::Annotated { stmt } => v.visit_annotated(tree, id, *stmt),
    }
}

pub fn walk_decl<V: Visitor>(v: &mut V, tree: &Tree, _id: NodeId, decl: &Decl) {
    match decl {
        Decl::Var { init, .. } => {
            if let Some(init) = init {
                v.visit_node(tree, *init);
            }
        }
        Decl::Function { body, .. } => {
            if let Some(body) = body {
                v.visit_node(tree, *body);
            }
        }
        // Constructors are callables, not nodes
        Decl::Record { .. } => {}
    }
}

pub fn walk_stmt<V: Visitor>(v: &mut V, tree: &Tree, _id: NodeId, stmt: &Stmt) {
    match stmt {
        Stmt::Compound { stmts } => {
            for s in stmts {
                v.visit_node(tree, *s);
            }
        }
        Stmt::Decl { decls } => {
            for d in decls {
                v.visit_node(tree, *d);
            }
        }
        Stmt::If { cond, then_branch, else_branch } => {
            v.visit_node(tree, *cond);
            v.visit_node(tree, *then_branch);
            if let Some(eb) = else_branch {
                v.visit_node(tree, *eb);
            }
        }
        Stmt::For { init, cond, inc, body } => {
            for part in [init, cond, inc].into_iter().flatten() {
                v.visit_node(tree, *part);
            }
            v.visit_node(tree, *body);
        }
        Stmt::While { cond, body } | Stmt::Switch { cond, body } => {
            v.visit_node(tree, *cond);
            v.visit_node(tree, *body);
        }
        Stmt::Do { body, cond } => {
            v.visit_node(tree, *body);
            v.visit_node(tree, *cond);
        }
        Stmt::Case { value, stmt } => {
            if let Some(value) = value {
                v.visit_node(tree, *value);
            }
            if let Some(stmt) = stmt {
                v.visit_node(tree, *stmt);
            }
        }
        Stmt::Throw { operand: Some(e) } | Stmt::Return { value: Some(e) } => v.visit_node(tree, *e),
        Stmt::Expr { expr } => v.visit_node(tree, *expr),
        Stmt::Throw { operand: None }
        | Stmt::Return { value: None }
        | Stmt::Break
        | Stmt::Continue
        | Stmt::Null => {}
    }
}

pub fn walk_expr<V: Visitor>(v: &mut V, tree: &Tree, _id: NodeId, expr: &Expr) {
    match expr {
        Expr::Call { args, .. } | Expr::Construct { args, .. } => {
            for arg in args {
                v.visit_node(tree, *arg);
            }
        }
        Expr::Unary { operand, .. } => v.visit_node(tree, *operand),
        Expr::Binary { lhs, rhs, .. } => {
            v.visit_node(tree, *lhs);
            v.visit_node(tree, *rhs);
        }
        Expr::Assign { target, value, .. } => {
            v.visit_node(tree, *target);
            v.visit_node(tree, *value);
        }
        Expr::Conditional { cond, then_expr, else_expr } => {
            v.visit_node(tree, *cond);
            v.visit_node(tree, *then_expr);
            v.visit_node(tree, *else_expr);
        }
        Expr::Paren(inner) => v.visit_node(tree, *inner),
        Expr::Ident(_) | Expr::IntLit(_) | Expr::BoolLit(_) | Expr::StrLit(_) | Expr::CharLit => {}
    }
}

pub fn walk_annotated<V: Visitor>(v: &mut V, tree: &Tree, _id: NodeId, stmt: Option<NodeId>) {
    if let Some(stmt) = stmt {
        v.visit_node(tree, stmt);
    }
}
