//! Arena-backed syntax tree.
//!
//! Every node lives in one `Vec` owned by [`Tree`] and is addressed by a [`NodeId`]. Parent links
//! are plain indices filled in when a node is attached, so ancestor queries never touch ownership.
//! Call and construction targets live in a side table of [`Callable`]s addressed by
//! [`CallableId`].

use crate::span::Span;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CallableId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CallableKind {
    Function,
    Constructor,
}

/// Resolved target of a call or construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Callable {
    pub name: String,
    pub kind: CallableKind,
    pub params: usize,
    /// The exception specification forbids propagation (`noexcept`, `throw()`).
    pub no_throw: bool,
    /// Declared with foreign-language linkage (`extern "C"`).
    pub extern_linkage: bool,
    pub span: Span,
}

impl Callable {
    pub fn function(name: impl Into<String>, params: usize) -> Self {
        Self {
            name: name.into(),
            kind: CallableKind::Function,
            params,
            no_throw: false,
            extern_linkage: false,
            span: Span::dummy(),
        }
    }

    pub fn constructor(record: impl Into<String>, params: usize) -> Self {
        Self { kind: CallableKind::Constructor, ..Self::function(record, params) }
    }

    pub fn no_throw(mut self) -> Self {
        self.no_throw = true;
        self
    }

    pub fn extern_c(mut self) -> Self {
        self.extern_linkage = true;
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// Coarse kind tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    Declaration,
    Statement,
    Expression,
    Annotation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub span: Span,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Decl(Decl),
    Stmt(Stmt),
    Expr(Expr),
    /// Marker wrapper over exactly one statement. An empty slot annotates nothing.
    Annotated { stmt: Option<NodeId> },
}

impl NodeKind {
    pub fn class(&self) -> NodeClass {
        match self {
            NodeKind::Decl(_) => NodeClass::Declaration,
            NodeKind::Stmt(_) => NodeClass::Statement,
            NodeKind::Expr(_) => NodeClass::Expression,
            NodeKind::Annotated { .. } => NodeClass::Annotation,
        }
    }
}

impl From<Decl> for NodeKind {
    fn from(d: Decl) -> Self {
        NodeKind::Decl(d)
    }
}

impl From<Stmt> for NodeKind {
    fn from(s: Stmt) -> Self {
        NodeKind::Stmt(s)
    }
}

impl From<Expr> for NodeKind {
    fn from(e: Expr) -> Self {
        NodeKind::Expr(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Var {
        name: String,
        ty: String,
        init: Option<NodeId>,
        annotated: bool,
    },
    Function {
        callable: CallableId,
        body: Option<NodeId>,
    },
    Record {
        name: String,
        ctors: Vec<CallableId>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Compound { stmts: Vec<NodeId> },
    Decl { decls: Vec<NodeId> },
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    For {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        inc: Option<NodeId>,
        body: NodeId,
    },
    While { cond: NodeId, body: NodeId },
    Do { body: NodeId, cond: NodeId },
    Switch { cond: NodeId, body: NodeId },
    /// `case value:` or, with no value, `default:`.
    Case { value: Option<NodeId>, stmt: Option<NodeId> },
    Throw { operand: Option<NodeId> },
    Return { value: Option<NodeId> },
    Expr { expr: NodeId },
    Break,
    Continue,
    Null,
}

impl Stmt {
    pub fn keyword(&self) -> &'static str {
        match self {
            Stmt::Compound { .. } => "compound",
            Stmt::Decl { .. } => "decl",
            Stmt::If { .. } => "if",
            Stmt::For { .. } => "for",
            Stmt::While { .. } => "while",
            Stmt::Do { .. } => "do",
            Stmt::Switch { .. } => "switch",
            Stmt::Case { value: Some(_), .. } => "case",
            Stmt::Case { value: None, .. } => "default",
            Stmt::Throw { .. } => "throw",
            Stmt::Return { .. } => "return",
            Stmt::Expr { .. } => "expr",
            Stmt::Break => "break",
            Stmt::Continue => "continue",
            Stmt::Null => "null",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `target` is `None` for calls the resolver could not bind to a declaration.
    Call {
        callee: String,
        target: Option<CallableId>,
        args: Vec<NodeId>,
    },
    /// Object construction, explicit (`S(1)`, `S{}`) or implied by `S s;`.
    Construct {
        record: String,
        target: Option<CallableId>,
        args: Vec<NodeId>,
    },
    Unary { op: UnaryOp, operand: NodeId },
    Binary { op: BinOp, lhs: NodeId, rhs: NodeId },
    /// `target = value`, or `target op= value` when `op` is set.
    Assign {
        op: Option<BinOp>,
        target: NodeId,
        value: NodeId,
    },
    Conditional {
        cond: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    },
    Paren(NodeId),
    Ident(String),
    IntLit(i64),
    BoolLit(bool),
    StrLit(String),
    CharLit,
}

/// Child slots of a node, in source order.
pub fn child_ids(kind: &NodeKind) -> Vec<NodeId> {
    let mut out = Vec::new();
    match kind {
        NodeKind::Decl(decl) => match decl {
            Decl::Var { init, .. } => out.extend(*init),
            Decl::Function { body, .. } => out.extend(*body),
            Decl::Record { .. } => {}
        },
        NodeKind::Stmt(stmt) => match stmt {
            Stmt::Compound { stmts } => out.extend(stmts.iter().copied()),
            Stmt::Decl { decls } => out.extend(decls.iter().copied()),
            Stmt::If { cond, then_branch, else_branch } => {
                out.push(*cond);
                out.push(*then_branch);
                out.extend(*else_branch);
            }
            Stmt::For { init, cond, inc, body } => {
                out.extend(*init);
                out.extend(*cond);
                out.extend(*inc);
                out.push(*body);
            }
            Stmt::While { cond, body } | Stmt::Switch { cond, body } => {
                out.push(*cond);
                out.push(*body);
            }
            Stmt::Do { body, cond } => {
                out.push(*body);
                out.push(*cond);
            }
            Stmt::Case { value, stmt } => {
                out.extend(*value);
                out.extend(*stmt);
            }
            Stmt::Throw { operand } => out.extend(*operand),
            Stmt::Return { value } => out.extend(*value),
            Stmt::Expr { expr } => out.push(*expr),
            Stmt::Break | Stmt::Continue | Stmt::Null => {}
        },
        NodeKind::Expr(expr) => match expr {
            Expr::Call { args, .. } | Expr::Construct { args, .. } => out.extend(args.iter().copied()),
            Expr::Unary { operand, .. } => out.push(*operand),
            Expr::Binary { lhs, rhs, .. } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            Expr::Assign { target, value, .. } => {
                out.push(*target);
                out.push(*value);
            }
            Expr::Conditional { cond, then_expr, else_expr } => {
                out.push(*cond);
                out.push(*then_expr);
                out.push(*else_expr);
            }
            Expr::Paren(inner) => out.push(*inner),
            Expr::Ident(_) | Expr::IntLit(_) | Expr::BoolLit(_) | Expr::StrLit(_) | Expr::CharLit => {}
        },
        NodeKind::Annotated { stmt } => out.extend(*stmt),
    }
    out
}

/// One translation unit: the node arena, the callable table and the top-level declarations.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    callables: Vec<Callable>,
    roots: Vec<NodeId>,
}

impl Tree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Lookup that tolerates dangling ids from partially-built trees.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|n| &n.kind)
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.get(id).map_or(Span::dummy(), |n| n.span)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).map(child_ids).unwrap_or_default()
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors { tree: self, next: self.parent(id) }
    }

    pub fn as_decl(&self, id: NodeId) -> Option<&Decl> {
        match self.kind(id)? {
            NodeKind::Decl(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_stmt(&self, id: NodeId) -> Option<&Stmt> {
        match self.kind(id)? {
            NodeKind::Stmt(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_expr(&self, id: NodeId) -> Option<&Expr> {
        match self.kind(id)? {
            NodeKind::Expr(e) => Some(e),
            _ => None,
        }
    }

    pub fn callable(&self, id: CallableId) -> Option<&Callable> {
        self.callables.get(id.0 as usize)
    }

    pub fn callables(&self) -> &[Callable] {
        &self.callables
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }
}

pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Appends nodes bottom-up. Adding a node sets the parent of every child it names.
///
/// Nothing limits depth here. Keep hand-built trees within
/// [`MAX_NESTING_DEPTH`](crate::parser::MAX_NESTING_DEPTH) levels, as the parser does.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
    callables: Vec<Callable>,
    roots: Vec<NodeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_callable(&mut self, callable: Callable) -> CallableId {
        self.callables.push(callable);
        CallableId(self.callables.len() as u32 - 1)
    }

    pub fn callable_mut(&mut self, id: CallableId) -> Option<&mut Callable> {
        self.callables.get_mut(id.0 as usize)
    }

    pub fn callables(&self) -> &[Callable] {
        &self.callables
    }

    pub fn add(&mut self, kind: impl Into<NodeKind>, span: Span) -> NodeId {
        let kind = kind.into();
        let id = NodeId(self.nodes.len() as u32);
        for child in child_ids(&kind) {
            if let Some(node) = self.nodes.get_mut(child.index()) {
                node.parent = Some(id);
            }
        }
        self.nodes.push(Node { span, parent: None, kind });
        id
    }

    /// Bind a call or construction to its resolved target. Other nodes are left alone.
    pub fn set_target(&mut self, id: NodeId, resolved: CallableId) {
        if let Some(Node { kind: NodeKind::Expr(Expr::Call { target, .. } | Expr::Construct { target, .. }), .. }) =
            self.nodes.get_mut(id.index())
        {
            *target = Some(resolved);
        }
    }

    pub fn root(&mut self, id: NodeId) {
        self.roots.push(id);
    }

    pub fn finish(self) -> Tree {
        Tree { nodes: self.nodes, callables: self.callables, roots: self.roots }
    }

    // ── Shorthands for hand-built trees ─────────────────────────────
    //
    // Each gives the node a one-byte span at its own index so diagnostics stay distinguishable.

    fn next_span(&self) -> Span {
        let at = self.nodes.len();
        Span::new(at, at + 1)
    }

    pub fn call(&mut self, target: CallableId, args: Vec<NodeId>) -> NodeId {
        let callee = self.callables.get(target.0 as usize).map(|c| c.name.clone()).unwrap_or_default();
        let span = self.next_span();
        self.add(Expr::Call { callee, target: Some(target), args }, span)
    }

    pub fn construct(&mut self, target: CallableId, args: Vec<NodeId>) -> NodeId {
        let record = self.callables.get(target.0 as usize).map(|c| c.name.clone()).unwrap_or_default();
        let span = self.next_span();
        self.add(Expr::Construct { record, target: Some(target), args }, span)
    }

    pub fn int(&mut self, value: i64) -> NodeId {
        let span = self.next_span();
        self.add(Expr::IntLit(value), span)
    }

    pub fn ident(&mut self, name: &str) -> NodeId {
        let span = self.next_span();
        self.add(Expr::Ident(name.to_string()), span)
    }

    pub fn binary(&mut self, op: BinOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        let span = self.next_span();
        self.add(Expr::Binary { op, lhs, rhs }, span)
    }

    pub fn expr_stmt(&mut self, expr: NodeId) -> NodeId {
        let span = self.next_span();
        self.add(Stmt::Expr { expr }, span)
    }

    pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        let span = self.next_span();
        self.add(Stmt::Return { value }, span)
    }

    pub fn throw(&mut self, operand: Option<NodeId>) -> NodeId {
        let span = self.next_span();
        self.add(Stmt::Throw { operand }, span)
    }

    pub fn compound(&mut self, stmts: Vec<NodeId>) -> NodeId {
        let span = self.next_span();
        self.add(Stmt::Compound { stmts }, span)
    }

    pub fn if_stmt(&mut self, cond: NodeId, then_branch: NodeId, else_branch: Option<NodeId>) -> NodeId {
        let span = self.next_span();
        self.add(Stmt::If { cond, then_branch, else_branch }, span)
    }

    pub fn while_stmt(&mut self, cond: NodeId, body: NodeId) -> NodeId {
        let span = self.next_span();
        self.add(Stmt::While { cond, body }, span)
    }

    pub fn annotated(&mut self, stmt: NodeId) -> NodeId {
        let span = self.next_span();
        self.add(NodeKind::Annotated { stmt: Some(stmt) }, span)
    }

    pub fn var(&mut self, name: &str, init: Option<NodeId>, annotated: bool) -> NodeId {
        let span = self.next_span();
        self.add(Decl::Var { name: name.to_string(), ty: "int".to_string(), init, annotated }, span)
    }

    pub fn decl_stmt(&mut self, decls: Vec<NodeId>) -> NodeId {
        let span = self.next_span();
        self.add(Stmt::Decl { decls }, span)
    }

    /// A function definition registered as a root.
    pub fn function(&mut self, name: &str, body: NodeId) -> NodeId {
        let callable = self.add_callable(Callable::function(name, 0));
        let span = self.next_span();
        let id = self.add(Decl::Function { callable, body: Some(body) }, span);
        self.root(id);
        id
    }
}
