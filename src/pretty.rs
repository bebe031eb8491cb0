use crate::check::{self, can_throw};
use crate::config::CheckConfig;
use crate::parser::ast::*;

/// Dump a resolved tree one node per line, with what the checker concludes about each node.
pub fn pretty_tree(tree: &Tree, config: &CheckConfig) -> String {
    let mut pp = TreePrinter::new(tree, config);
    for &root in tree.roots() {
        pp.emit_node(root);
    }
    pp.buf
}

struct TreePrinter<'a> {
    tree: &'a Tree,
    config: &'a CheckConfig,
    buf: String,
    indent: usize,
}

impl<'a> TreePrinter<'a> {
    fn new(tree: &'a Tree, config: &'a CheckConfig) -> Self {
        Self { tree, config, buf: String::new(), indent: 0 }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.buf.push_str("  ");
        }
    }

    fn line(&mut self, id: NodeId, desc: &str) {
        self.write_indent();
        let span = self.tree.span(id);
        self.buf.push_str(&format!("{id} {desc} @{}..{}\n", span.start, span.end));
    }

    fn emit_node(&mut self, id: NodeId) {
        let Some(kind) = self.tree.kind(id) else { return };
        let desc = match kind {
            NodeKind::Decl(decl) => self.describe_decl(id, decl),
            NodeKind::Stmt(stmt) => self.describe_stmt(id, stmt),
            NodeKind::Expr(expr) => self.describe_expr(expr),
            NodeKind::Annotated { stmt: Some(_) } => format!("[[{}]]", self.config.marker),
            NodeKind::Annotated { stmt: None } => format!("[[{}]] (empty)", self.config.marker),
        };
        self.line(id, &desc);
        self.indent += 1;
        for child in self.tree.children(id) {
            self.emit_node(child);
        }
        self.indent -= 1;
    }

    // ── Declarations ─────────────────────────────────────────────────

    fn describe_decl(&self, id: NodeId, decl: &Decl) -> String {
        match decl {
            Decl::Var { name, ty, annotated, .. } => {
                let mut desc = format!("var {name}: {ty}");
                if *annotated {
                    desc.push_str(" marked");
                }
                if let Some(category) = check::decl_verdict(self.tree, id).filter(|_| self.config.declarations) {
                    desc.push_str(&format!(" -> {category}"));
                }
                desc
            }
            Decl::Function { callable, body } => {
                let what = if body.is_some() { "define" } else { "declare" };
                format!("{what} {}", self.describe_callable(*callable))
            }
            Decl::Record { name, ctors } => format!("record {name} ({} constructors)", ctors.len()),
        }
    }

    fn describe_callable(&self, id: CallableId) -> String {
        let Some(c) = self.tree.callable(id) else { return "<unknown callable>".to_string() };
        let kind = match c.kind {
            CallableKind::Function => "fn",
            CallableKind::Constructor => "ctor",
        };
        let mut desc = format!("{kind} {}/{}", c.name, c.params);
        if c.no_throw {
            desc.push_str(" noexcept");
        }
        if c.extern_linkage {
            desc.push_str(" extern-c");
        }
        if can_throw(c) {
            desc.push_str(" may-throw");
        }
        desc
    }

    // ── Statements ───────────────────────────────────────────────────

    fn describe_stmt(&self, id: NodeId, stmt: &Stmt) -> String {
        let mut desc = stmt.keyword().to_string();
        if !self.config.statements {
            return desc;
        }
        if let Some(verdict) = check::stmt_verdict(self.tree, id, self.config.coverage) {
            desc.push_str(if verdict.throws { " throws" } else { " quiet" });
            if verdict.marked {
                desc.push_str(" marked");
            }
            if verdict.covered {
                desc.push_str(" covered");
            }
            if let Some(category) = verdict.category() {
                desc.push_str(&format!(" -> {category}"));
            }
        }
        desc
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn describe_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Call { callee, target, .. } => format!("call {callee} {}", self.describe_target(*target)),
            Expr::Construct { record, target, .. } => {
                format!("construct {record} {}", self.describe_target(*target))
            }
            Expr::Unary { op, .. } => format!("unary {op:?}"),
            Expr::Binary { op, .. } => format!("binary {op}"),
            Expr::Assign { op: Some(op), .. } => format!("assign {op}="),
            Expr::Assign { op: None, .. } => "assign =".to_string(),
            Expr::Conditional { .. } => "conditional".to_string(),
            Expr::Paren(_) => "paren".to_string(),
            Expr::Ident(name) => format!("ident {name}"),
            Expr::IntLit(n) => format!("int {n}"),
            Expr::BoolLit(b) => format!("bool {b}"),
            Expr::StrLit(s) => format!("string {s:?}"),
            Expr::CharLit => "char".to_string(),
        }
    }

    fn describe_target(&self, target: Option<CallableId>) -> String {
        match target {
            Some(id) => format!("-> {}", self.describe_callable(id)),
            None => "-> unresolved".to_string(),
        }
    }
}
