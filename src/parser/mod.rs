pub mod ast;

use std::collections::{HashMap, HashSet};

use crate::diagnostics::CompileError;
use crate::lexer::token::Token;
use crate::span::{Span, Spanned};
use ast::*;

/// A call or construction bound to its target once every declaration has been seen.
struct PendingTarget {
    node: NodeId,
    kind: CallableKind,
    name: String,
    argc: usize,
    span: Span,
}

/// Declared type of a variable. `record` is set only for a record held by value.
struct ParsedType {
    text: String,
    record: Option<String>,
}

/// Deepest statement or expression nesting the parser accepts. Tree walks recurse once per
/// level, so trees from the parser stay well inside a thread's stack.
pub const MAX_NESTING_DEPTH: usize = 256;

pub struct Parser<'a> {
    tokens: &'a [Spanned<Token>],
    source: &'a str,
    pos: usize,
    marker: &'a str,
    record_names: HashSet<String>,
    functions: HashMap<String, Vec<CallableId>>,
    ctors: HashMap<String, Vec<CallableId>>,
    pending: Vec<PendingTarget>,
    builder: TreeBuilder,
    extern_c: bool,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Spanned<Token>], source: &'a str, marker: &'a str) -> Self {
        Self {
            tokens,
            source,
            pos: 0,
            marker,
            record_names: HashSet::new(),
            functions: HashMap::new(),
            ctors: HashMap::new(),
            pending: Vec::new(),
            builder: TreeBuilder::new(),
            extern_c: false,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&'a Spanned<Token>> {
        self.tokens.get(self.pos)
    }

    fn peek_nth(&self, n: usize) -> Option<&'a Spanned<Token>> {
        self.tokens.get(self.pos + n)
    }

    fn check(&self, expected: &Token) -> bool {
        self.check_nth(0, expected)
    }

    fn check_nth(&self, n: usize, expected: &Token) -> bool {
        self.peek_nth(n)
            .is_some_and(|t| std::mem::discriminant(&t.node) == std::mem::discriminant(expected))
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn advance(&mut self) -> Option<&'a Spanned<Token>> {
        let tok = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(tok)
    }

    fn expect(&mut self, expected: &Token) -> Result<&'a Spanned<Token>, CompileError> {
        match self.peek() {
            Some(tok) if std::mem::discriminant(&tok.node) == std::mem::discriminant(expected) => {
                self.pos += 1;
                Ok(tok)
            }
            Some(tok) => Err(CompileError::syntax(
                format!("expected {expected}, found {}", tok.node),
                tok.span,
            )),
            None => Err(CompileError::syntax(
                format!("expected {expected}, found end of file"),
                self.eof_span(),
            )),
        }
    }

    fn expect_ident(&mut self) -> Result<Spanned<String>, CompileError> {
        match self.peek() {
            Some(tok) if matches!(tok.node, Token::Ident) => {
                self.pos += 1;
                Ok(Spanned::new(self.text(tok.span).to_string(), tok.span))
            }
            Some(tok) => Err(CompileError::syntax(
                format!("expected identifier, found {}", tok.node),
                tok.span,
            )),
            None => Err(CompileError::syntax(
                "expected identifier, found end of file",
                self.eof_span(),
            )),
        }
    }

    fn text(&self, span: Span) -> &'a str {
        &self.source[span.start..span.end]
    }

    fn eof_span(&self) -> Span {
        if let Some(last) = self.tokens.last() {
            Span::new(last.span.end, last.span.end)
        } else {
            Span::dummy()
        }
    }

    /// Open one nesting level. A parse error ends the parse, so error paths never `leave`.
    fn enter(&mut self, what: &str) -> Result<(), CompileError> {
        if self.depth >= MAX_NESTING_DEPTH {
            let span = self.peek().map_or(self.eof_span(), |t| t.span);
            return Err(CompileError::syntax(format!("{what} nested too deeply"), span));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self, levels: usize) {
        self.depth -= levels;
    }

    fn current_start(&self) -> usize {
        self.peek().map_or(self.eof_span().start, |t| t.span.start)
    }

    /// Span from `start` to the end of the last consumed token.
    fn span_from(&self, start: usize) -> Span {
        let end = self
            .pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(start, |t| t.span.end);
        Span::new(start, end.max(start))
    }

    fn is_record_name(&self, tok: &Spanned<Token>) -> bool {
        matches!(tok.node, Token::Ident) && self.record_names.contains(self.text(tok.span))
    }

    fn pre_scan_record_names(&mut self) {
        let tokens = self.tokens;
        for pair in tokens.windows(2) {
            if matches!(pair[0].node, Token::Struct | Token::Class) && matches!(pair[1].node, Token::Ident) {
                let name = self.text(pair[1].span).to_string();
                self.record_names.insert(name);
            }
        }
    }

    pub fn parse_translation_unit(&mut self) -> Result<Tree, CompileError> {
        self.pre_scan_record_names();
        while self.peek().is_some() {
            self.parse_top_level()?;
        }
        self.resolve_targets()?;
        Ok(std::mem::take(&mut self.builder).finish())
    }

    fn parse_top_level(&mut self) -> Result<(), CompileError> {
        let start = self.current_start();
        let marked = self.parse_attributes()?;
        let Some(tok) = self.peek() else {
            return Err(CompileError::syntax("expected declaration, found end of file", self.eof_span()));
        };
        match tok.node {
            Token::Semi => {
                self.advance();
                Ok(())
            }
            Token::Extern => self.parse_extern(),
            Token::Struct | Token::Class
                if self.check_nth(2, &Token::LBrace) || self.check_nth(2, &Token::Semi) =>
            {
                self.parse_record()
            }
            _ => self.parse_top_declaration(start, marked),
        }
    }

    fn parse_extern(&mut self) -> Result<(), CompileError> {
        self.enter("linkage specification")?;
        self.expect(&Token::Extern)?;
        let linkage = match self.peek() {
            Some(Spanned { node: Token::StringLit(lang), .. }) => {
                self.advance();
                Some(lang.as_str())
            }
            _ => None,
        };
        let saved = self.extern_c;
        if let Some(lang) = linkage {
            self.extern_c = lang == "C";
        }
        let result = if linkage.is_some() && self.eat(&Token::LBrace) {
            self.parse_extern_block()
        } else {
            self.parse_top_level()
        };
        self.extern_c = saved;
        self.leave(1);
        result
    }

    fn parse_extern_block(&mut self) -> Result<(), CompileError> {
        while !self.check(&Token::RBrace) && self.peek().is_some() {
            self.parse_top_level()?;
        }
        self.expect(&Token::RBrace)?;
        Ok(())
    }

    fn parse_record(&mut self) -> Result<(), CompileError> {
        let start = self.current_start();
        self.advance(); // struct / class
        let name = self.expect_ident()?;
        if self.eat(&Token::Semi) {
            return Ok(());
        }
        self.expect(&Token::LBrace)?;

        let mut ctors = Vec::new();
        let mut bodies = Vec::new();
        while !self.check(&Token::RBrace) && self.peek().is_some() {
            // Access specifiers
            if self.check(&Token::Ident) && self.check_nth(1, &Token::Colon) {
                self.pos += 2;
                continue;
            }
            let is_ctor = self
                .peek()
                .is_some_and(|t| matches!(t.node, Token::Ident) && self.text(t.span) == name.node)
                && self.check_nth(1, &Token::LParen);
            if is_ctor {
                let (ctor, body) = self.parse_constructor(&name.node)?;
                ctors.push(ctor);
                bodies.extend(body);
            } else {
                self.parse_field()?;
            }
        }
        self.expect(&Token::RBrace)?;
        self.expect(&Token::Semi)?;

        let record = self.builder.add(Decl::Record { name: name.node, ctors }, self.span_from(start));
        self.builder.root(record);
        for body in bodies {
            self.builder.root(body);
        }
        Ok(())
    }

    fn parse_constructor(&mut self, record: &str) -> Result<(CallableId, Option<NodeId>), CompileError> {
        let start = self.current_start();
        self.advance(); // record name
        let params = self.parse_params()?;
        let no_throw = self.parse_exception_spec()?;
        let callable = Callable { no_throw, ..Callable::constructor(record, params) }.at(self.span_from(start));
        let id = self.declare(callable);

        if self.eat(&Token::Eq) {
            // `= default;` / `= delete;`
            self.advance();
            self.expect(&Token::Semi)?;
            return Ok((id, None));
        }
        if self.eat(&Token::Semi) {
            return Ok((id, None));
        }
        if let Some(tok) = self.peek().filter(|t| matches!(t.node, Token::Colon)) {
            return Err(CompileError::syntax("member initializer lists are not supported", tok.span));
        }
        let body = self.parse_compound()?;
        let node = self.builder.add(Decl::Function { callable: id, body: Some(body) }, self.span_from(start));
        Ok((id, Some(node)))
    }

    fn parse_field(&mut self) -> Result<(), CompileError> {
        self.parse_type()?;
        loop {
            self.expect_ident()?;
            if let Some(tok) = self.peek() {
                match tok.node {
                    Token::LParen => {
                        return Err(CompileError::syntax("member functions are not supported", tok.span));
                    }
                    Token::Eq | Token::LBrace => {
                        return Err(CompileError::syntax(
                            "default member initializers are not supported",
                            tok.span,
                        ));
                    }
                    _ => {}
                }
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::Semi)?;
        Ok(())
    }

    /// `decl_start` is where the declaration begins, including any attributes.
    fn parse_top_declaration(&mut self, decl_start: usize, marked: bool) -> Result<(), CompileError> {
        let start = self.current_start();
        let ty = self.parse_type()?;
        if self.is_function_declarator() {
            return self.parse_function(start);
        }
        for var in self.parse_declarators(&ty, decl_start, marked)? {
            self.builder.root(var);
        }
        Ok(())
    }

    /// `name(` followed by `)` or a parameter type. Anything else is a constructor-style
    /// initializer.
    fn is_function_declarator(&self) -> bool {
        if !(self.check(&Token::Ident) && self.check_nth(1, &Token::LParen)) {
            return false;
        }
        match self.peek_nth(2) {
            Some(tok) => {
                matches!(tok.node, Token::RParen | Token::Struct | Token::Class)
                    || tok.node.is_type_keyword()
                    || self.is_record_name(tok)
            }
            None => false,
        }
    }

    fn parse_function(&mut self, start: usize) -> Result<(), CompileError> {
        let name = self.expect_ident()?;
        let params = self.parse_params()?;
        let no_throw = self.parse_exception_spec()?;
        let callable = Callable { no_throw, extern_linkage: self.extern_c, ..Callable::function(name.node, params) }
            .at(self.span_from(start));
        let id = self.declare(callable);
        let body = if self.eat(&Token::Semi) { None } else { Some(self.parse_compound()?) };
        let node = self.builder.add(Decl::Function { callable: id, body }, self.span_from(start));
        self.builder.root(node);
        Ok(())
    }

    /// Register a callable, merging redeclarations with the same name and arity. A no-throw
    /// specification on any declaration sticks.
    fn declare(&mut self, callable: Callable) -> CallableId {
        let table = match callable.kind {
            CallableKind::Function => &mut self.functions,
            CallableKind::Constructor => &mut self.ctors,
        };
        let ids = table.entry(callable.name.clone()).or_default();
        let builder = &mut self.builder;
        let existing = ids.iter().copied().find(|id| {
            builder.callables().get(id.0 as usize).is_some_and(|c| c.params == callable.params)
        });
        if let Some(id) = existing {
            if let Some(prev) = builder.callable_mut(id) {
                prev.no_throw |= callable.no_throw;
                prev.extern_linkage |= callable.extern_linkage;
            }
            return id;
        }
        let id = builder.add_callable(callable);
        ids.push(id);
        id
    }

    fn parse_params(&mut self) -> Result<usize, CompileError> {
        self.expect(&Token::LParen)?;
        if self.check(&Token::Void) && self.check_nth(1, &Token::RParen) {
            self.advance();
        }
        let mut count = 0;
        while !self.check(&Token::RParen) {
            if count > 0 {
                self.expect(&Token::Comma)?;
            }
            self.parse_type()?;
            self.eat(&Token::Ident);
            count += 1;
        }
        self.expect(&Token::RParen)?;
        Ok(count)
    }

    /// `noexcept`, `noexcept(true|false)`, `throw()` or `throw(types...)`. Returns whether the
    /// specification forbids propagation.
    fn parse_exception_spec(&mut self) -> Result<bool, CompileError> {
        if self.eat(&Token::Noexcept) {
            if !self.eat(&Token::LParen) {
                return Ok(true);
            }
            let value = match self.advance() {
                Some(Spanned { node: Token::True, .. }) => true,
                Some(Spanned { node: Token::False, .. }) => false,
                Some(tok) => {
                    return Err(CompileError::syntax(
                        format!("expected 'true' or 'false' in noexcept, found {}", tok.node),
                        tok.span,
                    ));
                }
                None => {
                    return Err(CompileError::syntax("unterminated noexcept specifier", self.eof_span()));
                }
            };
            self.expect(&Token::RParen)?;
            return Ok(value);
        }
        if self.check(&Token::Throw) && self.check_nth(1, &Token::LParen) {
            self.pos += 2;
            let empty = self.check(&Token::RParen);
            while !self.check(&Token::RParen) {
                if self.advance().is_none() {
                    return Err(CompileError::syntax("unterminated throw specification", self.eof_span()));
                }
            }
            self.expect(&Token::RParen)?;
            return Ok(empty);
        }
        Ok(false)
    }

    fn parse_type(&mut self) -> Result<ParsedType, CompileError> {
        let start = self.current_start();
        self.eat(&Token::Const);
        let mut record = None;
        match self.advance() {
            Some(tok) if tok.node.is_type_keyword() && tok.node != Token::Const => {}
            Some(Spanned { node: Token::Struct | Token::Class, .. }) => {
                let name = self.expect_ident()?;
                record = Some(name.node);
            }
            Some(tok) if self.is_record_name(tok) => record = Some(self.text(tok.span).to_string()),
            Some(tok) if matches!(tok.node, Token::Ident) => {
                return Err(CompileError::syntax(
                    format!("unknown type name '{}'", self.text(tok.span)),
                    tok.span,
                ));
            }
            Some(tok) => {
                return Err(CompileError::syntax(format!("expected type, found {}", tok.node), tok.span));
            }
            None => return Err(CompileError::syntax("expected type, found end of file", self.eof_span())),
        }
        let mut indirect = false;
        loop {
            if self.eat(&Token::Star) || self.eat(&Token::Amp) || self.eat(&Token::AmpAmp) {
                indirect = true;
            } else if !self.eat(&Token::Const) {
                break;
            }
        }
        let text = self.text(self.span_from(start)).to_string();
        Ok(ParsedType { text, record: if indirect { None } else { record } })
    }

    fn is_decl_start(&self) -> bool {
        let Some(tok) = self.peek() else { return false };
        match &tok.node {
            t if t.is_type_keyword() => true,
            Token::Struct | Token::Class => true,
            Token::Ident if self.is_record_name(tok) => matches!(
                self.peek_nth(1).map(|t| &t.node),
                Some(Token::Ident | Token::Star | Token::Amp | Token::AmpAmp | Token::Const)
            ),
            _ => false,
        }
    }

    /// The first variable's span starts at `start`, taking in the type and any marker. Later
    /// declarators start at their name.
    fn parse_declarators(
        &mut self,
        ty: &ParsedType,
        start: usize,
        marked: bool,
    ) -> Result<Vec<NodeId>, CompileError> {
        let mut vars = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let init = self.parse_initializer(ty, &name)?;
            let from = if vars.is_empty() { start } else { name.span.start };
            let span = self.span_from(from);
            let var = Decl::Var { name: name.node, ty: ty.text.clone(), init, annotated: marked };
            vars.push(self.builder.add(var, span));
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::Semi)?;
        Ok(vars)
    }

    fn parse_initializer(
        &mut self,
        ty: &ParsedType,
        name: &Spanned<String>,
    ) -> Result<Option<NodeId>, CompileError> {
        if self.eat(&Token::Eq) {
            return Ok(Some(self.parse_assign()?));
        }
        let close = if self.check(&Token::LParen) {
            Some(Token::RParen)
        } else if self.check(&Token::LBrace) {
            Some(Token::RBrace)
        } else {
            None
        };
        match (&ty.record, close) {
            (Some(record), Some(close)) => {
                self.advance();
                let args = self.parse_args(&close)?;
                let span = self.span_from(name.span.start);
                Ok(Some(self.construct(record, args, span)))
            }
            // `S s;` runs the default constructor when the record declares any
            (Some(record), None) if self.ctors.contains_key(record) => {
                Ok(Some(self.construct(record, Vec::new(), name.span)))
            }
            (None, Some(close)) => {
                let open = self.advance().map_or(name.span, |t| t.span);
                let mut args = self.parse_args(&close)?;
                if args.len() > 1 {
                    return Err(CompileError::syntax(
                        format!("too many initializers for '{}'", name.node),
                        self.span_from(open.start),
                    ));
                }
                Ok(args.pop())
            }
            _ => Ok(None),
        }
    }

    fn construct(&mut self, record: &str, args: Vec<NodeId>, span: Span) -> NodeId {
        let argc = args.len();
        let node = self.builder.add(Expr::Construct { record: record.to_string(), target: None, args }, span);
        self.pending.push(PendingTarget {
            node,
            kind: CallableKind::Constructor,
            name: record.to_string(),
            argc,
            span,
        });
        node
    }

    /// Bind every call and construction. Overloads resolve by arity, falling back to the first
    /// declaration; records without declared constructors stay unbound.
    fn resolve_targets(&mut self) -> Result<(), CompileError> {
        for pending in std::mem::take(&mut self.pending) {
            let table = match pending.kind {
                CallableKind::Function => &self.functions,
                CallableKind::Constructor => &self.ctors,
            };
            let candidates = table.get(&pending.name).map(Vec::as_slice).unwrap_or_default();
            let Some(&first) = candidates.first() else {
                if pending.kind == CallableKind::Function {
                    return Err(CompileError::resolve(
                        format!("unknown function '{}'", pending.name),
                        pending.span,
                    ));
                }
                continue;
            };
            let callables = self.builder.callables();
            let target = candidates
                .iter()
                .copied()
                .find(|id| callables.get(id.0 as usize).is_some_and(|c| c.params == pending.argc))
                .unwrap_or(first);
            self.builder.set_target(pending.node, target);
        }
        Ok(())
    }

    // ── Attributes ──────────────────────────────────────────────────

    /// Consume any `[[...]]` lists. True when one of them names the marker.
    fn parse_attributes(&mut self) -> Result<bool, CompileError> {
        let mut marked = false;
        while self.check(&Token::LBracket) && self.check_nth(1, &Token::LBracket) {
            self.pos += 2;
            loop {
                let first = self.expect_ident()?;
                let name = if self.eat(&Token::ColonColon) {
                    format!("{}::{}", first.node, self.expect_ident()?.node)
                } else {
                    first.node
                };
                if self.eat(&Token::LParen) {
                    self.skip_balanced_parens()?;
                }
                marked |= name == self.marker;
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            self.expect(&Token::RBracket)?;
            self.expect(&Token::RBracket)?;
        }
        Ok(marked)
    }

    fn skip_balanced_parens(&mut self) -> Result<(), CompileError> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance().map(|t| &t.node) {
                Some(Token::LParen) => depth += 1,
                Some(Token::RParen) => depth -= 1,
                Some(_) => {}
                None => return Err(CompileError::syntax("unterminated attribute argument", self.eof_span())),
            }
        }
        Ok(())
    }

    // ── Statements ──────────────────────────────────────────────────

    fn parse_compound(&mut self) -> Result<NodeId, CompileError> {
        let start = self.expect(&Token::LBrace)?.span.start;
        let mut stmts = Vec::new();
        while !self.check(&Token::RBrace) && self.peek().is_some() {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(&Token::RBrace)?;
        Ok(self.builder.add(Stmt::Compound { stmts }, self.span_from(start)))
    }

    fn parse_stmt(&mut self) -> Result<NodeId, CompileError> {
        self.enter("statement")?;
        let start = self.current_start();
        let marked = self.parse_attributes()?;
        let stmt = if self.is_decl_start() {
            // Declarations carry the marker themselves.
            self.parse_decl_stmt(start, marked)?
        } else {
            let stmt = self.parse_plain_stmt()?;
            if marked {
                self.builder.add(NodeKind::Annotated { stmt: Some(stmt) }, self.span_from(start))
            } else {
                stmt
            }
        };
        self.leave(1);
        Ok(stmt)
    }

    fn parse_decl_stmt(&mut self, start: usize, marked: bool) -> Result<NodeId, CompileError> {
        let ty = self.parse_type()?;
        let decls = self.parse_declarators(&ty, start, marked)?;
        Ok(self.builder.add(Stmt::Decl { decls }, self.span_from(start)))
    }

    fn parse_plain_stmt(&mut self) -> Result<NodeId, CompileError> {
        let Some(tok) = self.peek() else {
            return Err(CompileError::syntax("expected statement, found end of file", self.eof_span()));
        };
        let start = tok.span.start;
        match tok.node {
            Token::LBrace => self.parse_compound(),
            Token::If => self.parse_if(),
            Token::For => self.parse_for(),
            Token::While => self.parse_while(),
            Token::Do => self.parse_do(),
            Token::Switch => self.parse_switch(),
            Token::Case | Token::Default => self.parse_case(),
            Token::Break | Token::Continue => {
                self.advance();
                self.expect(&Token::Semi)?;
                let stmt = if matches!(tok.node, Token::Break) { Stmt::Break } else { Stmt::Continue };
                Ok(self.builder.add(stmt, self.span_from(start)))
            }
            Token::Return | Token::Throw => {
                self.advance();
                let value = if self.check(&Token::Semi) { None } else { Some(self.parse_expr()?) };
                self.expect(&Token::Semi)?;
                let stmt = if matches!(tok.node, Token::Return) {
                    Stmt::Return { value }
                } else {
                    Stmt::Throw { operand: value }
                };
                Ok(self.builder.add(stmt, self.span_from(start)))
            }
            Token::Semi => {
                self.advance();
                Ok(self.builder.add(Stmt::Null, tok.span))
            }
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_expr_stmt(&mut self) -> Result<NodeId, CompileError> {
        let start = self.current_start();
        let expr = self.parse_expr()?;
        self.expect(&Token::Semi)?;
        Ok(self.builder.add(Stmt::Expr { expr }, self.span_from(start)))
    }

    fn parse_paren_cond(&mut self) -> Result<NodeId, CompileError> {
        self.expect(&Token::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(&Token::RParen)?;
        Ok(cond)
    }

    fn parse_if(&mut self) -> Result<NodeId, CompileError> {
        let start = self.current_start();
        self.advance();
        let cond = self.parse_paren_cond()?;
        let then_branch = self.parse_stmt()?;
        let else_branch = if self.eat(&Token::Else) { Some(self.parse_stmt()?) } else { None };
        Ok(self.builder.add(Stmt::If { cond, then_branch, else_branch }, self.span_from(start)))
    }

    fn parse_for(&mut self) -> Result<NodeId, CompileError> {
        let start = self.current_start();
        self.advance();
        self.expect(&Token::LParen)?;
        let init_start = self.current_start();
        let marked = self.parse_attributes()?;
        let init = if self.eat(&Token::Semi) {
            None
        } else if self.is_decl_start() {
            Some(self.parse_decl_stmt(init_start, marked)?)
        } else {
            Some(self.parse_expr_stmt()?)
        };
        let cond = if self.check(&Token::Semi) { None } else { Some(self.parse_expr()?) };
        self.expect(&Token::Semi)?;
        let inc = if self.check(&Token::RParen) { None } else { Some(self.parse_expr()?) };
        self.expect(&Token::RParen)?;
        let body = self.parse_stmt()?;
        Ok(self.builder.add(Stmt::For { init, cond, inc, body }, self.span_from(start)))
    }

    fn parse_while(&mut self) -> Result<NodeId, CompileError> {
        let start = self.current_start();
        self.advance();
        let cond = self.parse_paren_cond()?;
        let body = self.parse_stmt()?;
        Ok(self.builder.add(Stmt::While { cond, body }, self.span_from(start)))
    }

    fn parse_do(&mut self) -> Result<NodeId, CompileError> {
        let start = self.current_start();
        self.advance();
        let body = self.parse_stmt()?;
        self.expect(&Token::While)?;
        let cond = self.parse_paren_cond()?;
        self.expect(&Token::Semi)?;
        Ok(self.builder.add(Stmt::Do { body, cond }, self.span_from(start)))
    }

    fn parse_switch(&mut self) -> Result<NodeId, CompileError> {
        let start = self.current_start();
        self.advance();
        let cond = self.parse_paren_cond()?;
        let body = self.parse_stmt()?;
        Ok(self.builder.add(Stmt::Switch { cond, body }, self.span_from(start)))
    }

    fn parse_case(&mut self) -> Result<NodeId, CompileError> {
        let start = self.current_start();
        let value = if self.eat(&Token::Default) {
            None
        } else {
            self.expect(&Token::Case)?;
            Some(self.parse_ternary()?)
        };
        self.expect(&Token::Colon)?;
        let stmt = if self.check(&Token::RBrace) || self.peek().is_none() {
            None
        } else {
            Some(self.parse_stmt()?)
        };
        Ok(self.builder.add(Stmt::Case { value, stmt }, self.span_from(start)))
    }

    // ── Expressions ─────────────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<NodeId, CompileError> {
        self.parse_assign()
    }

    fn parse_assign(&mut self) -> Result<NodeId, CompileError> {
        self.enter("expression")?;
        let start = self.current_start();
        let target = self.parse_ternary()?;
        let op = match self.peek().map(|t| &t.node) {
            Some(Token::Eq) => None,
            Some(Token::PlusEq) => Some(BinOp::Add),
            Some(Token::MinusEq) => Some(BinOp::Sub),
            _ => {
                self.leave(1);
                return Ok(target);
            }
        };
        self.advance();
        let value = self.parse_assign()?;
        self.leave(1);
        Ok(self.builder.add(Expr::Assign { op, target, value }, self.span_from(start)))
    }

    fn parse_ternary(&mut self) -> Result<NodeId, CompileError> {
        let start = self.current_start();
        let cond = self.parse_binary(0)?;
        if !self.eat(&Token::Question) {
            return Ok(cond);
        }
        let then_expr = self.parse_expr()?;
        self.expect(&Token::Colon)?;
        let else_expr = self.parse_assign()?;
        Ok(self.builder.add(Expr::Conditional { cond, then_expr, else_expr }, self.span_from(start)))
    }

    fn parse_binary(&mut self, min_bp: u8) -> Result<NodeId, CompileError> {
        let start = self.current_start();
        let mut lhs = self.parse_prefix()?;
        let mut levels = 0;
        while let Some(op) = self.peek().and_then(|t| binary_op(&t.node)) {
            let (lbp, rbp) = infix_binding_power(op);
            if lbp < min_bp {
                break;
            }
            // Each operator folded into `lhs` deepens it by one level.
            self.enter("expression")?;
            levels += 1;
            self.advance();
            let rhs = self.parse_binary(rbp)?;
            lhs = self.builder.add(Expr::Binary { op, lhs, rhs }, self.span_from(start));
        }
        self.leave(levels);
        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<NodeId, CompileError> {
        let start = self.current_start();
        let op = match self.peek().map(|t| &t.node) {
            Some(Token::Bang) => Some(UnaryOp::Not),
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Tilde) => Some(UnaryOp::BitNot),
            Some(Token::PlusPlus) => Some(UnaryOp::PreInc),
            Some(Token::MinusMinus) => Some(UnaryOp::PreDec),
            _ => None,
        };
        if let Some(op) = op {
            self.enter("expression")?;
            self.advance();
            let operand = self.parse_prefix()?;
            self.leave(1);
            return Ok(self.builder.add(Expr::Unary { op, operand }, self.span_from(start)));
        }

        let mut expr = self.parse_primary()?;
        let mut levels = 0;
        loop {
            let op = match self.peek().map(|t| &t.node) {
                Some(Token::PlusPlus) => UnaryOp::PostInc,
                Some(Token::MinusMinus) => UnaryOp::PostDec,
                _ => break,
            };
            self.enter("expression")?;
            levels += 1;
            self.advance();
            expr = self.builder.add(Expr::Unary { op, operand: expr }, self.span_from(start));
        }
        self.leave(levels);
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<NodeId, CompileError> {
        let Some(tok) = self.advance() else {
            return Err(CompileError::syntax("expected expression, found end of file", self.eof_span()));
        };
        let expr = match &tok.node {
            Token::IntLit(n) => Expr::IntLit(*n),
            Token::True => Expr::BoolLit(true),
            Token::False => Expr::BoolLit(false),
            Token::StringLit(s) => Expr::StrLit(s.clone()),
            Token::CharLit => Expr::CharLit,
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                return Ok(self.builder.add(Expr::Paren(inner), self.span_from(tok.span.start)));
            }
            Token::Ident => return self.parse_ident_expr(tok.span),
            other => {
                return Err(CompileError::syntax(format!("expected expression, found {other}"), tok.span));
            }
        };
        Ok(self.builder.add(expr, tok.span))
    }

    fn parse_ident_expr(&mut self, name_span: Span) -> Result<NodeId, CompileError> {
        let name = self.text(name_span).to_string();
        if self.record_names.contains(&name) {
            let close = if self.eat(&Token::LParen) {
                Token::RParen
            } else if self.eat(&Token::LBrace) {
                Token::RBrace
            } else {
                return Err(CompileError::syntax(
                    format!("expected '(' or '{{' after record name '{name}'"),
                    name_span,
                ));
            };
            let args = self.parse_args(&close)?;
            let span = self.span_from(name_span.start);
            return Ok(self.construct(&name, args, span));
        }
        if self.eat(&Token::LParen) {
            let args = self.parse_args(&Token::RParen)?;
            let argc = args.len();
            let span = self.span_from(name_span.start);
            let node = self.builder.add(Expr::Call { callee: name.clone(), target: None, args }, span);
            self.pending.push(PendingTarget { node, kind: CallableKind::Function, name, argc, span });
            return Ok(node);
        }
        Ok(self.builder.add(Expr::Ident(name), name_span))
    }

    fn parse_args(&mut self, close: &Token) -> Result<Vec<NodeId>, CompileError> {
        let mut args = Vec::new();
        while !self.check(close) {
            if !args.is_empty() {
                self.expect(&Token::Comma)?;
            }
            args.push(self.parse_assign()?);
        }
        self.expect(close)?;
        Ok(args)
    }
}

fn binary_op(tok: &Token) -> Option<BinOp> {
    Some(match tok {
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Sub,
        Token::Star => BinOp::Mul,
        Token::Slash => BinOp::Div,
        Token::Percent => BinOp::Mod,
        Token::EqEq => BinOp::Eq,
        Token::BangEq => BinOp::Neq,
        Token::Lt => BinOp::Lt,
        Token::Gt => BinOp::Gt,
        Token::LtEq => BinOp::LtEq,
        Token::GtEq => BinOp::GtEq,
        Token::AmpAmp => BinOp::And,
        Token::PipePipe => BinOp::Or,
        Token::Amp => BinOp::BitAnd,
        Token::Pipe => BinOp::BitOr,
        Token::Caret => BinOp::BitXor,
        _ => return None,
    })
}

fn infix_binding_power(op: BinOp) -> (u8, u8) {
    match op {
        BinOp::Or => (1, 2),
        BinOp::And => (3, 4),
        BinOp::BitOr => (5, 6),
        BinOp::BitXor => (7, 8),
        BinOp::BitAnd => (9, 10),
        BinOp::Eq | BinOp::Neq => (11, 12),
        BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => (13, 14),
        BinOp::Add | BinOp::Sub => (15, 16),
        BinOp::Mul | BinOp::Div | BinOp::Mod => (17, 18),
    }
}
