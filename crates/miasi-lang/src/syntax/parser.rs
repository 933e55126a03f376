use std::sync::Arc;

use crate::error::{Error, ErrorCode};
use crate::syntax::ast::*;
use crate::syntax::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Program, Vec<Error>> {
        let mut errors = Vec::new();
        let mut statements = Vec::new();

        while !self.is_at_end() {
            let pos_before = self.pos;

            match self.parse_stmt() {
                Ok(s) => statements.push(s),
                Err(e) => { errors.push(e); self.recover(); }
            }

            // nothing consumed: force-advance so the loop terminates
            // to prevent an infinite loop on unrecognised tokens
            if self.pos == pos_before {
                self.advance();
            }
        }

        if errors.is_empty() {
            Ok(Program { statements })
        } else {
            Err(errors)
        }
    }

    // ─── Definitions ─────────────────────────────────────────────────────────

    /// `function name(params) { }` and `on name(params) { }` share a shape.
    fn parse_fn_def(&mut self) -> Result<Arc<FnDef>, Error> {
        let span = self.span();
        self.advance(); // consume `function` or `on`
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let params = self.parse_param_list()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Arc::new(FnDef { name, params, body, span }))
    }

    fn parse_param_list(&mut self) -> Result<Vec<Param>, Error> {
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            let span = self.span();
            let name = self.expect_ident()?;
            params.push(Param { name, span });
            if !self.matches(TokenKind::Comma) { break; }
        }
        Ok(params)
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn parse_block(&mut self) -> Result<Vec<Stmt>, Error> {
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, Error> {
        match self.peek_kind() {
            TokenKind::Let      => self.parse_var_decl(),
            TokenKind::Set      => self.parse_set(),
            TokenKind::Function => Ok(Stmt::FnDef(self.parse_fn_def()?)),
            TokenKind::On       => Ok(Stmt::EventDef(self.parse_fn_def()?)),
            TokenKind::If       => self.parse_if(),
            TokenKind::While    => self.parse_while(),
            TokenKind::For      => self.parse_for(),
            TokenKind::Return   => self.parse_return(),
            TokenKind::Break => {
                let span = self.span();
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Break(span))
            }
            TokenKind::Continue => {
                let span = self.span();
                self.advance();
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Continue(span))
            }
            TokenKind::LBrace => {
                let span = self.span();
                Ok(Stmt::Block(self.parse_block()?, span))
            }
            _ => self.parse_assign_or_expr(),
        }
    }

    fn parse_var_decl(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Let)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::Eq)?;
        let initializer = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::VarDecl(VarDecl { name, initializer, span }))
    }

    fn parse_set(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Set)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::SetProperty { name, value, span })
    }

    /// Parses a full expression first; a following `=` turns it into an
    /// assignment if the expression is a valid target.
    fn parse_assign_or_expr(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        let expr = self.parse_expr()?;
        if self.check(TokenKind::Eq) {
            let eq = self.advance();
            let target = Self::to_target(expr, &eq)?;
            let value = self.parse_expr()?;
            self.expect(TokenKind::Semicolon)?;
            return Ok(Stmt::Assign(Assign { target, value, span }));
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Expr(expr))
    }

    fn to_target(expr: Expr, eq: &Token) -> Result<AssignTarget, Error> {
        match expr {
            Expr::Ident(name, span) => Ok(AssignTarget::Ident(name, span)),
            Expr::Index { base, index, span } => Ok(AssignTarget::Index { base, index, span }),
            Expr::Property { base, name, span } => Ok(AssignTarget::Property { base, name, span }),
            _ => Err(Error::new(
                ErrorCode::P003,
                eq.line,
                eq.column,
                "invalid assignment target; expected a variable, an index or a property",
            )),
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.matches(TokenKind::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt::If(IfStmt { condition, then_branch, else_branch, span }))
    }

    fn parse_while(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::While(WhileStmt { condition, body, span }))
    }

    fn parse_for(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;
        let var_name = self.expect_ident()?;
        self.expect(TokenKind::In)?;
        let iterable = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::For(ForStmt { var_name, iterable, body, span }))
    }

    fn parse_return(&mut self) -> Result<Stmt, Error> {
        let span = self.span();
        self.expect(TokenKind::Return)?;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Return(value, span))
    }

    // ─── Expressions (precedence climbing) ───────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr, Error> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_and()?;
        while matches!(self.peek_kind(), TokenKind::Or | TokenKind::PipePipe) {
            let span = left.span();
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Logical { left: Box::new(left), op: LogicalOp::Or, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, Error> {
        let mut left = self.parse_comparison()?;
        while matches!(self.peek_kind(), TokenKind::And | TokenKind::AmpAmp) {
            let span = left.span();
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Logical { left: Box::new(left), op: LogicalOp::And, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, Error> {
        let left = self.parse_additive()?;
        let op = match self.peek_kind() {
            TokenKind::EqEq   => CompareOp::Eq,
            TokenKind::BangEq => CompareOp::NotEq,
            TokenKind::Lt     => CompareOp::Lt,
            TokenKind::LtEq   => CompareOp::LtEq,
            TokenKind::Gt     => CompareOp::Gt,
            TokenKind::GtEq   => CompareOp::GtEq,
            _ => return Ok(left),
        };
        let span = left.span();
        self.advance();
        let right = self.parse_additive()?;
        if self.peek_kind().is_comparison() {
            let tok = self.peek();
            return Err(Error::new(ErrorCode::P001, tok.line, tok.column,
                "comparison operators cannot be chained; combine them with `and`"));
        }
        Ok(Expr::Compare { left: Box::new(left), op, right: Box::new(right), span })
    }

    fn parse_additive(&mut self) -> Result<Expr, Error> {
        let first = self.parse_multiplicative()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus  => ArithOp::Add,
                TokenKind::Minus => ArithOp::Sub,
                _ => break,
            };
            self.advance();
            rest.push((op, self.parse_multiplicative()?));
        }
        Ok(Self::chain(first, rest))
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, Error> {
        let first = self.parse_unary()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star    => ArithOp::Mul,
                TokenKind::Slash   => ArithOp::Div,
                TokenKind::Percent => ArithOp::Mod,
                _ => break,
            };
            self.advance();
            rest.push((op, self.parse_unary()?));
        }
        Ok(Self::chain(first, rest))
    }

    /// A single operand stays as itself; otherwise one chain node.
    fn chain(first: Expr, rest: Vec<(ArithOp, Expr)>) -> Expr {
        if rest.is_empty() {
            return first;
        }
        let span = first.span();
        Expr::Arith { first: Box::new(first), rest, span }
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang | TokenKind::Not => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary { op, operand: Box::new(operand), span })
    }

    fn parse_postfix(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_atom()?;

        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    let span = expr.span();
                    self.advance();
                    let name = self.expect_ident()?;
                    expr = Expr::Property { base: Box::new(expr), name, span };
                }
                TokenKind::LBracket => {
                    let span = expr.span();
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Index { base: Box::new(expr), index: Box::new(index), span };
                }
                TokenKind::LParen => {
                    let span = expr.span();
                    self.advance();
                    let args = self.parse_arg_list()?;
                    self.expect(TokenKind::RParen)?;
                    expr = Expr::Call { callee: Box::new(expr), args, span };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_atom(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        match self.peek_kind() {
            TokenKind::Int(n) => { self.advance(); Ok(Expr::Int(n, span)) }
            TokenKind::Float(x) => { self.advance(); Ok(Expr::Float(x, span)) }
            TokenKind::Bool(b) => { self.advance(); Ok(Expr::Bool(b, span)) }
            TokenKind::StringLit(s) => { self.advance(); Ok(Expr::StringLit(s, span)) }
            TokenKind::HexColor(s) => { self.advance(); Ok(Expr::HexColor(s, span)) }
            TokenKind::Ident(name) => { self.advance(); Ok(Expr::Ident(name, span)) }

            TokenKind::Rgb => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let r = self.parse_expr()?;
                self.expect(TokenKind::Comma)?;
                let g = self.parse_expr()?;
                self.expect(TokenKind::Comma)?;
                let b = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Rgb { r: Box::new(r), g: Box::new(g), b: Box::new(b), span })
            }

            // `(e)` groups, `(x, y)` is a point
            TokenKind::LParen => {
                self.advance();
                let first = self.parse_expr()?;
                if self.matches(TokenKind::Comma) {
                    let second = self.parse_expr()?;
                    self.expect(TokenKind::RParen)?;
                    return Ok(Expr::Point { x: Box::new(first), y: Box::new(second), span });
                }
                self.expect(TokenKind::RParen)?;
                Ok(first)
            }

            TokenKind::LBracket => self.parse_array(),

            kind if kind.is_shape_kind() => self.parse_shape(),

            _ => Err(self.unexpected("an expression")),
        }
    }

    /// `[a, b, c]` or `[out for x in xs if cond]`
    fn parse_array(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        self.expect(TokenKind::LBracket)?;
        if self.matches(TokenKind::RBracket) {
            return Ok(Expr::Array(Vec::new(), span));
        }

        let first = self.parse_expr()?;

        if self.matches(TokenKind::For) {
            let var_name = self.expect_ident()?;
            self.expect(TokenKind::In)?;
            let iterable = self.parse_expr()?;
            let filter = if self.matches(TokenKind::If) {
                Some(Box::new(self.parse_expr()?))
            } else {
                None
            };
            self.expect(TokenKind::RBracket)?;
            return Ok(Expr::Comprehension {
                output: Box::new(first),
                var_name,
                iterable: Box::new(iterable),
                filter,
                span,
            });
        }

        let mut items = vec![first];
        while self.matches(TokenKind::Comma) {
            if self.check(TokenKind::RBracket) { break; }
            items.push(self.parse_expr()?);
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::Array(items, span))
    }

    fn parse_shape(&mut self) -> Result<Expr, Error> {
        let span = self.span();
        let kind = match self.advance().kind {
            TokenKind::Rect     => ShapeKind::Rectangle,
            TokenKind::Circle   => ShapeKind::Circle,
            TokenKind::Triangle => ShapeKind::Triangle,
            _                   => ShapeKind::Line,
        };
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            let arg_span = self.span();
            let name = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expr()?;
            args.push(NamedArg { name, value, span: arg_span });
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RParen)?;
        Ok(Expr::Shape { kind, args, span })
    }

    // ─── Argument lists ──────────────────────────────────────────────────────

    fn parse_arg_list(&mut self) -> Result<Vec<Expr>, Error> {
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            args.push(self.parse_expr()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        Ok(args)
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(Error::new(
                ErrorCode::P002,
                tok.line,
                tok.column,
                format!("expected {}, found {}", kind.describe(), tok.kind.describe()),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, Error> {
        if let TokenKind::Ident(name) = self.peek_kind() {
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected("an identifier"))
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    fn span(&self) -> Span {
        let tok = self.peek();
        Span::new(tok.line, tok.column)
    }

    fn unexpected(&self, expected: &str) -> Error {
        let tok = self.peek();
        Error::new(
            ErrorCode::P001,
            tok.line,
            tok.column,
            format!("expected {expected}, found {}", tok.kind.describe()),
        )
    }

    /// Skip to the next statement boundary: just past a `;`, or right
    /// before a token that can only start a statement.
    fn recover(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Semicolon => { self.advance(); break; }
                TokenKind::Eof
                | TokenKind::Let
                | TokenKind::Set
                | TokenKind::Function
                | TokenKind::On
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::RBrace => break,
                _ => { self.advance(); }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::Lexer;

    fn parse(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize().unwrap();
        Parser::new(tokens).parse().unwrap()
    }

    fn parse_expr_src(src: &str) -> Expr {
        let p = parse(&format!("{src};"));
        match p.statements.into_iter().next() {
            Some(Stmt::Expr(e)) => e,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn parse_err(src: &str) -> Vec<Error> {
        let tokens = Lexer::new(src).tokenize().unwrap();
        Parser::new(tokens).parse().unwrap_err()
    }

    // ── declarations ──────────────────────────────────────────────────────────

    #[test]
    fn var_decl_with_init() {
        let p = parse("let x = 3;");
        match &p.statements[0] {
            Stmt::VarDecl(v) => {
                assert_eq!(v.name, "x");
                assert!(matches!(v.initializer, Expr::Int(3, _)));
            }
            _ => panic!("expected VarDecl"),
        }
    }

    #[test]
    fn var_decl_requires_semicolon() {
        let errs = parse_err("let x = 3");
        assert_eq!(errs[0].code, ErrorCode::P002);
    }

    #[test]
    fn set_property_statement() {
        let p = parse("set bg_color = #112233;");
        match &p.statements[0] {
            Stmt::SetProperty { name, value, .. } => {
                assert_eq!(name, "bg_color");
                assert!(matches!(value, Expr::HexColor(s, _) if s == "112233"));
            }
            _ => panic!("expected SetProperty"),
        }
    }

    #[test]
    fn function_definition() {
        let p = parse("function add(a, b) { return a + b; }");
        match &p.statements[0] {
            Stmt::FnDef(f) => {
                assert_eq!(f.name, "add");
                let names: Vec<&str> = f.params.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["a", "b"]);
                assert_eq!(f.body.len(), 1);
            }
            _ => panic!("expected FnDef"),
        }
    }

    #[test]
    fn event_definition() {
        let p = parse("on click(x, y) { print(x); }");
        match &p.statements[0] {
            Stmt::EventDef(f) => {
                assert_eq!(f.name, "click");
                assert_eq!(f.params.len(), 2);
            }
            _ => panic!("expected EventDef"),
        }
    }

    // ── assignment targets ────────────────────────────────────────────────────

    #[test]
    fn assign_to_identifier() {
        let p = parse("x = 1;");
        match &p.statements[0] {
            Stmt::Assign(a) => assert!(matches!(&a.target, AssignTarget::Ident(n, _) if n == "x")),
            _ => panic!("expected Assign"),
        }
    }

    #[test]
    fn assign_to_index() {
        let p = parse("arr[2] = 1;");
        match &p.statements[0] {
            Stmt::Assign(a) => assert!(matches!(a.target, AssignTarget::Index { .. })),
            _ => panic!("expected Assign"),
        }
    }

    #[test]
    fn assign_to_nested_property() {
        let p = parse("shapes[0].radius = 4;");
        match &p.statements[0] {
            Stmt::Assign(a) => match &a.target {
                AssignTarget::Property { base, name, .. } => {
                    assert_eq!(name, "radius");
                    assert!(matches!(**base, Expr::Index { .. }));
                }
                _ => panic!("expected property target"),
            },
            _ => panic!("expected Assign"),
        }
    }

    #[test]
    fn assign_to_call_is_error() {
        let errs = parse_err("f() = 1;");
        assert_eq!(errs[0].code, ErrorCode::P003);
    }

    #[test]
    fn assign_to_literal_is_error() {
        let errs = parse_err("3 = x;");
        assert_eq!(errs[0].code, ErrorCode::P003);
    }

    // ── control flow ──────────────────────────────────────────────────────────

    #[test]
    fn if_else() {
        let p = parse("if (x) { a(); } else b();");
        match &p.statements[0] {
            Stmt::If(i) => {
                assert!(matches!(*i.then_branch, Stmt::Block(..)));
                assert!(matches!(i.else_branch.as_deref(), Some(Stmt::Expr(_))));
            }
            _ => panic!("expected If"),
        }
    }

    #[test]
    fn if_no_else() {
        let p = parse("if (x) { }");
        match &p.statements[0] {
            Stmt::If(i) => assert!(i.else_branch.is_none()),
            _ => panic!("expected If"),
        }
    }

    #[test]
    fn while_loop() {
        let p = parse("while (i < 3) { i = i + 1; }");
        assert!(matches!(p.statements[0], Stmt::While(_)));
    }

    #[test]
    fn for_each_loop() {
        let p = parse("for (v in values) print(v);");
        match &p.statements[0] {
            Stmt::For(f) => {
                assert_eq!(f.var_name, "v");
                assert!(matches!(f.iterable, Expr::Ident(..)));
            }
            _ => panic!("expected For"),
        }
    }

    #[test]
    fn break_continue_return() {
        let p = parse("while (true) { break; continue; return; return 1; }");
        let Stmt::While(w) = &p.statements[0] else { panic!("expected While") };
        let Stmt::Block(body, _) = &*w.body else { panic!("expected Block") };
        assert!(matches!(body[0], Stmt::Break(_)));
        assert!(matches!(body[1], Stmt::Continue(_)));
        assert!(matches!(body[2], Stmt::Return(None, _)));
        assert!(matches!(body[3], Stmt::Return(Some(_), _)));
    }

    // ── expressions ───────────────────────────────────────────────────────────

    #[test]
    fn additive_chain_is_one_node() {
        match parse_expr_src("1 + 2 - 3 + 4") {
            Expr::Arith { rest, .. } => {
                let ops: Vec<ArithOp> = rest.iter().map(|(op, _)| *op).collect();
                assert_eq!(ops, vec![ArithOp::Add, ArithOp::Sub, ArithOp::Add]);
            }
            other => panic!("expected Arith, got {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter() {
        match parse_expr_src("2 + 3 * 4") {
            Expr::Arith { first, rest, .. } => {
                assert!(matches!(*first, Expr::Int(2, _)));
                assert_eq!(rest.len(), 1);
                assert!(matches!(rest[0].1, Expr::Arith { .. }));
            }
            other => panic!("expected Arith, got {other:?}"),
        }
    }

    #[test]
    fn single_operand_is_not_a_chain() {
        assert!(matches!(parse_expr_src("7"), Expr::Int(7, _)));
    }

    #[test]
    fn comparison_does_not_chain() {
        let errs = parse_err("a < b < c;");
        assert_eq!(errs[0].code, ErrorCode::P001);
    }

    #[test]
    fn comparison_below_logical() {
        match parse_expr_src("a < b and c == d") {
            Expr::Logical { left, op, right, .. } => {
                assert_eq!(op, LogicalOp::And);
                assert!(matches!(*left, Expr::Compare { op: CompareOp::Lt, .. }));
                assert!(matches!(*right, Expr::Compare { op: CompareOp::Eq, .. }));
            }
            other => panic!("expected Logical, got {other:?}"),
        }
    }

    #[test]
    fn symbolic_logical_operators() {
        assert!(matches!(parse_expr_src("a || b"), Expr::Logical { op: LogicalOp::Or, .. }));
        assert!(matches!(parse_expr_src("a && b"), Expr::Logical { op: LogicalOp::And, .. }));
    }

    #[test]
    fn unary_operators() {
        assert!(matches!(parse_expr_src("-x"), Expr::Unary { op: UnaryOp::Neg, .. }));
        assert!(matches!(parse_expr_src("!x"), Expr::Unary { op: UnaryOp::Not, .. }));
        assert!(matches!(parse_expr_src("not x"), Expr::Unary { op: UnaryOp::Not, .. }));
    }

    #[test]
    fn postfix_chain_left_to_right() {
        // f(1)[0].radius  →  Property(Index(Call))
        match parse_expr_src("f(1)[0].radius") {
            Expr::Property { base, name, .. } => {
                assert_eq!(name, "radius");
                match *base {
                    Expr::Index { base, .. } => assert!(matches!(*base, Expr::Call { .. })),
                    other => panic!("expected Index, got {other:?}"),
                }
            }
            other => panic!("expected Property, got {other:?}"),
        }
    }

    #[test]
    fn grouping_vs_point() {
        assert!(matches!(parse_expr_src("(1 + 2)"), Expr::Arith { .. }));
        assert!(matches!(parse_expr_src("(1, 2)"), Expr::Point { .. }));
    }

    #[test]
    fn rgb_literal() {
        assert!(matches!(parse_expr_src("rgb(1, 2, 3)"), Expr::Rgb { .. }));
    }

    #[test]
    fn array_literal() {
        match parse_expr_src("[1, 2.5, \"s\"]") {
            Expr::Array(items, _) => assert_eq!(items.len(), 3),
            other => panic!("expected Array, got {other:?}"),
        }
    }

    #[test]
    fn empty_array() {
        assert!(matches!(parse_expr_src("[]"), Expr::Array(ref v, _) if v.is_empty()));
    }

    #[test]
    fn comprehension_with_filter() {
        match parse_expr_src("[x * 2 for x in xs if x > 1]") {
            Expr::Comprehension { var_name, filter, .. } => {
                assert_eq!(var_name, "x");
                assert!(filter.is_some());
            }
            other => panic!("expected Comprehension, got {other:?}"),
        }
    }

    #[test]
    fn comprehension_without_filter() {
        match parse_expr_src("[v for v in range(0, 3)]") {
            Expr::Comprehension { filter, .. } => assert!(filter.is_none()),
            other => panic!("expected Comprehension, got {other:?}"),
        }
    }

    #[test]
    fn shape_literal_named_args() {
        match parse_expr_src("circle(radius: 5, color: #ff0000)") {
            Expr::Shape { kind, args, .. } => {
                assert_eq!(kind, ShapeKind::Circle);
                let names: Vec<&str> = args.iter().map(|a| a.name.as_str()).collect();
                assert_eq!(names, vec!["radius", "color"]);
            }
            other => panic!("expected Shape, got {other:?}"),
        }
    }

    #[test]
    fn shape_literal_no_args() {
        assert!(matches!(parse_expr_src("line()"), Expr::Shape { kind: ShapeKind::Line, .. }));
    }

    #[test]
    fn shape_positional_arg_is_error() {
        let errs = parse_err("rect(5);");
        assert_eq!(errs[0].code, ErrorCode::P001);
    }

    // ── recovery ──────────────────────────────────────────────────────────────

    #[test]
    fn error_recovery_collects_multiple() {
        let errs = parse_err("let = 1;\nlet y = ;\nlet z = 3;");
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0].line, 1);
        assert_eq!(errs[1].line, 2);
    }

    #[test]
    fn missing_brace_is_error() {
        let errs = parse_err("function f() { ");
        assert!(!errs.is_empty());
    }

    #[test]
    fn stray_closing_brace_does_not_hang() {
        let errs = parse_err("}}} let x = 1;");
        assert!(!errs.is_empty());
    }

    #[test]
    fn spans_point_at_statement_start() {
        let p = parse("\n  let x = 1;");
        assert_eq!(p.statements[0].span(), Span::new(2, 3));
    }

    #[test]
    fn full_program() {
        let src = r#"
            let balls = [];
            function spawn(x, y) {
                push(balls, circle(radius: 4, color: random_color()));
            }
            on update(dt) {
                for (b in balls) {
                    if (b.radius > 10) continue;
                    b.radius = b.radius + dt;
                }
            }
            on click(x, y) { spawn(x, y); }
            set width = 640;
        "#;
        assert_eq!(parse(src).statements.len(), 5);
    }
}
