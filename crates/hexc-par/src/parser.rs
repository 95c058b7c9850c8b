//! Recursive descent with precedence climbing for binary expressions.

use crate::ast::{BinOp, Expr, ExprKind, Param, Scope, Statement, StatementKind, Type};
use hexc_lex::{Lexer, TokenKind};
use hexc_util::{Diagnostic, Handler, Span, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// Precedence and associativity for each binary operator. Any token not
/// listed here has precedence 0 and terminates a climb.
fn binding_power(kind: &TokenKind) -> Option<(u8, Assoc)> {
    match kind {
        TokenKind::Eq => Some((10, Assoc::Right)),
        TokenKind::CmpLt => Some((17, Assoc::Left)),
        TokenKind::Plus | TokenKind::Minus => Some((20, Assoc::Left)),
        TokenKind::Mult | TokenKind::Slash => Some((30, Assoc::Left)),
        _ => None,
    }
}

fn to_binop(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Eq => Some(BinOp::Assign),
        TokenKind::CmpLt => Some(BinOp::Lt),
        TokenKind::Plus => Some(BinOp::Add),
        TokenKind::Minus => Some(BinOp::Sub),
        TokenKind::Mult => Some(BinOp::Mul),
        TokenKind::Slash => Some(BinOp::Div),
        _ => None,
    }
}

/// Tokens to AST. Owns a [`Lexer`] by value, and shares the surrounding
/// [`Handler`] with it so lex errors and parse errors interleave in source
/// order.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    handler: &'a Handler,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self { lexer: Lexer::new(source, handler), handler }
    }

    fn error(&self, message: impl Into<String>, span: Span) {
        Diagnostic::error(message).span(span).emit(self.handler);
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.lexer.peek().kind
    }

    fn peek_span(&self) -> Span {
        self.lexer.peek().span
    }

    fn expect(&mut self, kind: TokenKind) -> Option<()> {
        if *self.peek_kind() == kind {
            self.lexer.advance();
            Some(())
        } else {
            let span = self.peek_span();
            self.error(
                format!("expected {}, found {}", kind.describe(), self.peek_kind().describe()),
                span,
            );
            None
        }
    }

    fn expect_id(&mut self) -> Option<Symbol> {
        if let TokenKind::Id(name) = self.peek_kind().clone() {
            self.lexer.advance();
            Some(name)
        } else {
            let span = self.peek_span();
            self.error(format!("expected identifier, found {}", self.peek_kind().describe()), span);
            None
        }
    }

    fn expect_type(&mut self) -> Option<Type> {
        let span = self.peek_span();
        let name = self.expect_id()?;
        match Type::from_name(name.as_str()) {
            Some(ty) => Some(ty),
            None => {
                self.error(format!("unknown type '{name}'"), span);
                None
            }
        }
    }

    /// Returns the next top-level statement, or `None` at end of input.
    /// Semicolons between top-level statements are skipped; the only
    /// permitted top-level construct begins with `fn`.
    pub fn parse(&mut self) -> Option<Statement> {
        loop {
            if self.lexer.peek().is_end() {
                return None;
            }
            if *self.peek_kind() == TokenKind::Semicolon {
                self.lexer.advance();
                continue;
            }
            if *self.peek_kind() == TokenKind::Fn {
                return self.parse_fn_stmt();
            }
            let span = self.peek_span();
            self.error(
                format!("expected 'fn', found {}", self.peek_kind().describe()),
                span,
            );
            return None;
        }
    }

    fn parse_fn_stmt(&mut self) -> Option<Statement> {
        let span = self.peek_span();
        self.lexer.advance(); // 'fn'
        let name = self.expect_id()?;
        self.expect(TokenKind::POpen)?;
        let params = self.parse_params()?;
        self.expect(TokenKind::PClose)?;
        self.expect(TokenKind::RArrow)?;
        let ret = self.expect_type()?;
        let decl = Statement { kind: StatementKind::FnDecl { name, params, ret }, span };

        match self.peek_kind() {
            TokenKind::Semicolon => {
                self.lexer.advance();
                Some(decl)
            }
            TokenKind::BrOpen => {
                let body = self.parse_scope()?;
                Some(Statement { kind: StatementKind::FnDef { decl: Box::new(decl), body }, span })
            }
            _ => {
                let cur_span = self.peek_span();
                self.error(
                    format!("expected ';' or '{{', found {}", self.peek_kind().describe()),
                    cur_span,
                );
                None
            }
        }
    }

    fn parse_params(&mut self) -> Option<Vec<Param>> {
        let mut params = Vec::new();
        if *self.peek_kind() == TokenKind::PClose {
            return Some(params);
        }
        loop {
            let name = self.expect_id()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.expect_type()?;
            params.push(Param { name, ty });
            if *self.peek_kind() == TokenKind::Comma {
                self.lexer.advance();
                continue;
            }
            break;
        }
        Some(params)
    }

    fn parse_scope(&mut self) -> Option<Scope> {
        self.expect(TokenKind::BrOpen)?;
        let mut body = Vec::new();

        if *self.peek_kind() == TokenKind::BrClose {
            self.lexer.advance();
            return Some(Scope { body });
        }

        loop {
            body.push(self.parse_stmt()?);
            if *self.peek_kind() == TokenKind::BrClose {
                self.lexer.advance();
                return Some(Scope { body });
            }
            self.expect(TokenKind::Semicolon)?;
        }
    }

    fn parse_stmt(&mut self) -> Option<Statement> {
        let span = self.peek_span();
        if *self.peek_kind() == TokenKind::Let {
            self.lexer.advance();
            let name = self.expect_id()?;
            self.expect(TokenKind::Eq)?;
            let rhs = self.parse_expr()?;
            return Some(Statement { kind: StatementKind::VarDecl { name, rhs }, span });
        }
        let expr = self.parse_expr()?;
        Some(Statement { kind: StatementKind::Expr(expr), span })
    }

    fn parse_expr(&mut self) -> Option<Expr> {
        let lhs = self.parse_primary()?;
        self.parse_expr_bp(lhs, 0)
    }

    /// Precedence climbing: given a parsed primary `lhs` and a minimum
    /// precedence `min_bp`, keep absorbing operators at or above `min_bp`,
    /// recursing into the right-hand side whenever the next operator binds
    /// tighter (or equally, for a right-associative one).
    fn parse_expr_bp(&mut self, mut lhs: Expr, min_bp: u8) -> Option<Expr> {
        loop {
            let (bp, assoc) = match binding_power(self.peek_kind()) {
                Some(info) => info,
                None => return Some(lhs),
            };
            if bp < min_bp {
                return Some(lhs);
            }
            let op = to_binop(self.peek_kind()).expect("binding_power implies to_binop");
            self.lexer.advance();

            let mut rhs = self.parse_primary()?;
            if let Some((next_bp, _)) = binding_power(self.peek_kind()) {
                if next_bp > bp || (next_bp == bp && assoc == Assoc::Right) {
                    rhs = self.parse_expr_bp(rhs, bp)?;
                }
            }

            let span = lhs.span;
            lhs = Expr { kind: ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }, span };
        }
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let span = self.peek_span();
        match self.peek_kind().clone() {
            TokenKind::LInt32(v) => {
                self.lexer.advance();
                Some(Expr { kind: ExprKind::LitInt32(v), span })
            }
            TokenKind::LDouble(v) => {
                self.lexer.advance();
                Some(Expr { kind: ExprKind::LitDouble(v), span })
            }
            TokenKind::LStr(s) => {
                self.lexer.advance();
                Some(Expr { kind: ExprKind::LitStr(s), span })
            }
            TokenKind::POpen => {
                self.lexer.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::PClose)?;
                Some(inner)
            }
            TokenKind::BrOpen => {
                let scope = self.parse_scope()?;
                Some(Expr { kind: ExprKind::Scope(scope), span })
            }
            TokenKind::If => self.parse_if(span),
            TokenKind::Id(name) => {
                self.lexer.advance();
                if *self.peek_kind() == TokenKind::POpen {
                    self.lexer.advance();
                    let args = self.parse_args()?;
                    self.expect(TokenKind::PClose)?;
                    Some(Expr { kind: ExprKind::Call { callee: name, args }, span })
                } else {
                    Some(Expr { kind: ExprKind::Id(name), span })
                }
            }
            other => {
                self.error(format!("unexpected token {}", other.describe()), span);
                None
            }
        }
    }

    fn parse_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        if *self.peek_kind() == TokenKind::PClose {
            return Some(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if *self.peek_kind() == TokenKind::Comma {
                self.lexer.advance();
                continue;
            }
            break;
        }
        Some(args)
    }

    /// `if` without an `else` is a parse error: the type rule needs both
    /// arms to produce the PHI's type.
    fn parse_if(&mut self, span: Span) -> Option<Expr> {
        self.lexer.advance(); // 'if'
        let cond = self.parse_expr()?;
        let then_scope = self.parse_scope()?;
        self.expect(TokenKind::Else)?;
        let else_scope = self.parse_scope()?;
        Some(Expr {
            kind: ExprKind::If { cond: Box::new(cond), then_scope, else_scope },
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, StatementKind};

    fn parse_one(source: &str) -> (Option<Statement>, Handler) {
        let handler = Handler::new();
        let mut parser = Parser::new(source, &handler);
        let stmt = parser.parse();
        (stmt, handler)
    }

    fn unwrap_fn_def_value(stmt: &Statement) -> &Expr {
        match &stmt.kind {
            StatementKind::FnDef { body, .. } => match &body.body.last().unwrap().kind {
                StatementKind::Expr(e) => e,
                _ => panic!("expected trailing expression statement"),
            },
            _ => panic!("expected FnDef"),
        }
    }

    #[test]
    fn left_associative_addition_and_multiplication_precedence() {
        let (stmt, handler) = parse_one("fn f() -> i32 { 1 + 2 * 3 };");
        assert!(!handler.has_errors());
        let value = unwrap_fn_def_value(&stmt.unwrap());
        match &value.kind {
            ExprKind::Binary { op: BinOp::Add, lhs, rhs } => {
                assert!(matches!(lhs.kind, ExprKind::LitInt32(1)));
                assert!(matches!(rhs.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("expected top-level Add, got {other:?}"),
        }
    }

    #[test]
    fn right_associative_assign() {
        let (stmt, handler) = parse_one("fn f() -> i32 { 1 = 2 = 3 };");
        assert!(!handler.has_errors());
        let value = unwrap_fn_def_value(&stmt.unwrap());
        match &value.kind {
            ExprKind::Binary { op: BinOp::Assign, lhs, rhs } => {
                assert!(matches!(lhs.kind, ExprKind::LitInt32(1)));
                assert!(matches!(rhs.kind, ExprKind::Binary { op: BinOp::Assign, .. }));
            }
            other => panic!("expected top-level Assign, got {other:?}"),
        }
    }

    #[test]
    fn left_associative_subtraction_chain() {
        let (stmt, handler) = parse_one("fn f() -> i32 { 1 - 2 - 3 };");
        assert!(!handler.has_errors());
        let value = unwrap_fn_def_value(&stmt.unwrap());
        match &value.kind {
            ExprKind::Binary { op: BinOp::Sub, lhs, rhs } => {
                assert!(matches!(lhs.kind, ExprKind::Binary { op: BinOp::Sub, .. }));
                assert!(matches!(rhs.kind, ExprKind::LitInt32(3)));
            }
            other => panic!("expected top-level Sub, got {other:?}"),
        }
    }

    #[test]
    fn fn_decl_without_body_is_a_declaration() {
        let (stmt, handler) = parse_one("fn ext(x: i32) -> double;");
        assert!(!handler.has_errors());
        assert!(matches!(stmt.unwrap().kind, StatementKind::FnDecl { .. }));
    }

    #[test]
    fn if_without_else_is_an_error() {
        let (stmt, handler) = parse_one("fn f() -> i32 { if true { 1 } };");
        assert!(stmt.is_none());
        assert!(handler.has_errors());
    }

    #[test]
    fn missing_arrow_is_an_error() {
        let (stmt, handler) = parse_one("fn f(x: i32) { x };");
        assert!(stmt.is_none());
        assert!(handler.has_errors());
    }

    #[test]
    fn scope_value_is_last_statement() {
        let (stmt, handler) = parse_one("fn f() -> i32 { let x = 1; x + 1 };");
        assert!(!handler.has_errors());
        let stmt = stmt.unwrap();
        let body = match &stmt.kind {
            StatementKind::FnDef { body, .. } => body,
            _ => panic!("expected FnDef"),
        };
        assert_eq!(body.body.len(), 2);
        assert!(matches!(body.body[0].kind, StatementKind::VarDecl { .. }));
    }

    #[test]
    fn call_with_arguments() {
        let (stmt, handler) = parse_one("fn f() -> i32 { add(1, 2) };");
        assert!(!handler.has_errors());
        let value = unwrap_fn_def_value(&stmt.unwrap());
        match &value.kind {
            ExprKind::Call { callee, args } => {
                assert_eq!(callee.as_str(), "add");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }
}
