//! Recursive-descent parser for EmberScript.
//!
//! The parser consumes the pre-lexed token vector and builds arena
//! `Copy` nodes. One call to [`Parser::parse_script`] parses exactly one
//! `[trigger,name]` script; a batch loop keeps calling it while
//! [`Parser::remaining`] is non-zero, so several independent scripts can
//! share one buffer.
//!
//! A local grammar violation never aborts the batch: the parser records a
//! [`ParseError`] and resynchronizes — skipping until just after a `;`,
//! or stopping before `}`, `[`, or end of input. Stopping before `[`
//! keeps a broken script from swallowing the next script's header.

use bumpalo::Bump;

use crate::ast::error::{ParseError, ParseErrorKind};
use crate::ast::expr::{
    BinaryExpr, BinaryOp, CallExpr, ConcatExpr, Expr, HookExpr, IndexExpr, LiteralExpr,
    LiteralKind, VarExpr,
};
use crate::ast::stmt::{
    AssignStmt, Block, BreakStmt, ContinueStmt, ExprStmt, IfStmt, ReturnStmt, Stmt, SwitchCase,
    SwitchStmt, VarDeclStmt, VarTarget, WhileStmt,
};
use crate::ast::{Ident, Parameter, Script, TypeRef};
use crate::lexer::{Token, TokenKind};
use emberscript_core::{PrimitiveType, Span};

/// The EmberScript parser.
pub struct Parser<'ast> {
    /// Pre-lexed tokens (error tokens already filtered out).
    tokens: Vec<Token<'ast>>,
    /// Index of the next unconsumed token.
    pos: usize,
    /// Arena for AST allocation.
    arena: &'ast Bump,
    /// Accumulated syntax errors.
    errors: Vec<ParseError>,
}

impl<'ast> Parser<'ast> {
    /// Create a parser over a token vector.
    pub fn new(tokens: Vec<Token<'ast>>, arena: &'ast Bump) -> Self {
        Self {
            tokens,
            pos: 0,
            arena,
            errors: Vec::new(),
        }
    }

    /// How many tokens are left to consume.
    ///
    /// The batch loop parses scripts until this reaches zero.
    pub fn remaining(&self) -> usize {
        self.tokens.len().saturating_sub(self.pos)
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    // =========================================
    // Token access
    // =========================================

    fn peek(&self) -> Option<&Token<'ast>> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().map_or(TokenKind::Eof, |t| t.kind)
    }

    fn peek_kind_nth(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    /// The span of the current token, or a point at the last token's end.
    fn current_span(&self) -> Span {
        match self.peek() {
            Some(token) => token.span,
            None => self
                .tokens
                .last()
                .map_or(Span::point(1, 1), |t| Span::point(t.span.line, t.span.col + t.span.len)),
        }
    }

    fn advance(&mut self) -> Option<Token<'ast>> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// Consume the current token if it matches.
    fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) { self.advance() } else { None }
    }

    /// Consume the current token if it matches, otherwise record an
    /// error and return `None`.
    fn expect(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if let Some(token) = self.eat(kind) {
            return Some(token);
        }
        let found = self.peek_kind();
        let error_kind = if found == TokenKind::Eof {
            ParseErrorKind::UnexpectedEof
        } else {
            ParseErrorKind::ExpectedToken
        };
        self.error(
            error_kind,
            self.current_span(),
            format!(
                "expected {}, found {}",
                kind.description(),
                found.description()
            ),
        );
        None
    }

    fn error(&mut self, kind: ParseErrorKind, span: Span, message: impl Into<String>) {
        self.errors.push(ParseError::new(kind, span, message));
    }

    /// Skip tokens until just after a `;`, or until one of `}`, `[`, or
    /// end of input.
    fn synchronize(&mut self) {
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RightBrace | TokenKind::LeftBracket => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip forward to the next `[` header (or end of input).
    fn skip_to_next_script(&mut self) {
        while self.remaining() > 0 && !self.check(TokenKind::LeftBracket) {
            self.advance();
        }
    }

    // =========================================
    // Scripts
    // =========================================

    /// Parse one script.
    ///
    /// Returns `None` when the script was too broken to build a node; the
    /// parser has then already resynchronized past it.
    pub fn parse_script(&mut self) -> Option<&'ast Script<'ast>> {
        let Some(open) = self.expect(TokenKind::LeftBracket) else {
            // Skip to the next header so the following call starts clean.
            self.skip_to_next_script();
            return None;
        };

        let header = (|| {
            let trigger = self.expect_ident(TokenKind::Identifier)?;
            self.expect(TokenKind::Comma)?;
            let name = self.expect_ident(TokenKind::Identifier)?;
            self.expect(TokenKind::RightBracket)?;
            Some((trigger, name))
        })();
        let Some((trigger, name)) = header else {
            self.skip_to_next_script();
            return None;
        };

        let (params, returns) = self.parse_signature();
        let body = self.parse_body();

        let span = open.span.merge(body.span);
        Some(self.arena.alloc(Script {
            trigger,
            name,
            params,
            returns,
            body,
            span,
        }))
    }

    fn expect_ident(&mut self, kind: TokenKind) -> Option<Ident<'ast>> {
        let token = self.expect(kind)?;
        Some(Ident {
            name: token.lexeme,
            span: token.span,
        })
    }

    /// Parse the optional parameter and return-type groups after the
    /// header.
    ///
    /// A group of `type $name` pairs is the parameter list, optionally
    /// followed by a bare-type group of returns. A single group of bare
    /// types is a return list with no parameters.
    fn parse_signature(&mut self) -> (&'ast [Parameter<'ast>], &'ast [TypeRef]) {
        let mut params: Vec<Parameter<'ast>> = Vec::new();
        let mut returns: Vec<TypeRef> = Vec::new();

        if self.eat(TokenKind::LeftParen).is_some() {
            let is_params = self.check(TokenKind::TypeName)
                && self.peek_kind_nth(1) == TokenKind::LocalVar;
            if is_params {
                loop {
                    let Some(param) = self.parse_parameter() else {
                        break;
                    };
                    params.push(param);
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
                self.expect(TokenKind::RightParen);
                if self.eat(TokenKind::LeftParen).is_some() {
                    self.parse_type_list(&mut returns);
                    self.expect(TokenKind::RightParen);
                }
            } else {
                self.parse_type_list(&mut returns);
                self.expect(TokenKind::RightParen);
            }
        }

        (
            self.arena.alloc_slice_copy(&params),
            self.arena.alloc_slice_copy(&returns),
        )
    }

    fn parse_parameter(&mut self) -> Option<Parameter<'ast>> {
        let ty_token = self.expect(TokenKind::TypeName)?;
        let ty = PrimitiveType::from_keyword(ty_token.lexeme)?;
        let name = self.expect_ident(TokenKind::LocalVar)?;
        Some(Parameter {
            ty,
            name,
            span: ty_token.span.merge(name.span),
        })
    }

    fn parse_type_list(&mut self, out: &mut Vec<TypeRef>) {
        if self.check(TokenKind::RightParen) {
            return;
        }
        loop {
            let Some(token) = self.expect(TokenKind::TypeName) else {
                return;
            };
            if let Some(ty) = PrimitiveType::from_keyword(token.lexeme) {
                out.push(TypeRef {
                    ty,
                    span: token.span,
                });
            }
            if self.eat(TokenKind::Comma).is_none() {
                return;
            }
        }
    }

    /// Parse a script body: a braced block, or a run of statements ending
    /// at the next `[` header or end of input.
    fn parse_body(&mut self) -> Block<'ast> {
        if self.check(TokenKind::LeftBrace) {
            return self.parse_block();
        }

        let start = self.current_span();
        let mut stmts: Vec<Stmt<'ast>> = Vec::new();
        while self.remaining() > 0 && !self.check(TokenKind::LeftBracket) {
            let before = self.pos;
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => {
                    self.synchronize();
                    if self.pos == before {
                        // No progress: drop one token rather than spin.
                        self.advance();
                    }
                }
            }
        }

        let span = stmts
            .last()
            .map_or(start, |last| start.merge(last.span()));
        Block {
            stmts: self.arena.alloc_slice_copy(&stmts),
            span,
        }
    }

    // =========================================
    // Statements
    // =========================================

    /// Parse a braced block with statement-level error recovery.
    pub fn parse_block(&mut self) -> Block<'ast> {
        let start = self.current_span();
        self.expect(TokenKind::LeftBrace);

        let mut stmts: Vec<Stmt<'ast>> = Vec::new();
        while self.remaining() > 0 && !self.check(TokenKind::RightBrace) {
            let before = self.pos;
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => {
                    self.synchronize();
                    if self.pos == before && !self.check(TokenKind::RightBrace) {
                        self.advance();
                    }
                }
            }
        }

        let end = self.current_span();
        self.expect(TokenKind::RightBrace);
        Block {
            stmts: self.arena.alloc_slice_copy(&stmts),
            span: start.merge(end),
        }
    }

    /// Parse one statement.
    pub fn parse_statement(&mut self) -> Option<Stmt<'ast>> {
        match self.peek_kind() {
            TokenKind::Define => self.parse_var_decl(),
            TokenKind::LocalVar if self.peek_kind_nth(1) == TokenKind::Equal => {
                self.parse_assignment(true)
            }
            TokenKind::GlobalVar if self.peek_kind_nth(1) == TokenKind::Equal => {
                self.parse_assignment(false)
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                let keyword = self.advance()?;
                let end = self.current_span();
                self.expect(TokenKind::Semicolon)?;
                Some(Stmt::Break(BreakStmt {
                    keyword: keyword.span,
                    span: keyword.span.merge(end),
                }))
            }
            TokenKind::Continue => {
                let keyword = self.advance()?;
                let end = self.current_span();
                self.expect(TokenKind::Semicolon)?;
                Some(Stmt::Continue(ContinueStmt {
                    keyword: keyword.span,
                    span: keyword.span.merge(end),
                }))
            }
            TokenKind::LeftBrace => Some(Stmt::Block(self.parse_block())),
            TokenKind::Eof => {
                self.error(
                    ParseErrorKind::UnexpectedEof,
                    self.current_span(),
                    "expected statement",
                );
                None
            }
            _ => {
                let expr = self.parse_expr()?;
                let end = self.current_span();
                self.expect(TokenKind::Semicolon)?;
                Some(Stmt::Expr(ExprStmt {
                    expr,
                    span: expr.span().merge(end),
                }))
            }
        }
    }

    fn parse_var_decl(&mut self) -> Option<Stmt<'ast>> {
        let keyword = self.advance()?;
        let ty = keyword
            .lexeme
            .strip_prefix("def_")
            .and_then(PrimitiveType::from_keyword)?;
        let name = self.expect_ident(TokenKind::LocalVar)?;

        let init = if self.eat(TokenKind::Equal).is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let end = self.current_span();
        self.expect(TokenKind::Semicolon)?;

        Some(Stmt::VarDecl(self.arena.alloc(VarDeclStmt {
            ty,
            name,
            init,
            span: keyword.span.merge(end),
        })))
    }

    fn parse_assignment(&mut self, local: bool) -> Option<Stmt<'ast>> {
        let target_token = self.advance()?;
        let ident = Ident {
            name: target_token.lexeme,
            span: target_token.span,
        };
        let target = if local {
            VarTarget::Local(ident)
        } else {
            VarTarget::Global(ident)
        };

        self.expect(TokenKind::Equal)?;
        let value = self.parse_expr()?;
        let end = self.current_span();
        self.expect(TokenKind::Semicolon)?;

        Some(Stmt::Assign(self.arena.alloc(AssignStmt {
            target,
            value,
            span: target_token.span.merge(end),
        })))
    }

    fn parse_if(&mut self) -> Option<Stmt<'ast>> {
        let keyword = self.advance()?;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RightParen)?;

        let then_stmt: &'ast Stmt<'ast> = self.arena.alloc(self.parse_statement()?);
        let else_stmt = if self.eat(TokenKind::Else).is_some() {
            Some(&*self.arena.alloc(self.parse_statement()?))
        } else {
            None
        };

        let span = keyword
            .span
            .merge(else_stmt.map_or(then_stmt.span(), |s| s.span()));
        Some(Stmt::If(self.arena.alloc(IfStmt {
            condition,
            then_stmt,
            else_stmt,
            span,
        })))
    }

    fn parse_while(&mut self) -> Option<Stmt<'ast>> {
        let keyword = self.advance()?;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RightParen)?;

        let body: &'ast Stmt<'ast> = self.arena.alloc(self.parse_statement()?);
        Some(Stmt::While(self.arena.alloc(WhileStmt {
            condition,
            body,
            span: keyword.span.merge(body.span()),
        })))
    }

    fn parse_switch(&mut self) -> Option<Stmt<'ast>> {
        let keyword = self.advance()?;
        let ty = keyword
            .lexeme
            .strip_prefix("switch_")
            .and_then(PrimitiveType::from_keyword)?;

        self.expect(TokenKind::LeftParen)?;
        let scrutinee = self.parse_expr()?;
        self.expect(TokenKind::RightParen)?;
        self.expect(TokenKind::LeftBrace)?;

        let mut cases: Vec<SwitchCase<'ast>> = Vec::new();
        while self.check(TokenKind::Case) {
            if let Some(case) = self.parse_switch_case() {
                cases.push(case);
            } else {
                self.synchronize();
            }
        }
        let end = self.current_span();
        self.expect(TokenKind::RightBrace)?;

        Some(Stmt::Switch(self.arena.alloc(SwitchStmt {
            ty,
            scrutinee,
            cases: self.arena.alloc_slice_copy(&cases),
            span: keyword.span.merge(end),
        })))
    }

    fn parse_switch_case(&mut self) -> Option<SwitchCase<'ast>> {
        let keyword = self.advance()?;

        let mut keys: Vec<Expr<'ast>> = Vec::new();
        if self.eat(TokenKind::Default).is_none() {
            loop {
                keys.push(self.parse_expr()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::Colon)?;

        let body_start = self.current_span();
        let mut stmts: Vec<Stmt<'ast>> = Vec::new();
        while self.remaining() > 0
            && !self.check(TokenKind::Case)
            && !self.check(TokenKind::RightBrace)
        {
            let before = self.pos;
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => {
                    self.synchronize();
                    if self.pos == before && !self.check(TokenKind::RightBrace) {
                        self.advance();
                    }
                }
            }
        }

        let body_span = stmts
            .last()
            .map_or(body_start, |last| body_start.merge(last.span()));
        let body = Block {
            stmts: self.arena.alloc_slice_copy(&stmts),
            span: body_span,
        };
        Some(SwitchCase {
            keys: self.arena.alloc_slice_copy(&keys),
            body,
            span: keyword.span.merge(body_span),
        })
    }

    fn parse_return(&mut self) -> Option<Stmt<'ast>> {
        let keyword = self.advance()?;

        let mut exprs: Vec<Expr<'ast>> = Vec::new();
        if !self.check(TokenKind::Semicolon) {
            loop {
                exprs.push(self.parse_expr()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let end = self.current_span();
        self.expect(TokenKind::Semicolon)?;

        Some(Stmt::Return(self.arena.alloc(ReturnStmt {
            exprs: self.arena.alloc_slice_copy(&exprs),
            span: keyword.span.merge(end),
        })))
    }

    // =========================================
    // Expressions
    // =========================================

    /// Parse an expression (lowest precedence tier: logical or).
    pub fn parse_expr(&mut self) -> Option<Expr<'ast>> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Option<Expr<'ast>> {
        let mut left = self.parse_and()?;
        while self.eat(TokenKind::Pipe).is_some() {
            let right = self.parse_and()?;
            left = self.make_binary(left, BinaryOp::Or, right);
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<Expr<'ast>> {
        let mut left = self.parse_comparison()?;
        while self.eat(TokenKind::Amp).is_some() {
            let right = self.parse_comparison()?;
            left = self.make_binary(left, BinaryOp::And, right);
        }
        Some(left)
    }

    /// Comparisons do not chain: `a < b < c` is a syntax error upstream
    /// and stays one here.
    fn parse_comparison(&mut self) -> Option<Expr<'ast>> {
        let left = self.parse_additive()?;
        let op = match self.peek_kind() {
            TokenKind::Equal => BinaryOp::Equal,
            TokenKind::Bang => BinaryOp::NotEqual,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::LessEqual => BinaryOp::LessEqual,
            TokenKind::Greater => BinaryOp::Greater,
            TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
            _ => return Some(left),
        };
        self.advance();
        let right = self.parse_additive()?;
        Some(self.make_binary(left, op, right))
    }

    fn parse_additive(&mut self) -> Option<Expr<'ast>> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Some(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.make_binary(left, op, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Option<Expr<'ast>> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => return Some(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.make_binary(left, op, right);
        }
    }

    /// A leading `-` is only valid directly on a numeric literal.
    fn parse_unary(&mut self) -> Option<Expr<'ast>> {
        if self.check(TokenKind::Minus) {
            let next = self.peek_kind_nth(1);
            if next == TokenKind::IntLiteral || next == TokenKind::LongLiteral {
                let minus = self.advance()?;
                let literal = self.advance()?;
                let span = minus.span.merge(literal.span);
                let kind = if literal.kind == TokenKind::IntLiteral {
                    LiteralKind::Int(self.parse_int(&literal, true)?)
                } else {
                    LiteralKind::Long(self.parse_long(&literal, true)?)
                };
                return Some(Expr::Literal(LiteralExpr { kind, span }));
            }
            self.error(
                ParseErrorKind::ExpectedExpression,
                self.current_span(),
                "'-' must be followed by a numeric literal",
            );
            return None;
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<Expr<'ast>> {
        match self.peek_kind() {
            TokenKind::IntLiteral => {
                let token = self.advance()?;
                let value = self.parse_int(&token, false)?;
                Some(Expr::Literal(LiteralExpr {
                    kind: LiteralKind::Int(value),
                    span: token.span,
                }))
            }
            TokenKind::LongLiteral => {
                let token = self.advance()?;
                let value = self.parse_long(&token, false)?;
                Some(Expr::Literal(LiteralExpr {
                    kind: LiteralKind::Long(value),
                    span: token.span,
                }))
            }
            TokenKind::CoordLiteral => {
                let token = self.advance()?;
                let value = self.parse_coord(&token)?;
                Some(Expr::Literal(LiteralExpr {
                    kind: LiteralKind::Coord(value),
                    span: token.span,
                }))
            }
            TokenKind::StringLiteral => {
                let token = self.advance()?;
                Some(Expr::Literal(LiteralExpr {
                    kind: LiteralKind::String(token.lexeme),
                    span: token.span,
                }))
            }
            TokenKind::True | TokenKind::False => {
                let token = self.advance()?;
                Some(Expr::Literal(LiteralExpr {
                    kind: LiteralKind::Bool(token.kind == TokenKind::True),
                    span: token.span,
                }))
            }
            TokenKind::Null => {
                let token = self.advance()?;
                Some(Expr::Literal(LiteralExpr {
                    kind: LiteralKind::Null,
                    span: token.span,
                }))
            }
            TokenKind::LocalVar => {
                let token = self.advance()?;
                let name = Ident {
                    name: token.lexeme,
                    span: token.span,
                };
                if self.eat(TokenKind::LeftParen).is_some() {
                    let index = self.parse_expr()?;
                    let end = self.current_span();
                    self.expect(TokenKind::RightParen)?;
                    return Some(Expr::Index(self.arena.alloc(IndexExpr {
                        name,
                        index: self.arena.alloc(index),
                        span: token.span.merge(end),
                    })));
                }
                Some(Expr::LocalVar(VarExpr {
                    name,
                    span: token.span,
                }))
            }
            TokenKind::GlobalVar => {
                let token = self.advance()?;
                Some(Expr::GlobalVar(VarExpr {
                    name: Ident {
                        name: token.lexeme,
                        span: token.span,
                    },
                    span: token.span,
                }))
            }
            TokenKind::ConstantRef => {
                let token = self.advance()?;
                Some(Expr::Constant(VarExpr {
                    name: Ident {
                        name: token.lexeme,
                        span: token.span,
                    },
                    span: token.span,
                }))
            }
            TokenKind::Tilde => {
                let tilde = self.advance()?;
                let name = self.expect_ident(TokenKind::Identifier)?;
                let (args, end) = self.parse_optional_args(name.span)?;
                Some(Expr::Gosub(self.arena.alloc(CallExpr {
                    name,
                    args,
                    span: tilde.span.merge(end),
                })))
            }
            TokenKind::Hook => self.parse_hook(),
            TokenKind::Identifier => {
                let token = self.advance()?;
                let name = Ident {
                    name: token.lexeme,
                    span: token.span,
                };
                if self.check(TokenKind::LeftParen) {
                    let (args, end) = self.parse_optional_args(name.span)?;
                    return Some(Expr::Command(self.arena.alloc(CallExpr {
                        name,
                        args,
                        span: token.span.merge(end),
                    })));
                }
                Some(Expr::Dynamic(name))
            }
            TokenKind::ConcatBegin => self.parse_concat(),
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RightParen)?;
                Some(expr)
            }
            found => {
                self.error(
                    ParseErrorKind::ExpectedExpression,
                    self.current_span(),
                    format!("found {}", found.description()),
                );
                None
            }
        }
    }

    /// Parse an optional parenthesized argument list; returns the
    /// arguments and the span where the call ends.
    fn parse_optional_args(&mut self, name_span: Span) -> Option<(&'ast [Expr<'ast>], Span)> {
        if self.eat(TokenKind::LeftParen).is_none() {
            return Some((self.arena.alloc_slice_copy(&[]), name_span));
        }
        let mut args: Vec<Expr<'ast>> = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let end = self.current_span();
        self.expect(TokenKind::RightParen)?;
        Some((self.arena.alloc_slice_copy(&args), end))
    }

    fn parse_hook(&mut self) -> Option<Expr<'ast>> {
        let token = self.advance()?;
        let name = Ident {
            name: token.lexeme,
            span: token.span,
        };
        let (args, mut end) = self.parse_optional_args(token.span)?;

        let mut transmits: Vec<Ident<'ast>> = Vec::new();
        if self.eat(TokenKind::LeftBrace).is_some() {
            if !self.check(TokenKind::RightBrace) {
                loop {
                    transmits.push(self.expect_ident(TokenKind::Identifier)?);
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
            }
            end = self.current_span();
            self.expect(TokenKind::RightBrace)?;
        }

        Some(Expr::Hook(self.arena.alloc(HookExpr {
            name,
            args,
            transmits: self.arena.alloc_slice_copy(&transmits),
            span: token.span.merge(end),
        })))
    }

    /// Parse a concatenation token run from an interpolated string.
    fn parse_concat(&mut self) -> Option<Expr<'ast>> {
        let begin = self.advance()?;
        let mut parts: Vec<Expr<'ast>> = Vec::new();

        loop {
            match self.peek_kind() {
                TokenKind::ConcatEnd => break,
                TokenKind::StringPart => {
                    let token = self.advance()?;
                    parts.push(Expr::Literal(LiteralExpr {
                        kind: LiteralKind::String(token.lexeme),
                        span: token.span,
                    }));
                }
                TokenKind::Eof => {
                    self.error(
                        ParseErrorKind::UnexpectedEof,
                        self.current_span(),
                        "unclosed interpolated string",
                    );
                    return None;
                }
                _ => parts.push(self.parse_expr()?),
            }
        }

        let end = self.current_span();
        self.expect(TokenKind::ConcatEnd)?;
        Some(Expr::Concat(self.arena.alloc(ConcatExpr {
            parts: self.arena.alloc_slice_copy(&parts),
            span: begin.span.merge(end),
        })))
    }

    fn make_binary(&self, left: Expr<'ast>, op: BinaryOp, right: Expr<'ast>) -> Expr<'ast> {
        let span = left.span().merge(right.span());
        Expr::Binary(self.arena.alloc(BinaryExpr {
            left: self.arena.alloc(left),
            op,
            right: self.arena.alloc(right),
            span,
        }))
    }

    // =========================================
    // Literal value parsing
    // =========================================

    fn parse_int(&mut self, token: &Token<'ast>, negative: bool) -> Option<i32> {
        let text = if negative {
            format!("-{}", token.lexeme)
        } else {
            token.lexeme.to_owned()
        };
        match text.parse::<i32>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.error(
                    ParseErrorKind::InvalidSyntax,
                    token.span,
                    format!("integer '{}' is out of range", text),
                );
                None
            }
        }
    }

    fn parse_long(&mut self, token: &Token<'ast>, negative: bool) -> Option<i64> {
        let digits = token.lexeme.trim_end_matches(['L', 'l']);
        let text = if negative {
            format!("-{}", digits)
        } else {
            digits.to_owned()
        };
        match text.parse::<i64>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.error(
                    ParseErrorKind::InvalidSyntax,
                    token.span,
                    format!("long '{}' is out of range", text),
                );
                None
            }
        }
    }

    /// Pack a `level_x_z_localx_localz` coordinate into an i32:
    /// level in the top 4 bits, absolute x (x*64+localx) in the middle
    /// 14, absolute z (z*64+localz) in the low 14.
    fn parse_coord(&mut self, token: &Token<'ast>) -> Option<i32> {
        let mut components = [0i64; 5];
        for (slot, part) in components.iter_mut().zip(token.lexeme.split('_')) {
            match part.parse::<i64>() {
                Ok(value) => *slot = value,
                Err(_) => {
                    self.error(
                        ParseErrorKind::InvalidSyntax,
                        token.span,
                        format!("'{}' is not a valid coordinate", token.lexeme),
                    );
                    return None;
                }
            }
        }
        let [level, x, z, local_x, local_z] = components;
        let abs_x = x * 64 + local_x;
        let abs_z = z * 64 + local_z;
        if level > 3 || abs_x >= (1 << 14) || abs_z >= (1 << 14) {
            self.error(
                ParseErrorKind::InvalidSyntax,
                token.span,
                format!("coordinate '{}' is out of range", token.lexeme),
            );
            return None;
        }
        Some(((level << 28) | (abs_x << 14) | abs_z) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse_one<'ast>(source: &str, arena: &'ast Bump) -> &'ast Script<'ast> {
        let mut lexer = Lexer::new(source, arena);
        let tokens = lexer.tokenize();
        assert!(!lexer.has_errors(), "lex errors in {:?}", source);
        let mut parser = Parser::new(tokens, arena);
        let script = parser.parse_script().expect("expected a script");
        assert!(
            !parser.has_errors(),
            "parse errors: {:?}",
            parser.take_errors()
        );
        script
    }

    fn parse_with_errors<'ast>(
        source: &str,
        arena: &'ast Bump,
    ) -> (Vec<&'ast Script<'ast>>, Vec<ParseError>) {
        let mut lexer = Lexer::new(source, arena);
        let tokens = lexer.tokenize();
        let mut parser = Parser::new(tokens, arena);
        let mut scripts = Vec::new();
        while parser.remaining() > 0 {
            if let Some(script) = parser.parse_script() {
                scripts.push(script);
            }
        }
        (scripts, parser.take_errors())
    }

    #[test]
    fn minimal_script() {
        let arena = Bump::new();
        let script = parse_one("[proc,test] return;", &arena);
        assert_eq!(script.trigger.name, "proc");
        assert_eq!(script.name.name, "test");
        assert!(script.params.is_empty());
        assert!(script.returns.is_empty());
        assert_eq!(script.body.stmts.len(), 1);
    }

    #[test]
    fn header_with_params_and_returns() {
        let arena = Bump::new();
        let script = parse_one("[proc,add](int $a, int $b)(int) return $a + $b;", &arena);
        assert_eq!(script.params.len(), 2);
        assert_eq!(script.params[0].ty, PrimitiveType::Int);
        assert_eq!(script.params[0].name.name, "a");
        assert_eq!(script.returns.len(), 1);
        assert_eq!(script.returns[0].ty, PrimitiveType::Int);
    }

    #[test]
    fn bare_type_group_is_a_return_list() {
        let arena = Bump::new();
        let script = parse_one("[proc,get](int) return 1;", &arena);
        assert!(script.params.is_empty());
        assert_eq!(script.returns.len(), 1);
    }

    #[test]
    fn braced_body() {
        let arena = Bump::new();
        let script = parse_one("[proc,test] { def_int $x = 5; return $x; }", &arena);
        assert_eq!(script.body.stmts.len(), 2);
        match script.body.stmts[0] {
            Stmt::VarDecl(decl) => {
                assert_eq!(decl.ty, PrimitiveType::Int);
                assert_eq!(decl.name.name, "x");
                assert!(decl.init.is_some());
            }
            other => panic!("expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn declaration_without_initializer() {
        let arena = Bump::new();
        let script = parse_one("[proc,test] def_string $s;", &arena);
        match script.body.stmts[0] {
            Stmt::VarDecl(decl) => {
                assert_eq!(decl.ty, PrimitiveType::String);
                assert!(decl.init.is_none());
            }
            other => panic!("expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn assignments() {
        let arena = Bump::new();
        let script = parse_one("[proc,test] $x = 1; %energy = 2;", &arena);
        match script.body.stmts[0] {
            Stmt::Assign(assign) => {
                assert!(matches!(assign.target, VarTarget::Local(_)));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
        match script.body.stmts[1] {
            Stmt::Assign(assign) => {
                assert!(matches!(assign.target, VarTarget::Global(_)));
                assert_eq!(assign.target.name().name, "energy");
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn if_else_chain() {
        let arena = Bump::new();
        let script = parse_one(
            "[proc,test] if ($a = 1) { return; } else if ($a = 2) { return; } else { return; }",
            &arena,
        );
        let Stmt::If(outer) = script.body.stmts[0] else {
            panic!("expected if");
        };
        assert!(outer.else_stmt.is_some());
        assert!(matches!(outer.else_stmt, Some(Stmt::If(_))));
    }

    #[test]
    fn while_loop_with_break_and_continue() {
        let arena = Bump::new();
        let script = parse_one(
            "[proc,test] while ($i < 10) { $i = $i + 1; continue; break; }",
            &arena,
        );
        let Stmt::While(while_stmt) = script.body.stmts[0] else {
            panic!("expected while");
        };
        let Stmt::Block(block) = while_stmt.body else {
            panic!("expected block body");
        };
        assert!(matches!(block.stmts[1], Stmt::Continue(_)));
        assert!(matches!(block.stmts[2], Stmt::Break(_)));
    }

    #[test]
    fn break_retains_keyword_span() {
        let arena = Bump::new();
        let script = parse_one("[proc,test] while (true) { break; }", &arena);
        let Stmt::While(while_stmt) = script.body.stmts[0] else {
            panic!("expected while");
        };
        let Stmt::Block(block) = while_stmt.body else {
            panic!("expected block");
        };
        let Stmt::Break(break_stmt) = block.stmts[0] else {
            panic!("expected break");
        };
        assert_eq!(break_stmt.keyword.len, 5);
    }

    #[test]
    fn switch_with_default() {
        let arena = Bump::new();
        let script = parse_one(
            "[proc,test] switch_int ($x) { case 1, 2 : return; case default : return; }",
            &arena,
        );
        let Stmt::Switch(switch) = script.body.stmts[0] else {
            panic!("expected switch");
        };
        assert_eq!(switch.ty, PrimitiveType::Int);
        assert_eq!(switch.cases.len(), 2);
        assert_eq!(switch.cases[0].keys.len(), 2);
        assert!(!switch.cases[0].is_default());
        assert!(switch.cases[1].is_default());
    }

    #[test]
    fn return_with_expression_list() {
        let arena = Bump::new();
        let script = parse_one("[proc,test] return 0, \"test\";", &arena);
        let Stmt::Return(ret) = script.body.stmts[0] else {
            panic!("expected return");
        };
        assert_eq!(ret.exprs.len(), 2);
    }

    #[test]
    fn calls_and_references() {
        let arena = Bump::new();
        let script = parse_one("[proc,test] cmd($a, ^max, ~helper(1), other);", &arena);
        let Stmt::Expr(stmt) = script.body.stmts[0] else {
            panic!("expected expression statement");
        };
        let Expr::Command(call) = stmt.expr else {
            panic!("expected command call");
        };
        assert_eq!(call.name.name, "cmd");
        assert_eq!(call.args.len(), 4);
        assert!(matches!(call.args[0], Expr::LocalVar(_)));
        assert!(matches!(call.args[1], Expr::Constant(_)));
        assert!(matches!(call.args[2], Expr::Gosub(_)));
        assert!(matches!(call.args[3], Expr::Dynamic(_)));
    }

    #[test]
    fn hook_with_transmits() {
        let arena = Bump::new();
        let script = parse_one("[proc,test] attach(&on_click($id){inv, worn});", &arena);
        let Stmt::Expr(stmt) = script.body.stmts[0] else {
            panic!("expected expression statement");
        };
        let Expr::Command(call) = stmt.expr else {
            panic!("expected command");
        };
        let Expr::Hook(hook) = call.args[0] else {
            panic!("expected hook argument");
        };
        assert_eq!(hook.name.name, "on_click");
        assert_eq!(hook.args.len(), 1);
        assert_eq!(hook.transmits.len(), 2);
        assert_eq!(hook.transmits[1].name, "worn");
    }

    #[test]
    fn precedence_chain() {
        let arena = Bump::new();
        let script = parse_one("[proc,test] return 1 + 2 * 3;", &arena);
        let Stmt::Return(ret) = script.body.stmts[0] else {
            panic!("expected return");
        };
        let Expr::Binary(add) = ret.exprs[0] else {
            panic!("expected binary");
        };
        assert_eq!(add.op, BinaryOp::Add);
        let Expr::Binary(mul) = add.right else {
            panic!("expected nested multiply");
        };
        assert_eq!(mul.op, BinaryOp::Mul);
    }

    #[test]
    fn logical_binds_weaker_than_comparison() {
        let arena = Bump::new();
        let script = parse_one("[proc,test] if ($a = 1 & $b = 2) return;", &arena);
        let Stmt::If(if_stmt) = script.body.stmts[0] else {
            panic!("expected if");
        };
        let Expr::Binary(and) = if_stmt.condition else {
            panic!("expected binary");
        };
        assert_eq!(and.op, BinaryOp::And);
        assert!(matches!(and.left, Expr::Binary(b) if b.op == BinaryOp::Equal));
    }

    #[test]
    fn negative_literals() {
        let arena = Bump::new();
        let script = parse_one("[proc,test] return -5, -9L;", &arena);
        let Stmt::Return(ret) = script.body.stmts[0] else {
            panic!("expected return");
        };
        assert!(matches!(
            ret.exprs[0],
            Expr::Literal(LiteralExpr {
                kind: LiteralKind::Int(-5),
                ..
            })
        ));
        assert!(matches!(
            ret.exprs[1],
            Expr::Literal(LiteralExpr {
                kind: LiteralKind::Long(-9),
                ..
            })
        ));
    }

    #[test]
    fn coordinate_literal_packing() {
        let arena = Bump::new();
        let script = parse_one("[proc,test] return 1_50_50_10_20;", &arena);
        let Stmt::Return(ret) = script.body.stmts[0] else {
            panic!("expected return");
        };
        let Expr::Literal(LiteralExpr {
            kind: LiteralKind::Coord(packed),
            ..
        }) = ret.exprs[0]
        else {
            panic!("expected coordinate literal");
        };
        let expected = (1 << 28) | ((50 * 64 + 10) << 14) | (50 * 64 + 20);
        assert_eq!(packed, expected);
    }

    #[test]
    fn interpolated_string_becomes_concat() {
        let arena = Bump::new();
        let script = parse_one("[proc,test] return \"total: <$n> coins\";", &arena);
        let Stmt::Return(ret) = script.body.stmts[0] else {
            panic!("expected return");
        };
        let Expr::Concat(concat) = ret.exprs[0] else {
            panic!("expected concat");
        };
        assert_eq!(concat.parts.len(), 3);
        assert!(matches!(concat.parts[1], Expr::LocalVar(_)));
    }

    #[test]
    fn array_index_expression() {
        let arena = Bump::new();
        let script = parse_one("[proc,test] return $items(0);", &arena);
        let Stmt::Return(ret) = script.body.stmts[0] else {
            panic!("expected return");
        };
        let Expr::Index(index) = ret.exprs[0] else {
            panic!("expected index");
        };
        assert_eq!(index.name.name, "items");
    }

    #[test]
    fn two_scripts_in_one_buffer() {
        let arena = Bump::new();
        let (scripts, errors) = parse_with_errors("[proc,a] return; [label,b] return;", &arena);
        assert!(errors.is_empty());
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[1].trigger.name, "label");
    }

    #[test]
    fn error_recovery_keeps_later_statements() {
        let arena = Bump::new();
        let (scripts, errors) =
            parse_with_errors("[proc,test] { def_int $x = ; return 1; }", &arena);
        assert_eq!(errors.len(), 1);
        assert_eq!(scripts.len(), 1);
        // The return statement after the broken declaration survives.
        assert!(
            scripts[0]
                .body
                .stmts
                .iter()
                .any(|s| matches!(s, Stmt::Return(_)))
        );
    }

    #[test]
    fn broken_header_does_not_eat_next_script() {
        let arena = Bump::new();
        let (scripts, errors) = parse_with_errors("[proc] junk [proc,ok] return;", &arena);
        assert!(!errors.is_empty());
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].name.name, "ok");
    }

    #[test]
    fn int_out_of_range_is_reported() {
        let arena = Bump::new();
        let (_, errors) = parse_with_errors("[proc,test] return 99999999999;", &arena);
        assert!(
            errors
                .iter()
                .any(|e| e.kind == ParseErrorKind::InvalidSyntax)
        );
    }
}
