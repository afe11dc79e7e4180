//! Main lexer implementation for EmberScript.
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s,
//! dispatching on the first character of each token. All string content
//! (identifiers, literals) is copied into the arena, so the source string
//! may be freed once lexing completes.
//!
//! Interpolated strings are the one place a single source construct
//! produces several tokens: `"a <expr> b"` lexes to a concat-begin, the
//! literal fragments, the embedded expression's own tokens, and a
//! concat-end. The extra tokens are buffered in a pending queue.

use std::collections::VecDeque;

use bumpalo::Bump;

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};
use emberscript_core::{LexError, Span};

/// Lexer for EmberScript source code.
///
/// The `'src` lifetime is the source string being lexed (temporary).
/// The `'ast` lifetime is the arena where token lexemes are allocated.
pub struct Lexer<'src, 'ast> {
    /// Low-level character cursor.
    cursor: Cursor<'src>,
    /// Arena for allocating token lexemes.
    arena: &'ast Bump,
    /// Tokens already produced but not yet handed out (interpolation).
    pending: VecDeque<Token<'ast>>,
    /// Accumulated errors.
    errors: Vec<LexError>,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
            pending: VecDeque::new(),
            errors: Vec::new(),
        }
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Lex the whole buffer into a token vector.
    ///
    /// Error tokens are dropped here; the recorded [`LexError`]s carry
    /// everything a diagnostic needs.
    pub fn tokenize(&mut self) -> Vec<Token<'ast>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Error => continue,
                _ => tokens.push(token),
            }
        }
        tokens
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'ast> {
        if let Some(token) = self.pending.pop_front() {
            return token;
        }
        self.scan_token()
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    /// Scan the next token from source.
    fn scan_token(&mut self) -> Token<'ast> {
        self.skip_whitespace();

        if self.cursor.is_eof() {
            return self.make_eof();
        }

        let start_line = self.cursor.line();
        let start_col = self.cursor.column();
        let start_offset = self.cursor.offset();

        let Some(first) = self.cursor.peek() else {
            return self.make_eof();
        };

        match first {
            '/' => self.scan_slash(start_line, start_col, start_offset),
            '"' => self.scan_string(start_line, start_col, start_offset),
            c if c.is_ascii_digit() => self.scan_number(start_line, start_col, start_offset),
            c if is_ident_start(c) => self.scan_identifier(start_line, start_col, start_offset),
            '$' | '%' | '^' | '&' => self.scan_sigil(start_line, start_col, start_offset),
            _ => self.scan_operator(start_line, start_col, start_offset),
        }
    }

    /// Skip whitespace.
    fn skip_whitespace(&mut self) {
        while self.cursor.check(|c| c.is_ascii_whitespace()) {
            self.cursor.advance();
        }
    }

    /// Create an EOF token.
    fn make_eof(&self) -> Token<'ast> {
        let span = Span::point(self.cursor.line(), self.cursor.column());
        Token::new(TokenKind::Eof, "", span)
    }

    /// Create a token from start position to current position, copying
    /// the source slice into the arena as the lexeme.
    fn make_token(
        &self,
        kind: TokenKind,
        start_line: u32,
        start_col: u32,
        start_offset: u32,
    ) -> Token<'ast> {
        let len = self.cursor.offset() - start_offset;
        let span = Span::new(start_line, start_col, len);
        let lexeme = self.arena.alloc_str(self.cursor.slice_from(start_offset));
        Token::new(kind, lexeme, span)
    }

    /// Create a token whose lexeme differs from the raw source slice
    /// (sigil names, unescaped strings).
    fn make_synthetic(
        &self,
        kind: TokenKind,
        lexeme: &str,
        start_line: u32,
        start_col: u32,
        start_offset: u32,
    ) -> Token<'ast> {
        let len = self.cursor.offset() - start_offset;
        let span = Span::new(start_line, start_col, len);
        Token::new(kind, self.arena.alloc_str(lexeme), span)
    }

    /// Record an error and return an error token.
    fn make_error(&mut self, error: LexError) -> Token<'ast> {
        let span = error.span();
        self.errors.push(error);
        Token::new(TokenKind::Error, "", span)
    }

    // =========================================
    // Scanning: Comments and slash
    // =========================================

    /// Scan a slash, which could be `/`, `//`, or `/*`.
    fn scan_slash(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.advance(); // consume '/'

        match self.cursor.peek() {
            Some('/') => {
                while let Some(c) = self.cursor.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.cursor.advance();
                }
                self.scan_token()
            }
            Some('*') => {
                self.cursor.advance();
                self.scan_block_comment(start_line, start_col, start_offset)
            }
            _ => self.make_token(TokenKind::Slash, start_line, start_col, start_offset),
        }
    }

    /// Scan a block comment `/* ... */`.
    fn scan_block_comment(
        &mut self,
        start_line: u32,
        start_col: u32,
        start_offset: u32,
    ) -> Token<'ast> {
        loop {
            match self.cursor.peek() {
                None => {
                    let len = self.cursor.offset() - start_offset;
                    return self.make_error(LexError::UnterminatedComment {
                        span: Span::new(start_line, start_col, len),
                    });
                }
                Some('*') => {
                    self.cursor.advance();
                    if self.cursor.eat('/') {
                        return self.scan_token();
                    }
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    // =========================================
    // Scanning: Numbers
    // =========================================

    /// Scan an integer, long (`L` suffix), or coordinate literal
    /// (`level_x_z_localx_localz`).
    fn scan_number(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.eat_while(|c| c.is_ascii_digit());

        if self.cursor.check(|c| c == '_') {
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
            let full = self.cursor.slice_from(start_offset);
            let groups = full.split('_').count();
            let well_formed = full.split('_').all(|g| !g.is_empty());
            if groups != 5 || !well_formed {
                let len = self.cursor.offset() - start_offset;
                return self.make_error(LexError::InvalidNumber {
                    detail: format!("'{}' is not a valid coordinate", full),
                    span: Span::new(start_line, start_col, len),
                });
            }
            return self.make_token(TokenKind::CoordLiteral, start_line, start_col, start_offset);
        }

        if self.cursor.eat('L') || self.cursor.eat('l') {
            return self.make_token(TokenKind::LongLiteral, start_line, start_col, start_offset);
        }

        self.make_token(TokenKind::IntLiteral, start_line, start_col, start_offset)
    }

    // =========================================
    // Scanning: Identifiers and sigils
    // =========================================

    /// Scan an identifier or keyword.
    fn scan_identifier(
        &mut self,
        start_line: u32,
        start_col: u32,
        start_offset: u32,
    ) -> Token<'ast> {
        let ident = self.cursor.eat_while(is_ident_continue);
        let kind = lookup_keyword(ident).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, start_line, start_col, start_offset)
    }

    /// Scan a sigil-prefixed reference: `$local`, `%hostvar`,
    /// `^constant`, `&hook`.
    ///
    /// `%` and `&` double as the modulo and logical-and operators when no
    /// name follows; `$` and `^` always require one.
    fn scan_sigil(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        let sigil = match self.cursor.advance() {
            Some(c) => c,
            None => return self.make_eof(),
        };
        let named = self.cursor.check(is_ident_start);

        if !named {
            return match sigil {
                '%' => self.make_token(TokenKind::Percent, start_line, start_col, start_offset),
                '&' => self.make_token(TokenKind::Amp, start_line, start_col, start_offset),
                _ => self.make_error(LexError::MissingSigilName {
                    sigil,
                    span: Span::new(start_line, start_col, 1),
                }),
            };
        }

        let name = self.cursor.eat_while(is_ident_continue).to_owned();
        let kind = match sigil {
            '$' => TokenKind::LocalVar,
            '%' => TokenKind::GlobalVar,
            '^' => TokenKind::ConstantRef,
            _ => TokenKind::Hook,
        };
        self.make_synthetic(kind, &name, start_line, start_col, start_offset)
    }

    // =========================================
    // Scanning: Strings
    // =========================================

    /// Scan a string literal, plain or interpolated.
    ///
    /// A plain string produces one [`TokenKind::StringLiteral`] whose
    /// lexeme is the unescaped content. An interpolated string produces a
    /// concat-begin / fragments / concat-end run; the extra tokens land in
    /// the pending queue.
    fn scan_string(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.advance(); // consume opening quote

        let mut tokens: Vec<Token<'ast>> = Vec::new();
        let mut buf = String::new();
        let mut frag_line = self.cursor.line();
        let mut frag_col = self.cursor.column();
        let mut frag_offset = self.cursor.offset();

        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    let len = self.cursor.offset() - start_offset;
                    return self.make_error(LexError::UnterminatedString {
                        span: Span::new(start_line, start_col, len),
                    });
                }
                Some('\\') => {
                    self.cursor.advance();
                    let escaped = match self.cursor.advance() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some(c) => c,
                        None => continue,
                    };
                    buf.push(escaped);
                }
                Some('<') => {
                    self.cursor.advance();
                    if tokens.is_empty() {
                        tokens.push(Token::new(
                            TokenKind::ConcatBegin,
                            "",
                            Span::point(start_line, start_col),
                        ));
                        // Flush any literal text before the first embed.
                    }
                    if !buf.is_empty() {
                        let len = self.cursor.offset().saturating_sub(frag_offset + 1);
                        tokens.push(Token::new(
                            TokenKind::StringPart,
                            self.arena.alloc_str(&buf),
                            Span::new(frag_line, frag_col, len),
                        ));
                        buf.clear();
                    }
                    if !self.scan_embedded_expression(&mut tokens) {
                        let len = self.cursor.offset() - start_offset;
                        return self.make_error(LexError::UnterminatedInterpolation {
                            span: Span::new(start_line, start_col, len),
                        });
                    }
                    frag_line = self.cursor.line();
                    frag_col = self.cursor.column();
                    frag_offset = self.cursor.offset();
                }
                Some('"') => {
                    self.cursor.advance();
                    if tokens.is_empty() {
                        return self.make_synthetic(
                            TokenKind::StringLiteral,
                            &buf,
                            start_line,
                            start_col,
                            start_offset,
                        );
                    }
                    if !buf.is_empty() {
                        let len = self.cursor.offset().saturating_sub(frag_offset + 1);
                        tokens.push(Token::new(
                            TokenKind::StringPart,
                            self.arena.alloc_str(&buf),
                            Span::new(frag_line, frag_col, len),
                        ));
                    }
                    tokens.push(Token::new(
                        TokenKind::ConcatEnd,
                        "",
                        Span::point(self.cursor.line(), self.cursor.column()),
                    ));
                    let first = tokens.remove(0);
                    self.pending.extend(tokens);
                    return first;
                }
                Some(c) => {
                    buf.push(c);
                    self.cursor.advance();
                }
            }
        }
    }

    /// Lex the tokens of one `<expr>` embed into `tokens`.
    ///
    /// Returns false if the closing `>` was never found. `>` only closes
    /// the embed at paren depth zero, so call arguments inside the embed
    /// work.
    fn scan_embedded_expression(&mut self, tokens: &mut Vec<Token<'ast>>) -> bool {
        let mut depth = 0u32;
        loop {
            self.skip_whitespace();
            match self.cursor.peek() {
                None | Some('\n') | Some('"') => return false,
                Some('>') if depth == 0 => {
                    self.cursor.advance();
                    return true;
                }
                Some(_) => {
                    let token = self.scan_token();
                    match token.kind {
                        TokenKind::Eof => return false,
                        TokenKind::LeftParen => depth += 1,
                        TokenKind::RightParen => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    tokens.push(token);
                    // A nested interpolated string queues its own tail.
                    while let Some(queued) = self.pending.pop_front() {
                        tokens.push(queued);
                    }
                }
            }
        }
    }

    // =========================================
    // Scanning: Operators and punctuation
    // =========================================

    /// Scan a single- or double-character operator or delimiter.
    fn scan_operator(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        let ch = match self.cursor.advance() {
            Some(c) => c,
            None => return self.make_eof(),
        };

        let kind = match ch {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,
            '|' => TokenKind::Pipe,
            '=' => TokenKind::Equal,
            '!' => TokenKind::Bang,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '<' => {
                if self.cursor.eat('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.cursor.eat('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            _ => {
                return self.make_error(LexError::UnexpectedCharacter {
                    ch,
                    span: Span::new(start_line, start_col, ch.len_utf8() as u32),
                });
            }
        };

        self.make_token(kind, start_line, start_col, start_offset)
    }
}
