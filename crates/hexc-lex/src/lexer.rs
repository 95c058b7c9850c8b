//! Character stream to token stream.

use crate::cursor::{Cursor, EOF_CHAR};
use crate::token::{Token, TokenKind};
use hexc_util::{Diagnostic, Handler, Span, Symbol};

/// Turns source text into a stream of [`Token`]s with exactly one token of
/// lookahead.
///
/// Construction performs the first scan, so [`Lexer::peek`] is valid
/// immediately; [`Lexer::advance`] consumes the current token, scans the
/// next one, and returns it. Once [`TokenKind::End`] has been produced,
/// every further `advance` keeps returning it, since scanning past end of
/// input is idempotent.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    handler: &'a Handler,
    current: Token,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        let mut lexer = Lexer {
            cursor: Cursor::new(source),
            handler,
            current: Token::new(TokenKind::Invalid, Span::DUMMY),
        };
        lexer.current = lexer.scan();
        lexer
    }

    /// The current token, without consuming it.
    pub fn peek(&self) -> &Token {
        &self.current
    }

    /// Consumes the current token, scans the next one, and returns it.
    pub fn advance(&mut self) -> Token {
        let next = self.scan();
        self.current = next.clone();
        next
    }

    fn here(&self) -> Span {
        Span::new(self.cursor.line(), self.cursor.col())
    }

    fn report(&self, message: impl Into<String>, span: Span) {
        Diagnostic::error(message).span(span).emit(self.handler);
    }

    fn skip_trivia(&mut self) {
        loop {
            while self.cursor.peek_char().is_whitespace() {
                self.cursor.get_char();
            }
            if self.cursor.peek_char() == '/' && self.cursor.peek_second() == '/' {
                while self.cursor.peek_char() != '\n' && self.cursor.peek_char() != EOF_CHAR {
                    self.cursor.get_char();
                }
                continue;
            }
            break;
        }
    }

    fn scan(&mut self) -> Token {
        self.skip_trivia();
        let span = self.here();

        let kind = match self.cursor.peek_char() {
            EOF_CHAR => TokenKind::End,
            ',' => {
                self.cursor.get_char();
                TokenKind::Comma
            }
            ';' => {
                self.cursor.get_char();
                TokenKind::Semicolon
            }
            ':' => {
                self.cursor.get_char();
                TokenKind::Colon
            }
            '=' => {
                self.cursor.get_char();
                TokenKind::Eq
            }
            '+' => {
                self.cursor.get_char();
                TokenKind::Plus
            }
            '*' => {
                self.cursor.get_char();
                TokenKind::Mult
            }
            '<' => {
                self.cursor.get_char();
                TokenKind::CmpLt
            }
            '(' => {
                self.cursor.get_char();
                TokenKind::POpen
            }
            ')' => {
                self.cursor.get_char();
                TokenKind::PClose
            }
            '{' => {
                self.cursor.get_char();
                TokenKind::BrOpen
            }
            '}' => {
                self.cursor.get_char();
                TokenKind::BrClose
            }
            '-' => {
                self.cursor.get_char();
                if self.cursor.peek_char() == '>' {
                    self.cursor.get_char();
                    TokenKind::RArrow
                } else {
                    TokenKind::Minus
                }
            }
            '/' => {
                self.cursor.get_char();
                TokenKind::Slash
            }
            '"' => self.scan_string(),
            ch if ch.is_alphabetic() => self.scan_identifier(),
            ch if ch.is_ascii_digit() || ch == '.' => self.scan_number(span),
            _ => {
                let ch = self.cursor.get_char();
                self.report(format!("invalid character '{ch}'"), span);
                TokenKind::Invalid
            }
        };

        Token::new(kind, span)
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let mut text = String::new();
        while self.cursor.peek_char().is_alphanumeric() {
            text.push(self.cursor.get_char());
        }
        match text.as_str() {
            "let" => TokenKind::Let,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "fn" => TokenKind::Fn,
            _ => TokenKind::Id(Symbol::intern(&text)),
        }
    }

    fn scan_number(&mut self, span: Span) -> TokenKind {
        let mut text = String::new();
        let mut is_double = false;

        if self.cursor.peek_char() == '.' {
            text.push(self.cursor.get_char());
            while self.cursor.peek_char().is_ascii_digit() {
                text.push(self.cursor.get_char());
            }
            if text == "." {
                self.report("a bare '.' is not a valid number", span);
                return TokenKind::Invalid;
            }
            return TokenKind::LDouble(text.parse().unwrap_or(0.0));
        }

        while self.cursor.peek_char().is_ascii_digit() {
            text.push(self.cursor.get_char());
        }
        if self.cursor.peek_char() == '.' {
            is_double = true;
            text.push(self.cursor.get_char());
            while self.cursor.peek_char().is_ascii_digit() {
                text.push(self.cursor.get_char());
            }
        }

        if is_double {
            TokenKind::LDouble(text.parse().unwrap_or(0.0))
        } else {
            match text.parse::<i32>() {
                Ok(v) => TokenKind::LInt32(v),
                Err(_) => {
                    self.report(format!("integer literal '{text}' out of range"), span);
                    TokenKind::Invalid
                }
            }
        }
    }

    fn scan_string(&mut self) -> TokenKind {
        self.cursor.get_char(); // opening quote
        let mut text = String::new();
        loop {
            match self.cursor.peek_char() {
                EOF_CHAR => break,
                '"' => {
                    self.cursor.get_char();
                    break;
                }
                '\\' => {
                    self.cursor.get_char();
                    match self.cursor.peek_char() {
                        'n' => {
                            self.cursor.get_char();
                            text.push('\n');
                        }
                        '\\' => {
                            self.cursor.get_char();
                            text.push('\\');
                        }
                        '"' => {
                            self.cursor.get_char();
                            text.push('"');
                        }
                        EOF_CHAR => break,
                        other => {
                            self.cursor.get_char();
                            text.push(other);
                        }
                    }
                }
                '\n' => {
                    // A raw physical newline inside a string is skipped silently.
                    self.cursor.get_char();
                }
                _ => text.push(self.cursor.get_char()),
            }
        }
        TokenKind::LStr(Symbol::intern(&text))
    }
}
